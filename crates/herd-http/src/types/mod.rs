pub mod request;
pub mod response;
pub mod result;

pub use request::{
    DispatchRequest, FilePart, Method, MultipartForm, OutgoingBody, OutgoingRequest, RequestBody,
};
pub use response::ApiResponse;
pub use result::{ApiFailure, DispatchEnvelope, DispatchResult};
