pub mod client;
pub mod context;
pub mod endpoints;
pub mod error;
pub mod traits;
pub mod types;

pub use client::{ApiClient, ClientConfig};
pub use context::{AddressPolicy, ExecutionContext};
pub use endpoints::{BodyShape, Call, Endpoint, Operation};
pub use error::{HttpError, Result};
pub use traits::{ApiNetwork, TokenSource};
pub use types::{
    ApiFailure, ApiResponse, DispatchEnvelope, DispatchRequest, DispatchResult, FilePart, Method,
    MultipartForm, OutgoingRequest, RequestBody,
};
