//! Client flows built on the dispatcher and the session.

pub mod auth;
pub mod settings;

pub use settings::SettingsSection;

use herd_http::ApiFailure;
use herd_session::SessionError;
use thiserror::Error;

pub type FlowResult<T> = std::result::Result<T, FlowError>;

#[derive(Error, Debug)]
pub enum FlowError {
    /// The flow needs a signed-in user; nothing was sent.
    #[error("Not signed in")]
    NotSignedIn,

    #[error("{0}")]
    Api(#[from] ApiFailure),

    #[error(transparent)]
    Session(#[from] SessionError),
}
