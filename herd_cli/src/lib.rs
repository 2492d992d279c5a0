//! herd client: wires the dispatcher, the session and the sign-out
//! protocol together and exposes the login, registration and settings
//! flows the command line drives.

pub mod app;
pub mod commands;
pub mod navigator;

pub use app::App;
pub use commands::{FlowError, FlowResult};
pub use navigator::LogNavigator;
