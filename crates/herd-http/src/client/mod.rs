//! Herd API client implementation.

mod config;
mod dispatch;
pub mod native_network;
pub mod normalize;

pub use config::ClientConfig;
pub use dispatch::ApiClient;
pub use native_network::NativeNetwork;
pub use normalize::{failure_message, DEFAULT_FALLBACK};
