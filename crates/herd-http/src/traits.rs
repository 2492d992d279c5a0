use crate::error::Result;
use crate::types::{ApiResponse, OutgoingRequest};
use async_trait::async_trait;

/// Abstraction for network operations.
///
/// Implementations return `Ok` for every response the server produced,
/// whatever its status; only transport failures are errors.
#[async_trait]
pub trait ApiNetwork: Send + Sync + 'static {
    async fn send(&self, request: OutgoingRequest) -> Result<ApiResponse>;
}

/// Source of the bearer credential attached to outgoing requests.
pub trait TokenSource: Send + Sync + 'static {
    fn bearer_token(&self) -> Option<String>;
}

impl TokenSource for String {
    fn bearer_token(&self) -> Option<String> {
        Some(self.clone())
    }
}
