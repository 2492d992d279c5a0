use crate::error::Result;
use async_trait::async_trait;

/// Client-side router. `target` is either an app path (`/login`) or an
/// absolute address handed back by an SSO provider.
#[async_trait]
pub trait Navigator: Send + Sync + 'static {
    async fn navigate(&self, target: &str) -> Result<()>;
}
