use async_trait::async_trait;
use herd_session::{Navigator, Result};
use tracing::info;

/// A terminal has no router: the destination is reported instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNavigator;

#[async_trait]
impl Navigator for LogNavigator {
    async fn navigate(&self, target: &str) -> Result<()> {
        info!("[Nav] -> {}", target);
        println!("-> {}", target);
        Ok(())
    }
}
