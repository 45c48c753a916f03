//! Start/stop hooks consumed from the host application

use crate::core::Result;
use async_trait::async_trait;

/// Generic start/stop hook pair.
///
/// `on_start` must return promptly; long-running work is spawned.
/// `on_stop` returns only after everything `on_start` spawned has exited.
#[async_trait]
pub trait Lifecycle: Send + Sync {
    async fn on_start(&self) -> Result<()>;
    async fn on_stop(&self) -> Result<()>;
}
