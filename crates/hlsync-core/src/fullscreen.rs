//! Platform fullscreen capability

use crate::Result;
use async_trait::async_trait;

/// Asynchronous fullscreen control
///
/// Both operations complete once the platform has settled the request; an
/// `Err` means the request was denied or is unsupported.
#[async_trait]
pub trait FullscreenCapability: Send + Sync {
    /// Whether the player's element currently owns fullscreen
    fn is_active(&self) -> bool;

    async fn request(&self) -> Result<()>;

    async fn exit(&self) -> Result<()>;
}
