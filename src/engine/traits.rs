use super::matcher::{BlockReason, RequestTarget};
use crate::error::FetchError;

/// The "Hot Path" check for a single request. Must not perform I/O.
pub trait RuleMatcher: Send + Sync {
    /// Returns Some(reason) if blocked, None if allowed.
    fn check(&self, target: &RequestTarget) -> Option<BlockReason>;
}

/// Retrieves the raw text of a remote filter list.
#[async_trait::async_trait]
pub trait ListDownloader: Send + Sync {
    async fn download(&self, url: &str) -> Result<String, FetchError>;
}
