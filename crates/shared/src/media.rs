//! Media fetch boundary.
//!
//! The panel never talks to the message store's media backend directly; the
//! embedding application implements [`MediaFetcher`] and the provider client
//! inlines the fetched bytes into request payloads.

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("media not found: {handle}")]
    NotFound { handle: String },

    #[error("media fetch failed: {0}")]
    Fetch(#[from] anyhow::Error),
}

/// Resolves an opaque media handle to raw bytes.
///
/// Failures are non-fatal to request assembly: the caller substitutes a
/// placeholder text fragment and continues.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, handle: &str, mime_type: &str) -> Result<Vec<u8>, MediaError>;
}
