//! Live-status error types.

use thiserror::Error;

use crate::types::PublicationId;

/// Errors reported by a live-status provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LiveStatusError {
    /// The capability is missing or disabled on this platform.
    #[error("Live statuses are not enabled")]
    Unavailable,

    /// The provider refused to create a publication.
    #[error("Failed to start live status: {0}")]
    RequestFailed(String),

    /// The provider does not know the publication.
    #[error("Live status not found: {0}")]
    NotFound(PublicationId),

    /// Ending a publication failed.
    #[error("Failed to end live status {0}: {1}")]
    EndFailed(PublicationId, String),
}
