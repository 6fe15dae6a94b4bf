//! Session manager error types.

use thiserror::Error;

use crate::live_status::LiveStatusError;

/// Errors surfaced to callers of the session manager.
///
/// Notification failures never appear here; they are logged and absorbed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// Live statuses are missing or disabled, or the platform refused to
    /// end or create one. The caller should fall back to notifications.
    #[error("Live status capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// No live status is held, or the given id is not the current one.
    #[error("No active live status found")]
    NoActivePublication,
}

impl TimerError {
    /// Returns true if the caller should fall back to notification-only mode.
    #[must_use]
    pub fn should_fall_back_to_notifications(&self) -> bool {
        matches!(self, Self::CapabilityUnavailable(_))
    }
}

impl From<LiveStatusError> for TimerError {
    fn from(err: LiveStatusError) -> Self {
        match err {
            LiveStatusError::NotFound(_) => Self::NoActivePublication,
            LiveStatusError::Unavailable => {
                Self::CapabilityUnavailable("Live statuses are not enabled".to_string())
            }
            other => Self::CapabilityUnavailable(other.to_string()),
        }
    }
}
