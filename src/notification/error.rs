//! Notification system error types.
//!
//! None of these errors reach the caller of a session operation: the
//! session manager logs them and carries on without the notification.

use thiserror::Error;

/// Errors that can occur in the notification system.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotificationError {
    /// Failed to request notification authorization from the system.
    #[error("Failed to request notification authorization: {0}")]
    AuthorizationFailed(String),

    /// Failed to deliver a notification.
    #[error("Failed to deliver notification: {0}")]
    SendFailed(String),

    /// Notification permission was denied by the user.
    #[error("Notification permission denied")]
    PermissionDenied,
}
