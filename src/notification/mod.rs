//! Local notification delivery.
//!
//! The session manager talks to the platform through the
//! [`NotificationCenter`] trait:
//!
//! - Authorization requests (fire-and-forget from the manager's side)
//! - Delivery under a fixed identifier, replacing the previous notification
//! - Cancellation of pending and delivered notifications
//!
//! On macOS, [`UserNotificationCenter`] backs the trait with
//! `UNUserNotificationCenter`. Elsewhere, [`LogNotificationCenter`] writes
//! deliveries to the tracing log so the daemon still runs.
//!
//! # Code Signing
//!
//! On macOS the binary must be code-signed for notifications to appear.
//! For development, use ad-hoc signing:
//! ```bash
//! codesign --force --deep --sign - target/release/native-timer
//! ```

pub mod error;

#[cfg(target_os = "macos")]
mod center;
#[cfg(target_os = "macos")]
mod content;

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub use self::error::NotificationError;

#[cfg(target_os = "macos")]
pub use self::center::UserNotificationCenter;
#[cfg(target_os = "macos")]
pub use self::content::{sanitize_text, NotificationContentBuilder};

/// Notification center used by the daemon on this platform.
#[cfg(target_os = "macos")]
pub type PlatformNotificationCenter = UserNotificationCenter;

/// Notification center used by the daemon on this platform.
#[cfg(not(target_os = "macos"))]
pub type PlatformNotificationCenter = LogNotificationCenter;

/// Platform notification primitives consumed by the session manager.
///
/// Futures are `Send` so the manager can hand authorization requests to a
/// background task.
pub trait NotificationCenter: Send + Sync + 'static {
    /// Asks the user for alert/sound/badge permission.
    fn request_authorization(
        &self,
    ) -> impl Future<Output = Result<bool, NotificationError>> + Send;

    /// Delivers a notification immediately. A previously delivered
    /// notification with the same identifier is replaced, not stacked.
    fn deliver(
        &self,
        identifier: &str,
        title: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), NotificationError>> + Send;

    /// Removes all pending notification requests.
    fn cancel_pending(&self);

    /// Removes all delivered notifications.
    fn cancel_delivered(&self);
}

// ============================================================================
// LogNotificationCenter
// ============================================================================

/// Notification center that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationCenter;

impl LogNotificationCenter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl NotificationCenter for LogNotificationCenter {
    async fn request_authorization(&self) -> Result<bool, NotificationError> {
        tracing::debug!("Notification authorization implicitly granted (log backend)");
        Ok(true)
    }

    async fn deliver(
        &self,
        identifier: &str,
        title: &str,
        body: &str,
    ) -> Result<(), NotificationError> {
        tracing::info!(identifier, title, body, "Notification delivered");
        Ok(())
    }

    fn cancel_pending(&self) {
        tracing::debug!("Pending notifications cleared");
    }

    fn cancel_delivered(&self) {
        tracing::debug!("Delivered notifications cleared");
    }
}

// ============================================================================
// MockNotificationCenter
// ============================================================================

/// A notification recorded by [`MockNotificationCenter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredNotification {
    pub identifier: String,
    pub title: String,
    pub body: String,
}

/// Recording notification center for tests.
#[derive(Debug)]
pub struct MockNotificationCenter {
    deliveries: Mutex<Vec<DeliveredNotification>>,
    delivered: Mutex<Vec<DeliveredNotification>>,
    authorization_requests: AtomicUsize,
    pending_cancellations: AtomicUsize,
    delivered_cancellations: AtomicUsize,
    grant: AtomicBool,
    should_fail: AtomicBool,
}

impl Default for MockNotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNotificationCenter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            deliveries: Mutex::new(Vec::new()),
            delivered: Mutex::new(Vec::new()),
            authorization_requests: AtomicUsize::new(0),
            pending_cancellations: AtomicUsize::new(0),
            delivered_cancellations: AtomicUsize::new(0),
            grant: AtomicBool::new(true),
            should_fail: AtomicBool::new(false),
        }
    }

    /// Controls the answer to authorization requests.
    pub fn set_grant(&self, grant: bool) {
        self.grant.store(grant, Ordering::SeqCst);
    }

    /// Makes authorization and delivery fail.
    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Every delivery attempt that succeeded, in order.
    #[must_use]
    pub fn deliveries(&self) -> Vec<DeliveredNotification> {
        self.deliveries.lock().unwrap().clone()
    }

    #[must_use]
    pub fn delivery_count(&self) -> usize {
        self.deliveries.lock().unwrap().len()
    }

    /// Notifications currently shown, one per identifier.
    #[must_use]
    pub fn delivered(&self) -> Vec<DeliveredNotification> {
        self.delivered.lock().unwrap().clone()
    }

    #[must_use]
    pub fn authorization_request_count(&self) -> usize {
        self.authorization_requests.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn pending_cancellation_count(&self) -> usize {
        self.pending_cancellations.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn delivered_cancellation_count(&self) -> usize {
        self.delivered_cancellations.load(Ordering::SeqCst)
    }
}

impl NotificationCenter for MockNotificationCenter {
    async fn request_authorization(&self) -> Result<bool, NotificationError> {
        self.authorization_requests.fetch_add(1, Ordering::SeqCst);
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(NotificationError::AuthorizationFailed(
                "Mock failure".to_string(),
            ));
        }
        Ok(self.grant.load(Ordering::SeqCst))
    }

    async fn deliver(
        &self,
        identifier: &str,
        title: &str,
        body: &str,
    ) -> Result<(), NotificationError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(NotificationError::SendFailed("Mock failure".to_string()));
        }

        let notification = DeliveredNotification {
            identifier: identifier.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        };

        let mut delivered = self.delivered.lock().unwrap();
        delivered.retain(|n| n.identifier != identifier);
        delivered.push(notification.clone());

        self.deliveries.lock().unwrap().push(notification);
        Ok(())
    }

    fn cancel_pending(&self) {
        self.pending_cancellations.fetch_add(1, Ordering::SeqCst);
    }

    fn cancel_delivered(&self) {
        self.delivered_cancellations.fetch_add(1, Ordering::SeqCst);
        self.delivered.lock().unwrap().clear();
    }
}
