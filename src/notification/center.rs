//! UNUserNotificationCenter wrapper.
//!
//! Objective-C blocks are not `Send`, so every call is issued from a
//! synchronous helper that only hands a oneshot receiver back to the async
//! caller.

use std::cell::RefCell;

use block2::RcBlock;
use objc2::rc::Retained;
use objc2::runtime::Bool;
use objc2_foundation::{NSArray, NSError, NSString};
use objc2_user_notifications::{
    UNAuthorizationOptions, UNMutableNotificationContent, UNNotificationRequest,
    UNUserNotificationCenter,
};
use tokio::sync::oneshot;

use super::content::NotificationContentBuilder;
use super::error::NotificationError;
use super::NotificationCenter;

/// Notification center backed by the macOS user notification framework.
#[derive(Debug, Default, Clone, Copy)]
pub struct UserNotificationCenter;

impl UserNotificationCenter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn current() -> Retained<UNUserNotificationCenter> {
        UNUserNotificationCenter::currentNotificationCenter()
    }

    fn begin_authorization() -> oneshot::Receiver<Result<bool, NotificationError>> {
        let (tx, rx) = oneshot::channel::<Result<bool, NotificationError>>();

        let options = UNAuthorizationOptions::Alert
            | UNAuthorizationOptions::Sound
            | UNAuthorizationOptions::Badge;

        let cb = RefCell::new(Some(tx));
        let block = RcBlock::new(move |granted: Bool, error: *mut NSError| {
            if let Some(sender) = cb.borrow_mut().take() {
                let result = match unsafe { error.as_ref() } {
                    Some(err_ref) => Err(NotificationError::AuthorizationFailed(
                        err_ref.localizedDescription().to_string(),
                    )),
                    None => Ok(granted.as_bool()),
                };
                let _ = sender.send(result);
            }
        });

        Self::current().requestAuthorizationWithOptions_completionHandler(options, &block);
        rx
    }

    fn begin_delivery(
        identifier: &str,
        title: &str,
        body: &str,
    ) -> oneshot::Receiver<Result<(), NotificationError>> {
        let (tx, rx) = oneshot::channel::<Result<(), NotificationError>>();

        let content = NotificationContentBuilder::new()
            .title(title)
            .body(body)
            .default_sound()
            .build();
        let request = immediate_request(identifier, &content);

        let cb = RefCell::new(Some(tx));
        let block = RcBlock::new(move |error: *mut NSError| {
            if let Some(sender) = cb.borrow_mut().take() {
                let result = match unsafe { error.as_ref() } {
                    Some(err_ref) => Err(NotificationError::SendFailed(
                        err_ref.localizedDescription().to_string(),
                    )),
                    None => Ok(()),
                };
                let _ = sender.send(result);
            }
        });

        let center = Self::current();
        let identifiers = NSArray::from_retained_slice(&[NSString::from_str(identifier)]);
        center.removeDeliveredNotificationsWithIdentifiers(&identifiers);
        center.addNotificationRequest_withCompletionHandler(&request, Some(&block));
        rx
    }
}

impl NotificationCenter for UserNotificationCenter {
    async fn request_authorization(&self) -> Result<bool, NotificationError> {
        let rx = Self::begin_authorization();
        rx.await
            .map_err(|_| NotificationError::AuthorizationFailed("Channel closed".to_string()))?
    }

    async fn deliver(
        &self,
        identifier: &str,
        title: &str,
        body: &str,
    ) -> Result<(), NotificationError> {
        let rx = Self::begin_delivery(identifier, title, body);
        rx.await
            .map_err(|_| NotificationError::SendFailed("Channel closed".to_string()))?
    }

    fn cancel_pending(&self) {
        Self::current().removeAllPendingNotificationRequests();
    }

    fn cancel_delivered(&self) {
        Self::current().removeAllDeliveredNotifications();
    }
}

/// Trigger-less request, shown as soon as it is added.
fn immediate_request(
    identifier: &str,
    content: &UNMutableNotificationContent,
) -> Retained<UNNotificationRequest> {
    let identifier = NSString::from_str(identifier);
    UNNotificationRequest::requestWithIdentifier_content_trigger(&identifier, content, None)
}
