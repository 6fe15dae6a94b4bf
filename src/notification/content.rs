//! Notification content construction.
//!
//! This module provides a builder for creating notification content
//! with a fluent API.

use objc2::rc::Retained;
use objc2_foundation::NSString;
use objc2_user_notifications::{UNMutableNotificationContent, UNNotificationSound};

/// Maximum length for notification titles and bodies.
const MAX_TEXT_LENGTH: usize = 200;

/// Builder for constructing notification content.
pub struct NotificationContentBuilder {
    content: Retained<UNMutableNotificationContent>,
}

impl NotificationContentBuilder {
    /// Creates a new notification content builder.
    #[must_use]
    pub fn new() -> Self {
        let content = unsafe { UNMutableNotificationContent::new() };
        Self { content }
    }

    /// Sets the notification title.
    #[must_use]
    pub fn title(self, title: &str) -> Self {
        let title = NSString::from_str(&sanitize_text(title));
        unsafe {
            self.content.setTitle(&title);
        }
        self
    }

    /// Sets the notification body text.
    #[must_use]
    pub fn body(self, body: &str) -> Self {
        let body = NSString::from_str(&sanitize_text(body));
        unsafe {
            self.content.setBody(&body);
        }
        self
    }

    /// Sets the default system sound.
    #[must_use]
    pub fn default_sound(self) -> Self {
        let sound = unsafe { UNNotificationSound::defaultSound() };
        unsafe {
            self.content.setSound(Some(&sound));
        }
        self
    }

    /// Builds and returns the notification content.
    #[must_use]
    pub fn build(self) -> Retained<UNMutableNotificationContent> {
        self.content
    }
}

impl Default for NotificationContentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncates host-provided text and strips control characters.
pub fn sanitize_text(text: &str) -> String {
    text.chars()
        .take(MAX_TEXT_LENGTH)
        .filter(|c| !c.is_control())
        .collect()
}
