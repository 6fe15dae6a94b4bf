//! Core data types for the native timer.
//!
//! This module defines the data structures used for:
//! - The single timer session and the foreground/notification state
//! - Live-status publications and the slot that holds the current one
//! - IPC request/response serialization for the bridge

use std::fmt;

use serde::{Deserialize, Serialize};

/// Accent colour used when the caller does not provide one.
pub const DEFAULT_ACCENT_COLOR: &str = "#0045a5";

// ============================================================================
// TimerSession
// ============================================================================

/// A running timer session, identified by its start timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSession {
    /// Epoch milliseconds at which the session began
    pub start_millis: i64,
    /// Accent colour requested by the host for this session
    pub accent_color: String,
}

impl TimerSession {
    /// Creates a new session starting at `start_millis`.
    pub fn new(start_millis: i64, accent_color: impl Into<String>) -> Self {
        Self {
            start_millis,
            accent_color: accent_color.into(),
        }
    }

    /// Milliseconds elapsed between the session start and `now_millis`.
    ///
    /// Not clamped at zero: a wall clock moved backwards yields a negative
    /// value. Saturates at the `i64` bounds for extreme start times.
    pub fn elapsed_at(&self, now_millis: i64) -> i64 {
        now_millis.saturating_sub(self.start_millis)
    }
}

// ============================================================================
// ForegroundState
// ============================================================================

/// Whether the host app has focus, and whether the user dismissed the
/// background notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForegroundState {
    /// The host application currently has user focus
    pub in_foreground: bool,
    /// The user swiped the background notification away
    pub notification_dismissed: bool,
}

impl Default for ForegroundState {
    fn default() -> Self {
        Self {
            in_foreground: true,
            notification_dismissed: false,
        }
    }
}

impl ForegroundState {
    /// Returns true if notification updates should be pushed.
    pub fn accepts_notification_updates(&self) -> bool {
        !self.in_foreground && !self.notification_dismissed
    }
}

// ============================================================================
// Live status
// ============================================================================

/// Opaque handle of a live-status publication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicationId(String);

impl PublicationId {
    /// Wraps an identifier handed out by a live-status provider.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PublicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PublicationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for PublicationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Display payload of a live-status publication.
///
/// All labels are preformatted by the host; this crate never parses them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStatusContent {
    pub title: String,
    pub elapsed_time: String,
    pub status: String,
    pub start_time: String,
    pub accent_color: String,
}

impl LiveStatusContent {
    /// Returns a copy with new elapsed/status labels, carrying over the
    /// title, start label and accent colour.
    #[must_use]
    pub fn with_progress(&self, elapsed_time: &str, status: &str) -> Self {
        Self {
            elapsed_time: elapsed_time.to_string(),
            status: status.to_string(),
            ..self.clone()
        }
    }

    /// Returns a copy whose status is the terminal label.
    #[must_use]
    pub fn finished(&self, status: &str) -> Self {
        Self {
            status: status.to_string(),
            ..self.clone()
        }
    }
}

/// The publication currently held by the session manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveStatusPublication {
    pub id: PublicationId,
    pub content: LiveStatusContent,
}

/// Slot holding at most one live-status publication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LiveStatusSlot {
    /// No publication is held
    #[default]
    Idle,
    /// A publication is live
    Active(LiveStatusPublication),
}

impl LiveStatusSlot {
    /// Returns true if a publication is held.
    pub fn is_active(&self) -> bool {
        matches!(self, LiveStatusSlot::Active(_))
    }

    /// Returns the held publication, if any.
    pub fn current(&self) -> Option<&LiveStatusPublication> {
        match self {
            LiveStatusSlot::Active(publication) => Some(publication),
            LiveStatusSlot::Idle => None,
        }
    }

    /// Returns the held publication only if its id is `id`.
    ///
    /// A stale id is indistinguishable from an empty slot.
    pub fn lookup(&self, id: &PublicationId) -> Option<&LiveStatusPublication> {
        self.current().filter(|publication| &publication.id == id)
    }

    /// Empties the slot, returning what it held.
    pub fn take(&mut self) -> Option<LiveStatusPublication> {
        match std::mem::take(self) {
            LiveStatusSlot::Active(publication) => Some(publication),
            LiveStatusSlot::Idle => None,
        }
    }
}

// ============================================================================
// Remote signals
// ============================================================================

/// Process-wide signals that originate outside the session manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RemoteSignal {
    /// Stop the timer and end every live status
    RemoteCancel {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// End every live status, leaving the timer alone
    EndAllLiveStatuses {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl RemoteSignal {
    /// Returns the optional reason attached to the signal.
    pub fn reason(&self) -> Option<&str> {
        match self {
            RemoteSignal::RemoteCancel { reason } | RemoteSignal::EndAllLiveStatuses { reason } => {
                reason.as_deref()
            }
        }
    }

    /// Returns the signal name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteSignal::RemoteCancel { .. } => "remote_cancel",
            RemoteSignal::EndAllLiveStatuses { .. } => "end_all_live_statuses",
        }
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// Formats elapsed milliseconds as `HH:MM:SS`.
///
/// Negative durations are shown as zero.
pub fn format_elapsed(elapsed_ms: i64) -> String {
    let total_seconds = elapsed_ms.max(0) / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

// ============================================================================
// IPC Types
// ============================================================================

/// IPC request from the host bridge (or CLI) to the daemon.
///
/// Field presence is validated by deserialization; a request missing a
/// required field never reaches the session manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "command",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum IpcRequest {
    /// Start (or replace) the timer session
    StartTimer {
        start_time: i64,
        title: String,
        body: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        primary_color: Option<String>,
    },
    /// Stop the timer session
    StopTimer,
    /// Refresh the background notification
    UpdateNotification { title: String, body: String },
    /// Query whether a session is running
    IsTimerRunning,
    /// Query the elapsed milliseconds
    GetElapsedTime,
    /// Report a foreground/background transition
    SetAppForegroundState { in_foreground: bool },
    /// Clear the dismissed flag
    ResetNotificationState,
    /// Report that the user dismissed the notification
    MarkNotificationDismissed,
    /// Query live-status availability
    AreLiveStatusesAvailable,
    /// Query whether any live status is active
    HasActiveLiveStatuses,
    /// Create a live status, replacing any existing one
    StartLiveStatus {
        title: String,
        start_time: String,
        elapsed_time: String,
        status: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        primary_color: Option<String>,
    },
    /// Update the current live status
    UpdateLiveStatus {
        activity_id: String,
        elapsed_time: String,
        status: String,
    },
    /// End the current live status
    StopLiveStatus { activity_id: String },
    /// End every live status
    StopAllLiveStatuses,
    /// Inject a remote signal
    Signal { signal: RemoteSignal },
}

impl IpcRequest {
    /// Returns the wire command name.
    pub fn command(&self) -> &'static str {
        match self {
            IpcRequest::StartTimer { .. } => "startTimer",
            IpcRequest::StopTimer => "stopTimer",
            IpcRequest::UpdateNotification { .. } => "updateNotification",
            IpcRequest::IsTimerRunning => "isTimerRunning",
            IpcRequest::GetElapsedTime => "getElapsedTime",
            IpcRequest::SetAppForegroundState { .. } => "setAppForegroundState",
            IpcRequest::ResetNotificationState => "resetNotificationState",
            IpcRequest::MarkNotificationDismissed => "markNotificationDismissed",
            IpcRequest::AreLiveStatusesAvailable => "areLiveStatusesAvailable",
            IpcRequest::HasActiveLiveStatuses => "hasActiveLiveStatuses",
            IpcRequest::StartLiveStatus { .. } => "startLiveStatus",
            IpcRequest::UpdateLiveStatus { .. } => "updateLiveStatus",
            IpcRequest::StopLiveStatus { .. } => "stopLiveStatus",
            IpcRequest::StopAllLiveStatuses => "stopAllLiveStatuses",
            IpcRequest::Signal { .. } => "signal",
        }
    }
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_running: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<String>,
}

impl ResponseData {
    /// `{ "success": true }`
    pub fn ok() -> Self {
        Self {
            success: Some(true),
            ..Self::default()
        }
    }

    /// Running flag plus elapsed time, as used by status queries.
    pub fn timer(is_running: bool, elapsed_ms: i64) -> Self {
        Self {
            is_running: Some(is_running),
            elapsed_time: Some(elapsed_ms),
            formatted_time: Some(format_elapsed(elapsed_ms)),
            ..Self::default()
        }
    }

    /// Identifier of a freshly started live status.
    pub fn activity(id: &PublicationId) -> Self {
        Self {
            success: Some(true),
            activity_id: Some(id.to_string()),
            ..Self::default()
        }
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    /// Returns true if this is a success response.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_content() -> LiveStatusContent {
        LiveStatusContent {
            title: "Work".to_string(),
            elapsed_time: "00:01:00".to_string(),
            status: "Running".to_string(),
            start_time: "09:00".to_string(),
            accent_color: DEFAULT_ACCENT_COLOR.to_string(),
        }
    }

    // ------------------------------------------------------------------------
    // Session / foreground Tests
    // ------------------------------------------------------------------------

    mod session_tests {
        use super::*;

        #[test]
        fn test_elapsed_at() {
            let session = TimerSession::new(1_000, DEFAULT_ACCENT_COLOR);
            assert_eq!(session.elapsed_at(5_000), 4_000);
        }

        #[test]
        fn test_elapsed_at_saturates_on_extreme_start() {
            let session = TimerSession::new(i64::MIN, DEFAULT_ACCENT_COLOR);
            assert_eq!(session.elapsed_at(1_000), i64::MAX);

            let session = TimerSession::new(i64::MAX, DEFAULT_ACCENT_COLOR);
            assert_eq!(session.elapsed_at(-1_000), i64::MIN);
        }

        #[test]
        fn test_elapsed_at_backward_clock_is_negative() {
            let session = TimerSession::new(10_000, DEFAULT_ACCENT_COLOR);
            assert_eq!(session.elapsed_at(9_000), -1_000);
        }

        #[test]
        fn test_foreground_default() {
            let state = ForegroundState::default();
            assert!(state.in_foreground);
            assert!(!state.notification_dismissed);
            assert!(!state.accepts_notification_updates());
        }

        #[test]
        fn test_accepts_updates_only_in_background_undismissed() {
            let mut state = ForegroundState {
                in_foreground: false,
                notification_dismissed: false,
            };
            assert!(state.accepts_notification_updates());

            state.notification_dismissed = true;
            assert!(!state.accepts_notification_updates());
        }
    }

    // ------------------------------------------------------------------------
    // Live status Tests
    // ------------------------------------------------------------------------

    mod live_status_tests {
        use super::*;

        #[test]
        fn test_with_progress_carries_over_fields() {
            let updated = sample_content().with_progress("00:02:00", "Paused");
            assert_eq!(updated.title, "Work");
            assert_eq!(updated.start_time, "09:00");
            assert_eq!(updated.accent_color, DEFAULT_ACCENT_COLOR);
            assert_eq!(updated.elapsed_time, "00:02:00");
            assert_eq!(updated.status, "Paused");
        }

        #[test]
        fn test_finished_keeps_elapsed() {
            let finished = sample_content().finished("Finalizada");
            assert_eq!(finished.status, "Finalizada");
            assert_eq!(finished.elapsed_time, "00:01:00");
        }

        #[test]
        fn test_slot_lookup_rejects_stale_id() {
            let slot = LiveStatusSlot::Active(LiveStatusPublication {
                id: PublicationId::new("p2"),
                content: sample_content(),
            });
            assert!(slot.lookup(&PublicationId::new("p2")).is_some());
            assert!(slot.lookup(&PublicationId::new("p1")).is_none());
        }

        #[test]
        fn test_slot_take_leaves_idle() {
            let mut slot = LiveStatusSlot::Active(LiveStatusPublication {
                id: PublicationId::new("p1"),
                content: sample_content(),
            });
            let taken = slot.take();
            assert_eq!(taken.map(|p| p.id), Some(PublicationId::new("p1")));
            assert_eq!(slot, LiveStatusSlot::Idle);
            assert!(slot.take().is_none());
        }

        #[test]
        fn test_content_serializes_camel_case() {
            let json = serde_json::to_value(sample_content()).unwrap();
            assert_eq!(json["elapsedTime"], "00:01:00");
            assert_eq!(json["accentColor"], DEFAULT_ACCENT_COLOR);
        }
    }

    // ------------------------------------------------------------------------
    // Formatting Tests
    // ------------------------------------------------------------------------

    mod format_tests {
        use super::*;

        #[test]
        fn test_format_elapsed() {
            assert_eq!(format_elapsed(0), "00:00:00");
            assert_eq!(format_elapsed(4_000), "00:00:04");
            assert_eq!(format_elapsed(3_723_000), "01:02:03");
        }

        #[test]
        fn test_format_elapsed_negative_is_zero() {
            assert_eq!(format_elapsed(-5_000), "00:00:00");
        }
    }

    // ------------------------------------------------------------------------
    // IPC Type Tests
    // ------------------------------------------------------------------------

    mod ipc_tests {
        use super::*;

        #[test]
        fn test_start_timer_request_wire_format() {
            let json =
                r#"{"command":"startTimer","startTime":1000,"title":"Work","body":"Running"}"#;
            let request: IpcRequest = serde_json::from_str(json).unwrap();
            assert_eq!(
                request,
                IpcRequest::StartTimer {
                    start_time: 1000,
                    title: "Work".to_string(),
                    body: "Running".to_string(),
                    primary_color: None,
                }
            );
        }

        #[test]
        fn test_missing_required_field_is_rejected() {
            let json = r#"{"command":"startTimer","title":"Work"}"#;
            let result: Result<IpcRequest, _> = serde_json::from_str(json);
            assert!(result.is_err());
        }

        #[test]
        fn test_foreground_request_wire_format() {
            let request = IpcRequest::SetAppForegroundState {
                in_foreground: false,
            };
            let json = serde_json::to_string(&request).unwrap();
            assert_eq!(
                json,
                r#"{"command":"setAppForegroundState","inForeground":false}"#
            );
        }

        #[test]
        fn test_signal_request_wire_format() {
            let json = r#"{"command":"signal","signal":{"kind":"remoteCancel","reason":"admin"}}"#;
            let request: IpcRequest = serde_json::from_str(json).unwrap();
            match request {
                IpcRequest::Signal { signal } => {
                    assert_eq!(signal.reason(), Some("admin"));
                    assert_eq!(signal.as_str(), "remote_cancel");
                }
                other => panic!("Expected Signal, got {:?}", other),
            }
        }

        #[test]
        fn test_command_names_match_wire_tags() {
            let request = IpcRequest::UpdateLiveStatus {
                activity_id: "p1".to_string(),
                elapsed_time: "00:00:30".to_string(),
                status: "Running".to_string(),
            };
            let json = serde_json::to_value(&request).unwrap();
            assert_eq!(json["command"], request.command());
            assert_eq!(json["activityId"], "p1");
        }

        #[test]
        fn test_response_data_skips_empty_fields() {
            let json = serde_json::to_string(&ResponseData::ok()).unwrap();
            assert_eq!(json, r#"{"success":true}"#);
        }

        #[test]
        fn test_response_data_timer() {
            let data = ResponseData::timer(true, 4_000);
            assert_eq!(data.is_running, Some(true));
            assert_eq!(data.elapsed_time, Some(4_000));
            assert_eq!(data.formatted_time.as_deref(), Some("00:00:04"));
        }

        #[test]
        fn test_ipc_response_success_and_error() {
            let ok = IpcResponse::success("done", None);
            assert!(ok.is_success());

            let err = IpcResponse::error("boom");
            assert!(!err.is_success());
            assert_eq!(err.status, "error");
            assert!(err.data.is_none());
        }
    }
}
