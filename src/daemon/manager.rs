//! Timer session manager.
//!
//! Owns the single timer session, the single live-status slot and the
//! foreground/notification state:
//! - Starting a session replaces the previous one and its tick source
//! - At most one live-status publication exists; a new one is requested
//!   only after every existing one has been ended
//! - Background notifications are only pushed while the app is in the
//!   background and the user has not dismissed them
//! - Remote signals stop the timer and/or every live status
//!
//! All state sits behind one async mutex. Platform round trips (ending and
//! requesting publications, delivering notifications) are awaited while
//! the lock is held, so an end-then-request sequence can never interleave
//! with another caller.

use std::sync::{Arc, Weak};

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::config::NativeTimerConfig;
use crate::live_status::{LiveStatusError, LiveStatusProvider};
use crate::notification::{NotificationCenter, NotificationError};
use crate::types::{
    format_elapsed, ForegroundState, LiveStatusContent, LiveStatusPublication, LiveStatusSlot,
    PublicationId, RemoteSignal, TimerSession,
};

use super::clock::{Clock, SystemClock};
use super::error::TimerError;
use super::signals::SignalSubscription;
use super::ticker::Ticker;

// ============================================================================
// TimerEvent
// ============================================================================

/// Events emitted by the manager for listeners such as the daemon log or a
/// host bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// A session started (or replaced the previous one)
    Started {
        /// Epoch milliseconds of the session start
        start_millis: i64,
    },
    /// Periodic tick while a session runs
    Tick {
        /// Milliseconds since the session start
        elapsed_ms: i64,
        /// `elapsed_ms` as `HH:MM:SS`
        formatted: String,
    },
    /// The session was stopped
    Stopped,
    /// A live status became the current one
    LiveStatusStarted {
        /// Handle of the new publication
        id: PublicationId,
    },
    /// A live status was ended
    LiveStatusEnded {
        /// Handle of the ended publication
        id: PublicationId,
    },
    /// A remote signal was handled
    RemoteSignalHandled {
        /// The signal that arrived
        signal: RemoteSignal,
    },
}

// ============================================================================
// TimerSessionManager
// ============================================================================

#[derive(Debug, Default)]
struct ManagerState {
    session: Option<TimerSession>,
    ticker: Option<Ticker>,
    foreground: ForegroundState,
    live: LiveStatusSlot,
}

/// Single owner of the timer session and the live-status slot.
pub struct TimerSessionManager<N, L> {
    state: Mutex<ManagerState>,
    notifications: Arc<N>,
    live_status: Arc<L>,
    clock: Arc<dyn Clock>,
    config: NativeTimerConfig,
    event_tx: Option<mpsc::UnboundedSender<TimerEvent>>,
    signal_listener: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl<N, L> TimerSessionManager<N, L>
where
    N: NotificationCenter,
    L: LiveStatusProvider,
{
    /// Creates a manager using the system clock and no event channel.
    pub fn new(notifications: Arc<N>, live_status: Arc<L>, config: NativeTimerConfig) -> Self {
        Self {
            state: Mutex::new(ManagerState::default()),
            notifications,
            live_status,
            clock: Arc::new(SystemClock),
            config,
            event_tx: None,
            signal_listener: std::sync::Mutex::new(None),
        }
    }

    /// Replaces the clock used for elapsed-time queries and ticks.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sends [`TimerEvent`]s to `event_tx`.
    #[must_use]
    pub fn with_event_sender(mut self, event_tx: mpsc::UnboundedSender<TimerEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// Finishes construction without remote-signal handling.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Finishes construction and starts handling signals from
    /// `subscription` for the lifetime of the manager.
    ///
    /// The listener holds only a weak reference; it is aborted when the last
    /// `Arc` is dropped or [`shutdown`](Self::shutdown) is called. Must be
    /// called from within a tokio runtime.
    pub fn listen(self, mut subscription: SignalSubscription) -> Arc<Self> {
        let manager = Arc::new(self);
        let weak: Weak<Self> = Arc::downgrade(&manager);

        let handle = tokio::spawn(async move {
            while let Some(signal) = subscription.recv().await {
                let Some(manager) = weak.upgrade() else {
                    break;
                };
                manager.handle_remote_signal(signal).await;
            }
            tracing::debug!("Remote signal listener stopped");
        });

        *manager.listener_slot() = Some(handle);
        manager
    }

    /// Returns the configuration in use.
    pub fn config(&self) -> &NativeTimerConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Timer session
    // ------------------------------------------------------------------------

    /// Starts a session at `start_millis`, replacing any running one.
    ///
    /// Existing live statuses are ended first. If that fails nothing
    /// changes and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::CapabilityUnavailable`] if an existing live
    /// status could not be ended.
    pub async fn start_timer(
        &self,
        start_millis: i64,
        title: &str,
        body: &str,
        accent_color: Option<&str>,
    ) -> Result<(), TimerError> {
        let mut state = self.state.lock().await;

        if self.has_live_statuses(&state) {
            tracing::warn!("Timer restarted with a live status still active; ending it first");
            self.end_all_live_statuses(&mut state).await?;
        }

        if let Some(previous) = state.ticker.take() {
            previous.cancel();
            tracing::debug!("Previous tick source cancelled");
        }

        let accent_color = accent_color.unwrap_or(&self.config.default_accent_color);
        let session = TimerSession::new(start_millis, accent_color);
        state.ticker = Some(self.spawn_ticker(session.clone()));
        state.session = Some(session);

        self.request_authorization_in_background();

        if !state.foreground.in_foreground {
            self.deliver_notification(title, body).await;
        }

        tracing::info!(start_millis, accent_color, "Timer started");
        self.emit(TimerEvent::Started { start_millis });
        Ok(())
    }

    /// Stops the session and clears pending and delivered notifications.
    ///
    /// Live statuses are left alone. Calling this with no session running
    /// is a no-op apart from the notification cleanup.
    pub async fn stop_timer(&self) {
        let mut state = self.state.lock().await;
        self.stop_timer_locked(&mut state);
    }

    fn stop_timer_locked(&self, state: &mut ManagerState) {
        if let Some(ticker) = state.ticker.take() {
            ticker.cancel();
        }
        let was_running = state.session.take().is_some();

        self.notifications.cancel_pending();
        self.notifications.cancel_delivered();

        if was_running {
            tracing::info!("Timer stopped");
            self.emit(TimerEvent::Stopped);
        }
    }

    /// Re-delivers the background notification with new text.
    ///
    /// Does nothing while the app is in the foreground or after the user
    /// dismissed the notification.
    pub async fn update_notification(&self, title: &str, body: &str) {
        let state = self.state.lock().await;

        if !state.foreground.accepts_notification_updates() {
            tracing::debug!(
                in_foreground = state.foreground.in_foreground,
                dismissed = state.foreground.notification_dismissed,
                "Notification update suppressed"
            );
            return;
        }

        self.deliver_notification(title, body).await;
    }

    /// Returns true if a session is running.
    pub async fn is_timer_running(&self) -> bool {
        self.state.lock().await.session.is_some()
    }

    /// Milliseconds since the session start, or 0 when idle.
    ///
    /// Uses the wall clock; a clock moved backwards can make this negative.
    pub async fn get_elapsed_time(&self) -> i64 {
        let state = self.state.lock().await;
        state
            .session
            .as_ref()
            .map_or(0, |session| session.elapsed_at(self.clock.now_millis()))
    }

    /// Returns a copy of the running session, if any.
    pub async fn current_session(&self) -> Option<TimerSession> {
        self.state.lock().await.session.clone()
    }

    // ------------------------------------------------------------------------
    // Foreground / notification state
    // ------------------------------------------------------------------------

    /// Records a foreground/background transition.
    ///
    /// Coming to the foreground clears delivered notifications and the
    /// dismissed flag.
    pub async fn set_app_foreground_state(&self, in_foreground: bool) {
        let mut state = self.state.lock().await;
        state.foreground.in_foreground = in_foreground;

        if in_foreground {
            self.notifications.cancel_delivered();
            state.foreground.notification_dismissed = false;
        }

        tracing::debug!(in_foreground, "App foreground state changed");
    }

    /// Clears the dismissed flag only.
    pub async fn reset_notification_state(&self) {
        self.state.lock().await.foreground.notification_dismissed = false;
    }

    /// Records that the user dismissed the background notification, which
    /// suppresses further updates until the flag is reset.
    pub async fn mark_notification_dismissed(&self) {
        self.state.lock().await.foreground.notification_dismissed = true;
        tracing::debug!("Notification marked as dismissed");
    }

    /// Returns the current foreground state.
    pub async fn foreground_state(&self) -> ForegroundState {
        self.state.lock().await.foreground
    }

    // ------------------------------------------------------------------------
    // Live status
    // ------------------------------------------------------------------------

    /// Returns true if the live-status capability is enabled.
    pub fn is_live_status_available(&self) -> bool {
        self.live_status.is_available()
    }

    /// Returns true if a publication is held or the platform still lists
    /// one.
    pub async fn has_active_live_statuses(&self) -> bool {
        let state = self.state.lock().await;
        self.has_live_statuses(&state)
    }

    /// Returns the publication currently held, if any.
    pub async fn current_live_status(&self) -> Option<LiveStatusPublication> {
        self.state.lock().await.live.current().cloned()
    }

    /// Starts a live status, ending any existing one first.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::CapabilityUnavailable`] if the capability is
    /// disabled, an existing publication could not be ended, or the
    /// platform refused the new one.
    pub async fn start_live_status(
        &self,
        title: &str,
        start_time: &str,
        elapsed_time: &str,
        status: &str,
        accent_color: Option<&str>,
    ) -> Result<PublicationId, TimerError> {
        if !self.live_status.is_available() {
            return Err(LiveStatusError::Unavailable.into());
        }

        let mut state = self.state.lock().await;

        if self.has_live_statuses(&state) {
            tracing::warn!("Live status already active; ending it before creating a new one");
            self.end_all_live_statuses(&mut state).await?;
        }

        let content = LiveStatusContent {
            title: title.to_string(),
            elapsed_time: elapsed_time.to_string(),
            status: status.to_string(),
            start_time: start_time.to_string(),
            accent_color: accent_color
                .unwrap_or(&self.config.default_accent_color)
                .to_string(),
        };

        let id = self.live_status.request(&content).await?;
        state.live = LiveStatusSlot::Active(LiveStatusPublication {
            id: id.clone(),
            content,
        });

        tracing::info!(publication_id = %id, "Live status started");
        self.emit(TimerEvent::LiveStatusStarted { id: id.clone() });
        Ok(id)
    }

    /// Replaces the elapsed and status labels of the current publication.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::NoActivePublication`] if `id` is not the
    /// current publication, or a capability error if the platform update
    /// fails.
    pub async fn update_live_status(
        &self,
        id: &PublicationId,
        elapsed_time: &str,
        status: &str,
    ) -> Result<(), TimerError> {
        let mut state = self.state.lock().await;

        let content = state
            .live
            .lookup(id)
            .ok_or(TimerError::NoActivePublication)?
            .content
            .with_progress(elapsed_time, status);

        match self.live_status.update(id, &content).await {
            Ok(()) => {}
            Err(LiveStatusError::NotFound(_)) => {
                tracing::warn!(publication_id = %id, "Live status vanished from the platform");
                state.live.take();
                return Err(TimerError::NoActivePublication);
            }
            Err(e) => return Err(e.into()),
        }

        if let LiveStatusSlot::Active(publication) = &mut state.live {
            publication.content = content;
        }
        tracing::debug!(publication_id = %id, elapsed_time, status, "Live status updated");
        Ok(())
    }

    /// Ends the current publication, showing the terminal status label.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::NoActivePublication`] if `id` is not the
    /// current publication, or a capability error if ending fails (the
    /// publication is then kept).
    pub async fn stop_live_status(&self, id: &PublicationId) -> Result<(), TimerError> {
        let mut state = self.state.lock().await;

        let final_content = state
            .live
            .lookup(id)
            .ok_or(TimerError::NoActivePublication)?
            .content
            .finished(&self.config.finished_status_label);

        match self.live_status.end(id, Some(&final_content)).await {
            Ok(()) | Err(LiveStatusError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        state.live.take();
        tracing::info!(publication_id = %id, "Live status stopped");
        self.emit(TimerEvent::LiveStatusEnded { id: id.clone() });
        Ok(())
    }

    /// Ends every live status, tracked or not. A no-op when none exists.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::CapabilityUnavailable`] if any publication
    /// could not be ended. The others are still ended.
    pub async fn stop_all_live_statuses(&self) -> Result<(), TimerError> {
        let mut state = self.state.lock().await;
        self.end_all_live_statuses(&mut state).await
    }

    fn has_live_statuses(&self, state: &ManagerState) -> bool {
        state.live.is_active() || !self.live_status.active_ids().is_empty()
    }

    async fn end_all_live_statuses(&self, state: &mut ManagerState) -> Result<(), TimerError> {
        let mut ids = self.live_status.active_ids();
        if let Some(current) = state.live.current() {
            if !ids.contains(&current.id) {
                ids.push(current.id.clone());
            }
        }

        let mut failure: Option<LiveStatusError> = None;
        for id in ids {
            match self.live_status.end(&id, None).await {
                Ok(()) | Err(LiveStatusError::NotFound(_)) => {
                    if state.live.lookup(&id).is_some() {
                        state.live.take();
                    }
                    tracing::info!(publication_id = %id, "Live status ended");
                    self.emit(TimerEvent::LiveStatusEnded { id });
                }
                Err(e) => {
                    tracing::warn!(publication_id = %id, error = %e, "Failed to end live status");
                    failure.get_or_insert(e);
                }
            }
        }

        match failure {
            Some(e) => Err(TimerError::CapabilityUnavailable(e.to_string())),
            None => Ok(()),
        }
    }

    // ------------------------------------------------------------------------
    // Remote signals / teardown
    // ------------------------------------------------------------------------

    /// Handles a remote signal. Safe to call with nothing running.
    pub async fn handle_remote_signal(&self, signal: RemoteSignal) {
        let reason = signal.reason().unwrap_or("unspecified");
        tracing::info!(signal = signal.as_str(), reason, "Remote signal received");

        let mut state = self.state.lock().await;

        if matches!(signal, RemoteSignal::RemoteCancel { .. }) {
            self.stop_timer_locked(&mut state);
        }
        if let Err(e) = self.end_all_live_statuses(&mut state).await {
            tracing::warn!(error = %e, "Live statuses left active after remote signal");
        }

        self.emit(TimerEvent::RemoteSignalHandled { signal });
    }

    /// Stops the signal listener and the tick source. The session state is
    /// kept.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.listener_slot().take() {
            handle.abort();
        }
        if let Some(ticker) = self.state.lock().await.ticker.take() {
            ticker.cancel();
        }
        tracing::debug!("Session manager shut down");
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn spawn_ticker(&self, session: TimerSession) -> Ticker {
        let clock = Arc::clone(&self.clock);
        let events = self.event_tx.clone();

        Ticker::spawn(self.config.tick_interval(), move |_| {
            let elapsed_ms = session.elapsed_at(clock.now_millis());
            let formatted = format_elapsed(elapsed_ms);
            tracing::debug!(elapsed_ms, %formatted, "Timer tick");

            if let Some(tx) = &events {
                let _ = tx.send(TimerEvent::Tick {
                    elapsed_ms,
                    formatted,
                });
            }
        })
    }

    fn request_authorization_in_background(&self) {
        let center = Arc::clone(&self.notifications);
        tokio::spawn(async move {
            match center.request_authorization().await {
                Ok(true) => tracing::debug!("Notification permission granted"),
                Ok(false) => tracing::warn!(
                    error = %NotificationError::PermissionDenied,
                    "Notifications will not be shown"
                ),
                Err(e) => tracing::warn!(error = %e, "Failed to request notification permission"),
            }
        });
    }

    async fn deliver_notification(&self, title: &str, body: &str) {
        let identifier = &self.config.notification_identifier;
        if let Err(e) = self.notifications.deliver(identifier, title, body).await {
            tracing::warn!(error = %e, "Failed to deliver notification");
        }
    }

    fn emit(&self, event: TimerEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }
}

impl<N, L> TimerSessionManager<N, L> {
    fn listener_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.signal_listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<N, L> Drop for TimerSessionManager<N, L> {
    fn drop(&mut self) {
        if let Some(handle) = self.listener_slot().take() {
            handle.abort();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
