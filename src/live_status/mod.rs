//! Live-status publications.
//!
//! A live status is a platform-rendered, continuously updated card showing
//! session progress (a Live Activity / Dynamic Island on iOS). The session
//! manager drives it through the [`LiveStatusProvider`] trait and never
//! renders anything itself.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ TimerSessionManager  │ ← holds the single current publication
//! └──────────┬───────────┘
//!            │ request / update / end
//!            ▼
//! ┌──────────────────────┐     ┌──────────────────────┐
//! │  LiveStatusProvider  │────▶│  LiveStatusBoard     │
//! │                      │     │  (in-process)        │
//! │                      │     ├──────────────────────┤
//! │                      │────▶│  MockLiveStatus...   │
//! └──────────────────────┘     │  (tests)             │
//!                              └──────────────────────┘
//! ```

mod board;
pub mod error;

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub use self::board::LiveStatusBoard;
pub use self::error::LiveStatusError;

use crate::types::{LiveStatusContent, PublicationId};

/// Platform live-status primitives consumed by the session manager.
pub trait LiveStatusProvider: Send + Sync + 'static {
    /// Returns true if the capability exists and is enabled.
    fn is_available(&self) -> bool;

    /// Creates a publication and returns its handle.
    fn request(
        &self,
        content: &LiveStatusContent,
    ) -> impl Future<Output = Result<PublicationId, LiveStatusError>> + Send;

    /// Replaces the content of a publication.
    fn update(
        &self,
        id: &PublicationId,
        content: &LiveStatusContent,
    ) -> impl Future<Output = Result<(), LiveStatusError>> + Send;

    /// Ends a publication and dismisses it immediately. `final_content`, when
    /// given, is shown as the last state.
    fn end(
        &self,
        id: &PublicationId,
        final_content: Option<&LiveStatusContent>,
    ) -> impl Future<Output = Result<(), LiveStatusError>> + Send;

    /// Lists every publication the platform still considers active,
    /// including ones this process no longer tracks.
    fn active_ids(&self) -> Vec<PublicationId>;
}

// ============================================================================
// MockLiveStatusProvider
// ============================================================================

/// A call recorded by [`MockLiveStatusProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveStatusCall {
    Request { title: String },
    Update { id: PublicationId, status: String },
    End { id: PublicationId, final_status: Option<String> },
}

/// Recording live-status provider for tests.
///
/// Hands out sequential ids (`p1`, `p2`, ...).
#[derive(Debug)]
pub struct MockLiveStatusProvider {
    calls: Mutex<Vec<LiveStatusCall>>,
    active: Mutex<Vec<(PublicationId, LiveStatusContent)>>,
    next_id: AtomicUsize,
    available: AtomicBool,
    should_fail_request: AtomicBool,
    should_fail_end: AtomicBool,
    latency: Mutex<Duration>,
}

impl Default for MockLiveStatusProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLiveStatusProvider {
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            active: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
            available: AtomicBool::new(true),
            should_fail_request: AtomicBool::new(false),
            should_fail_end: AtomicBool::new(false),
            latency: Mutex::new(Duration::ZERO),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_should_fail_request(&self, should_fail: bool) {
        self.should_fail_request.store(should_fail, Ordering::SeqCst);
    }

    pub fn set_should_fail_end(&self, should_fail: bool) {
        self.should_fail_end.store(should_fail, Ordering::SeqCst);
    }

    /// Makes `request` and `end` sleep for `latency` before completing.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    /// Registers a publication the manager did not create, as if left over
    /// from an earlier process.
    pub fn inject_orphan(&self, id: &str, content: LiveStatusContent) {
        self.active
            .lock()
            .unwrap()
            .push((PublicationId::new(id), content));
    }

    #[must_use]
    pub fn calls(&self) -> Vec<LiveStatusCall> {
        self.calls.lock().unwrap().clone()
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.lock().unwrap().len()
    }

    #[must_use]
    pub fn content_of(&self, id: &PublicationId) -> Option<LiveStatusContent> {
        self.active
            .lock()
            .unwrap()
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, content)| content.clone())
    }
}

impl LiveStatusProvider for MockLiveStatusProvider {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn request(&self, content: &LiveStatusContent) -> Result<PublicationId, LiveStatusError> {
        self.calls.lock().unwrap().push(LiveStatusCall::Request {
            title: content.title.clone(),
        });
        self.simulate_latency().await;
        if self.should_fail_request.load(Ordering::SeqCst) {
            return Err(LiveStatusError::RequestFailed("Mock failure".to_string()));
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let id = PublicationId::new(format!("p{}", n));
        self.active
            .lock()
            .unwrap()
            .push((id.clone(), content.clone()));
        Ok(id)
    }

    async fn update(
        &self,
        id: &PublicationId,
        content: &LiveStatusContent,
    ) -> Result<(), LiveStatusError> {
        self.calls.lock().unwrap().push(LiveStatusCall::Update {
            id: id.clone(),
            status: content.status.clone(),
        });

        let mut active = self.active.lock().unwrap();
        match active.iter_mut().find(|(existing, _)| existing == id) {
            Some(entry) => {
                entry.1 = content.clone();
                Ok(())
            }
            None => Err(LiveStatusError::NotFound(id.clone())),
        }
    }

    async fn end(
        &self,
        id: &PublicationId,
        final_content: Option<&LiveStatusContent>,
    ) -> Result<(), LiveStatusError> {
        self.calls.lock().unwrap().push(LiveStatusCall::End {
            id: id.clone(),
            final_status: final_content.map(|c| c.status.clone()),
        });
        self.simulate_latency().await;
        if self.should_fail_end.load(Ordering::SeqCst) {
            return Err(LiveStatusError::EndFailed(
                id.clone(),
                "Mock failure".to_string(),
            ));
        }

        self.active
            .lock()
            .unwrap()
            .retain(|(existing, _)| existing != id);
        Ok(())
    }

    fn active_ids(&self) -> Vec<PublicationId> {
        self.active
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_ACCENT_COLOR;

    fn content(title: &str) -> LiveStatusContent {
        LiveStatusContent {
            title: title.to_string(),
            elapsed_time: "00:00:00".to_string(),
            status: "Running".to_string(),
            start_time: "09:00".to_string(),
            accent_color: DEFAULT_ACCENT_COLOR.to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_sequential_ids() {
        let mock = MockLiveStatusProvider::new();

        let p1 = mock.request(&content("A")).await.unwrap();
        let p2 = mock.request(&content("B")).await.unwrap();

        assert_eq!(p1.as_str(), "p1");
        assert_eq!(p2.as_str(), "p2");
        assert_eq!(mock.active_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_records_calls_in_order() {
        let mock = MockLiveStatusProvider::new();

        let id = mock.request(&content("A")).await.unwrap();
        mock.update(&id, &content("A").with_progress("00:00:30", "Paused"))
            .await
            .unwrap();
        mock.end(&id, None).await.unwrap();

        assert_eq!(
            mock.calls(),
            vec![
                LiveStatusCall::Request {
                    title: "A".to_string()
                },
                LiveStatusCall::Update {
                    id: id.clone(),
                    status: "Paused".to_string()
                },
                LiveStatusCall::End {
                    id,
                    final_status: None
                },
            ]
        );
        assert_eq!(mock.active_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_end_failure_keeps_publication() {
        let mock = MockLiveStatusProvider::new();
        let id = mock.request(&content("A")).await.unwrap();

        mock.set_should_fail_end(true);
        assert!(mock.end(&id, None).await.is_err());
        assert_eq!(mock.active_ids(), vec![id]);
    }

    #[tokio::test]
    async fn test_mock_request_failure() {
        let mock = MockLiveStatusProvider::new();
        mock.set_should_fail_request(true);

        assert!(mock.request(&content("A")).await.is_err());
        assert_eq!(mock.active_count(), 0);
    }

    #[test]
    fn test_mock_availability() {
        let mock = MockLiveStatusProvider::new();
        assert!(mock.is_available());

        mock.set_available(false);
        assert!(!mock.is_available());
    }

    #[test]
    fn test_mock_inject_orphan() {
        let mock = MockLiveStatusProvider::new();
        mock.inject_orphan("stale", content("Old"));
        assert_eq!(mock.active_ids(), vec![PublicationId::new("stale")]);
    }
}
