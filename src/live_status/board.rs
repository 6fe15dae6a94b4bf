//! In-process live-status board.
//!
//! Holds publications in memory and logs every change. The daemon uses it
//! where no platform live-activity service exists; a host renderer can poll
//! [`LiveStatusBoard::publications`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use uuid::Uuid;

use super::{LiveStatusError, LiveStatusProvider};
use crate::types::{LiveStatusContent, PublicationId};

/// In-memory live-status provider.
#[derive(Debug)]
pub struct LiveStatusBoard {
    publications: Mutex<Vec<(PublicationId, LiveStatusContent)>>,
    enabled: AtomicBool,
}

impl LiveStatusBoard {
    /// Creates an empty board.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            publications: Mutex::new(Vec::new()),
            enabled: AtomicBool::new(enabled),
        }
    }

    /// Enables or disables the capability.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Returns a snapshot of all live publications.
    #[must_use]
    pub fn publications(&self) -> Vec<(PublicationId, LiveStatusContent)> {
        self.lock().clone()
    }

    /// Returns the content of a live publication.
    #[must_use]
    pub fn get(&self, id: &PublicationId) -> Option<LiveStatusContent> {
        self.lock()
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, content)| content.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(PublicationId, LiveStatusContent)>> {
        self.publications
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for LiveStatusBoard {
    fn default() -> Self {
        Self::new(true)
    }
}

impl LiveStatusProvider for LiveStatusBoard {
    fn is_available(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    async fn request(&self, content: &LiveStatusContent) -> Result<PublicationId, LiveStatusError> {
        if !self.is_available() {
            return Err(LiveStatusError::Unavailable);
        }

        let id = PublicationId::new(Uuid::new_v4().to_string());
        self.lock().push((id.clone(), content.clone()));

        tracing::info!(
            publication_id = %id,
            title = %content.title,
            accent_color = %content.accent_color,
            "Live status published"
        );
        Ok(id)
    }

    async fn update(
        &self,
        id: &PublicationId,
        content: &LiveStatusContent,
    ) -> Result<(), LiveStatusError> {
        let mut publications = self.lock();
        let entry = publications
            .iter_mut()
            .find(|(existing, _)| existing == id)
            .ok_or_else(|| LiveStatusError::NotFound(id.clone()))?;
        entry.1 = content.clone();

        tracing::debug!(
            publication_id = %id,
            elapsed = %content.elapsed_time,
            status = %content.status,
            "Live status updated"
        );
        Ok(())
    }

    async fn end(
        &self,
        id: &PublicationId,
        final_content: Option<&LiveStatusContent>,
    ) -> Result<(), LiveStatusError> {
        let mut publications = self.lock();
        let before = publications.len();
        publications.retain(|(existing, _)| existing != id);
        if publications.len() == before {
            return Err(LiveStatusError::NotFound(id.clone()));
        }

        match final_content {
            Some(content) => tracing::info!(
                publication_id = %id,
                status = %content.status,
                "Live status ended"
            ),
            None => tracing::info!(publication_id = %id, "Live status dismissed"),
        }
        Ok(())
    }

    fn active_ids(&self) -> Vec<PublicationId> {
        self.lock().iter().map(|(id, _)| id.clone()).collect()
    }
}
