//! Per-visitor studio state.
//!
//! Each browser session owns one [`StudioHandle`]. Nothing here is shared
//! between sessions apart from the token map in [`Studios`].

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Local, Utc};
use image::RgbaImage;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::debug;

use crate::catalog::Template;
use crate::constants::SESSION_INACTIVITY_HOURS;
use crate::design::DesignRequest;

/// A finished design kept in the session history.
#[derive(Debug)]
pub struct Design {
    /// Identifier, unique within the session.
    pub id: u64,
    /// The captioned image.
    pub image: RgbaImage,
    /// When it was made.
    pub created_at: DateTime<Local>,
    /// What was asked for, kept so the design can be remixed.
    pub request: DesignRequest,
}

impl Design {
    /// Time of day shown under history thumbnails.
    pub fn time_caption(&self) -> String {
        self.created_at.format("%I:%M %p").to_string()
    }
}

/// Mutable state for one visitor.
#[derive(Debug, Default)]
pub struct StudioSession {
    current: Option<Arc<Design>>,
    history: Vec<Arc<Design>>,
    selected_template: Option<Template>,
    next_id: u64,
}

impl StudioSession {
    /// Stores a new design as current and appends it to the history.
    pub fn record(&mut self, image: RgbaImage, request: DesignRequest) -> Arc<Design> {
        self.next_id += 1;
        let design = Arc::new(Design {
            id: self.next_id,
            image,
            created_at: Local::now(),
            request,
        });
        self.history.push(design.clone());
        self.current = Some(design.clone());
        design
    }

    /// The most recent design, which survives clearing the history.
    pub fn current(&self) -> Option<Arc<Design>> {
        self.current.clone()
    }

    /// Looks a design up by id.
    pub fn find(&self, id: u64) -> Option<Arc<Design>> {
        self.history
            .iter()
            .find(|design| design.id == id)
            .or(self.current.as_ref().filter(|design| design.id == id))
            .cloned()
    }

    /// History, newest first.
    pub fn history(&self) -> Vec<Arc<Design>> {
        self.history.iter().rev().cloned().collect()
    }

    /// Forgets every history entry. Returns how many were dropped.
    pub fn clear_history(&mut self) -> usize {
        let dropped = self.history.len();
        self.history.clear();
        dropped
    }

    /// Template picked in the gallery, prefilled into the next form.
    pub fn selected_template(&self) -> Option<&Template> {
        self.selected_template.as_ref()
    }

    /// Replaces the selected template.
    pub fn select_template(&mut self, template: Template) {
        self.selected_template = Some(template);
    }

    /// Takes the selected template, leaving none selected.
    pub fn take_template(&mut self) -> Option<Template> {
        self.selected_template.take()
    }
}

/// Shared handle to one visitor's studio.
#[derive(Debug, Default)]
pub struct StudioHandle {
    state: Mutex<StudioSession>,
    generating: Mutex<()>,
    last_seen: AtomicI64,
}

impl StudioHandle {
    /// Locks the studio state.
    pub async fn state(&self) -> MutexGuard<'_, StudioSession> {
        self.state.lock().await
    }

    /// Claims the generation slot. Returns `None` while another generation
    /// for this studio is still running.
    pub fn try_begin_generation(&self) -> Option<MutexGuard<'_, ()>> {
        self.generating.try_lock().ok()
    }

    fn touch(&self) {
        self.last_seen.store(Utc::now().timestamp(), Ordering::Relaxed);
    }

    fn idle_since(&self, cutoff: i64) -> bool {
        self.last_seen.load(Ordering::Relaxed) < cutoff
    }
}

/// Studio handles keyed by the token stored in the visitor's cookie session.
#[derive(Debug, Default)]
pub struct Studios {
    studios: RwLock<HashMap<String, Arc<StudioHandle>>>,
}

impl Studios {
    /// Returns the studio for `token`, creating it on first use.
    pub async fn get_or_create(&self, token: &str) -> Arc<StudioHandle> {
        if let Some(handle) = self.studios.read().await.get(token) {
            handle.touch();
            return handle.clone();
        }

        let mut studios = self.studios.write().await;
        let cutoff = Utc::now().timestamp() - SESSION_INACTIVITY_HOURS * 60 * 60;
        let before = studios.len();
        studios.retain(|_, handle| Arc::strong_count(handle) > 1 || !handle.idle_since(cutoff));
        if studios.len() < before {
            debug!("Dropped {} idle studios", before - studios.len());
        }

        let handle = studios.entry(token.to_string()).or_default().clone();
        handle.touch();
        handle
    }

    /// Number of live studios.
    pub async fn len(&self) -> usize {
        self.studios.read().await.len()
    }

    /// True when no visitor has a studio yet.
    pub async fn is_empty(&self) -> bool {
        self.studios.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use image::Rgba;

    use crate::catalog::Catalog;
    use crate::design::DesignForm;

    fn request() -> DesignRequest {
        let catalog = Catalog::bundled().expect("catalog");
        DesignForm {
            prompt: "poster".to_string(),
            ..DesignForm::for_catalog(&catalog)
        }
        .validate(&catalog)
        .expect("valid form")
    }

    fn image() -> RgbaImage {
        RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]))
    }

    #[test]
    fn history_is_newest_first_and_ids_increase() {
        let mut studio = StudioSession::default();
        let first = studio.record(image(), request());
        let second = studio.record(image(), request());
        assert!(second.id > first.id);
        let ids: Vec<u64> = studio.history().iter().map(|design| design.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(studio.current().map(|design| design.id), Some(second.id));
    }

    #[test]
    fn clearing_keeps_current() {
        let mut studio = StudioSession::default();
        studio.record(image(), request());
        let latest = studio.record(image(), request());
        assert_eq!(studio.clear_history(), 2);
        assert!(studio.history().is_empty());
        assert!(studio.find(1).is_none());
        assert_eq!(studio.find(latest.id).map(|design| design.id), Some(latest.id));

        let next = studio.record(image(), request());
        assert!(next.id > latest.id);
    }

    #[test]
    fn time_caption_is_twelve_hour() {
        let mut studio = StudioSession::default();
        let design = studio.record(image(), request());
        let caption = design.time_caption();
        assert_eq!(caption.len(), "03:07 PM".len());
        assert!(caption.ends_with("AM") || caption.ends_with("PM"), "{caption}");
    }

    #[test]
    fn template_selection() {
        let mut studio = StudioSession::default();
        assert!(studio.selected_template().is_none());
        studio.select_template(Template {
            name: "Tech Fest".to_string(),
            prompt: "robots".to_string(),
        });
        assert_eq!(
            studio.take_template().map(|template| template.prompt),
            Some("robots".to_string())
        );
        assert!(studio.selected_template().is_none());
    }

    #[tokio::test]
    async fn one_generation_at_a_time() {
        let handle = StudioHandle::default();
        let guard = handle.try_begin_generation();
        assert!(guard.is_some());
        assert!(handle.try_begin_generation().is_none());
        drop(guard);
        assert!(handle.try_begin_generation().is_some());
    }

    #[tokio::test]
    async fn studios_are_isolated_per_token() {
        let studios = Studios::default();
        assert!(studios.is_empty().await);
        let alice = studios.get_or_create("alice").await;
        let bob = studios.get_or_create("bob").await;
        alice.state().await.record(image(), request());
        assert_eq!(alice.state().await.history().len(), 1);
        assert!(bob.state().await.history().is_empty());

        let again = studios.get_or_create("alice").await;
        assert!(Arc::ptr_eq(&alice, &again));
        assert_eq!(studios.len().await, 2);
    }
}
