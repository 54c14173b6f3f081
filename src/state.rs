//! Shared slideshow state guarded by a monitor (mutex + condition variable).
//!
//! Every mutation happens under the lock and is followed by `notify_all`, so the
//! advance scheduler waiting on [`SlideshowState::changed`] re-evaluates its
//! predicates after any change to playback, delay or the image list.

use std::path::PathBuf;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{DEFAULT_DELAY_MS, MIN_DELAY_MS};
use crate::error::Error;
use crate::scan::ImageDescriptor;
use crate::snapshot::Snapshot;

#[derive(Debug)]
pub(crate) struct Inner {
    pub(crate) images: Arc<[ImageDescriptor]>,
    pub(crate) current_index: usize,
    pub(crate) delay_ms: u64,
    pub(crate) delay_override: bool,
    pub(crate) is_playing: bool,
    pub(crate) last_error: Option<String>,
    pub(crate) closed: bool,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            images: Arc::from(Vec::new()),
            current_index: 0,
            delay_ms: DEFAULT_DELAY_MS,
            delay_override: false,
            is_playing: false,
            last_error: None,
            closed: false,
        }
    }
}

impl Inner {
    /// Step to the next image, or drop to idle if the list emptied underneath us.
    pub(crate) fn advance(&mut self) {
        if self.images.is_empty() {
            self.is_playing = false;
            return;
        }
        self.current_index = (self.current_index + 1) % self.images.len();
    }

    /// Delay the scheduler should wait before the next advance.
    pub(crate) fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms.max(MIN_DELAY_MS))
    }

    fn invariants_hold(&self) -> bool {
        (!self.is_playing || !self.images.is_empty())
            && (self.last_error.is_none() || self.images.is_empty())
            && self.delay_ms >= MIN_DELAY_MS
    }
}

/// The single source of truth for playback.
///
/// Constructed once by the composition root and shared as `Arc<SlideshowState>`
/// with the background tasks and the HTTP layer.
#[derive(Debug, Default)]
pub struct SlideshowState {
    inner: Mutex<Inner>,
    changed: Condvar,
}

impl SlideshowState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the monitor. A poisoned lock is recovered: mutations never leave
    /// `Inner` half-updated before a panic point.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn changed(&self) -> &Condvar {
        &self.changed
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let mut inner = self.lock();
        let out = f(&mut inner);
        debug_assert!(inner.invariants_hold(), "slideshow invariants violated: {inner:?}");
        drop(inner);
        self.changed.notify_all();
        out
    }

    /// Install a freshly loaded image set.
    ///
    /// Keeps the play/stop status unless the new list is empty, rewinds to the
    /// first image, and only takes `delay_ms` when no client override is active.
    pub fn apply_config(&self, images: Vec<ImageDescriptor>, delay_ms: u64) {
        let count = images.len();
        self.mutate(|inner| {
            let was_playing = inner.is_playing;
            inner.images = Arc::from(images);
            inner.current_index = 0;
            if !inner.delay_override {
                inner.delay_ms = delay_ms.max(MIN_DELAY_MS);
            }
            inner.is_playing = was_playing && !inner.images.is_empty();
            inner.last_error = None;
        });
        info!(count, delay_ms, "slideshow configuration applied");
    }

    /// Record a configuration failure: clears the images and stops playback.
    pub fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(error = %message, "slideshow entering error state");
        self.mutate(|inner| {
            inner.images = Arc::from(Vec::new());
            inner.current_index = 0;
            inner.is_playing = false;
            inner.last_error = Some(message);
        });
    }

    /// Set a client delay that wins over the config file until the next call.
    ///
    /// # Errors
    /// [`Error::DelayTooShort`] if `delay_ms` is below [`MIN_DELAY_MS`].
    pub fn set_delay(&self, delay_ms: u64) -> Result<(), Error> {
        if delay_ms < MIN_DELAY_MS {
            return Err(Error::DelayTooShort);
        }
        self.mutate(|inner| {
            inner.delay_ms = delay_ms;
            inner.delay_override = true;
        });
        debug!(delay_ms, "delay overridden by client");
        Ok(())
    }

    /// # Errors
    /// [`Error::NoImagesLoaded`] if there is nothing to show.
    pub fn start(&self) -> Result<(), Error> {
        self.mutate(|inner| {
            if inner.images.is_empty() {
                return Err(Error::NoImagesLoaded);
            }
            inner.is_playing = true;
            Ok(())
        })?;
        debug!("playback started");
        Ok(())
    }

    pub fn stop(&self) {
        self.mutate(|inner| inner.is_playing = false);
        debug!("playback stopped");
    }

    /// Rewind to the first image without touching play/stop status.
    pub fn reset(&self) {
        self.mutate(|inner| inner.current_index = 0);
        debug!("playback reset");
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.lock())
    }

    /// Whether a client has overridden the configured delay.
    #[must_use]
    pub fn delay_overridden(&self) -> bool {
        self.lock().delay_override
    }

    /// File backing the image at `index`, if `name` still matches that slot.
    #[must_use]
    pub fn image_path(&self, index: usize, name: &str) -> Option<PathBuf> {
        let inner = self.lock();
        inner
            .images
            .get(index)
            .filter(|image| image.name == name)
            .map(|image| image.path.clone())
    }

    /// Ask blocked waiters to leave. Used once at shutdown.
    pub fn close(&self) {
        self.mutate(|inner| inner.closed = true);
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}
