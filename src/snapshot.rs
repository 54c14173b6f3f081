//! Point-in-time views of the slideshow for clients.

use serde::Serialize;

use crate::scan::ImageDescriptor;
use crate::state::Inner;

/// Consistent copy of the slideshow state, taken under a single lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub images_count: usize,
    pub current_index: usize,
    pub delay_ms: u64,
    pub is_playing: bool,
    pub current_image: Option<CurrentImage>,
    pub status: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentImage {
    pub index: usize,
    pub total: usize,
    pub name: String,
    pub url: String,
}

impl Snapshot {
    /// Copy everything a client needs out of `inner`. Caller holds the lock.
    pub(crate) fn capture(inner: &Inner) -> Self {
        let images = &inner.images;
        let total = images.len();
        let current_image = (total > 0).then(|| {
            let index = inner.current_index % total;
            let image = &images[index];
            CurrentImage {
                index,
                total,
                name: image.name.clone(),
                url: image.url.clone(),
            }
        });
        Self {
            images_count: total,
            current_index: inner.current_index,
            delay_ms: inner.delay_ms,
            is_playing: inner.is_playing,
            current_image,
            status: status_text(
                images,
                inner.current_index,
                inner.is_playing,
                inner.last_error.as_deref(),
            ),
            error: inner.last_error.clone(),
        }
    }
}

/// Human readable one-line status.
#[must_use]
pub fn status_text(
    images: &[ImageDescriptor],
    current_index: usize,
    is_playing: bool,
    last_error: Option<&str>,
) -> String {
    if images.is_empty() {
        return match last_error {
            Some(err) if !err.is_empty() => format!("Config error: {err}"),
            _ => "No images loaded.".to_string(),
        };
    }
    let index = current_index % images.len();
    let name = &images[index].name;
    if is_playing {
        format!("Playing: {} of {} ({name})", index + 1, images.len())
    } else {
        format!("Stopped at {} of {} ({name})", index + 1, images.len())
    }
}
