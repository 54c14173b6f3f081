//! Directory scanning for slideshow images.

use std::io;
use std::path::{Path, PathBuf};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::Error;

/// Extensions (lowercase, without dot) treated as images.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "apng", "avif", "bmp", "gif", "jpeg", "jpg", "png", "tif", "tiff", "webp",
];

const SAFE_PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// One image in the slideshow, addressed by its position in the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub name: String,
    pub path: PathBuf,
    /// `/images/{position}/{encoded name}`
    pub url: String,
}

impl ImageDescriptor {
    fn new(position: usize, path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let url = format!(
            "/images/{position}/{}",
            utf8_percent_encode(&name, SAFE_PATH_SEGMENT)
        );
        Self { name, path, url }
    }
}

/// Return `true` if `path` has an allowed image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
}

/// List the images directly inside `dir`, sorted by file name.
///
/// # Errors
/// Returns [`Error::DirectoryInvalid`] if `dir` is not a directory,
/// [`Error::Io`] if the directory itself cannot be read and
/// [`Error::NoImagesFound`] if nothing in it qualifies. Unreadable individual
/// entries (dangling links, say) are skipped.
pub fn list_images(dir: &Path) -> Result<Vec<ImageDescriptor>, Error> {
    if !dir.is_dir() {
        return Err(Error::DirectoryInvalid(dir.to_path_buf()));
    }

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();
    let mut images = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                let err = err.into_io_error().unwrap_or_else(|| {
                    io::Error::other(format!("cannot read {}", dir.display()))
                });
                return Err(Error::Io(err));
            }
            Err(err) => {
                debug!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() && is_supported_image(entry.path()) {
            images.push(ImageDescriptor::new(images.len(), entry.into_path()));
        }
    }

    if images.is_empty() {
        return Err(Error::NoImagesFound(dir.to_path_buf()));
    }
    Ok(images)
}
