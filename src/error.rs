use std::path::PathBuf;

use thiserror::Error;

use crate::config::MIN_DELAY_MS;

/// Library error type for slideshow operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration file does not exist.
    #[error("config file not found at {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// The configuration file could not be parsed or a field is invalid.
    #[error("{0}")]
    ConfigMalformed(String),

    /// The configured folder is missing or not a directory.
    #[error("folder_path must be a directory: {}", .0.display())]
    DirectoryInvalid(PathBuf),

    /// The folder exists but holds no recognised image files.
    #[error("no image files found in {}", .0.display())]
    NoImagesFound(PathBuf),

    /// Client-supplied delay is not an integer.
    #[error("delay_ms must be an integer")]
    DelayNotInteger,

    /// Client-supplied delay is below the floor.
    #[error("delay_ms must be at least {}", MIN_DELAY_MS)]
    DelayTooShort,

    /// Playback was requested while no images are loaded.
    #[error("no images loaded")]
    NoImagesLoaded,

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
