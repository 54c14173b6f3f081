//! Config file → image list → shared state.

use std::path::Path;

use tracing::{info, instrument};

use crate::config::SlideshowConfig;
use crate::error::Error;
use crate::scan;
use crate::state::SlideshowState;

/// Load the config at `config_path`, scan its folder and install the result.
///
/// Any failure is recorded in `state` as the current error (which empties the
/// image list and stops playback); it is also returned for the caller's logs.
#[instrument(skip(state), fields(config = %config_path.display()))]
pub fn apply_config(state: &SlideshowState, config_path: &Path) -> Result<usize, Error> {
    match load(config_path) {
        Ok((cfg, images)) => {
            let count = images.len();
            info!(folder = %cfg.folder_path.display(), count, "loaded slideshow images");
            state.apply_config(images, cfg.delay_ms);
            Ok(count)
        }
        Err(err) => {
            state.set_error(err.to_string());
            Err(err)
        }
    }
}

fn load(config_path: &Path) -> Result<(SlideshowConfig, Vec<scan::ImageDescriptor>), Error> {
    let cfg = SlideshowConfig::load(config_path)?;
    let images = scan::list_images(&cfg.folder_path)?;
    Ok((cfg, images))
}
