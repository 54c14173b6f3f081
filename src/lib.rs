pub mod config;
pub mod error;
pub mod logging;
pub mod reload;
pub mod scan;
pub mod snapshot;
pub mod state;
pub mod web;
pub mod tasks {
    pub mod advance;
    pub mod config_watch;
    pub(crate) mod tick;
}

pub use error::Error;
pub use state::SlideshowState;
