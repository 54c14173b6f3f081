//! Poll the configuration file and reload the slideshow when it changes.
//!
//! Change detection is a modification-time poll. A `notify` watcher on the
//! config's directory only shortens the latency; if it cannot be set up the
//! poll carries on alone.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::Result;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher, recommended_watcher};
use tokio::select;
use tokio::sync::mpsc::{self, Sender};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::Error;
use crate::reload;
use crate::state::SlideshowState;
use crate::tasks::tick;

/// Default gap between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// What a single poll did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// File present with the modification time seen last time.
    Unchanged,
    /// File new or modified; the config was re-applied.
    Reloaded,
    /// File vanished since the last poll; the error was recorded.
    Disappeared,
    /// File still absent; nothing recorded again.
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Seen {
    Unknown,
    Tracking(SystemTime),
}

pub struct ConfigWatcher {
    path: PathBuf,
    state: Arc<SlideshowState>,
    poll_interval: Duration,
    seen: Seen,
}

impl ConfigWatcher {
    pub fn new(path: PathBuf, state: Arc<SlideshowState>, poll_interval: Duration) -> Self {
        Self {
            path,
            state,
            poll_interval,
            seen: Seen::Unknown,
        }
    }

    /// Startup load: apply the config unconditionally and remember its mtime so
    /// the first tick does not load it a second time.
    pub fn prime(&mut self) -> Result<usize, Error> {
        let mtime = modified(&self.path).ok();
        let applied = reload::apply_config(&self.state, &self.path);
        self.seen = mtime.map_or(Seen::Unknown, Seen::Tracking);
        applied
    }

    /// Check the config file once and react to any change.
    pub fn poll_once(&mut self) -> PollOutcome {
        match modified(&self.path) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                if self.seen == Seen::Unknown {
                    return PollOutcome::Missing;
                }
                self.seen = Seen::Unknown;
                info!(config = %self.path.display(), "config file disappeared");
                self.state
                    .set_error(Error::ConfigNotFound(self.path.clone()).to_string());
                PollOutcome::Disappeared
            }
            Err(err) => {
                warn!(config = %self.path.display(), error = %err, "failed to stat config file");
                PollOutcome::Unchanged
            }
            Ok(mtime) if self.seen == Seen::Tracking(mtime) => PollOutcome::Unchanged,
            Ok(mtime) => {
                self.seen = Seen::Tracking(mtime);
                info!(config = %self.path.display(), "config file changed; reloading");
                if let Err(err) = reload::apply_config(&self.state, &self.path) {
                    debug!(error = %err, "reload recorded an error");
                }
                PollOutcome::Reloaded
            }
        }
    }

    /// Poll until `cancel` fires. A poll that panics is logged and skipped.
    #[instrument(skip_all, fields(config = %self.path.display()))]
    pub async fn run(mut self, cancel: CancellationToken) -> Result<()> {
        let (nudge_tx, mut nudge_rx) = mpsc::channel::<()>(1);
        let _watcher = match fs_watcher(&self.path, nudge_tx) {
            Ok(watcher) => Some(watcher),
            Err(err) => {
                warn!(error = %err, "filesystem notifications unavailable; polling only");
                None
            }
        };

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval = ?self.poll_interval, "config watcher started");

        loop {
            select! {
                _ = cancel.cancelled() => {
                    info!("cancel received; exiting config watcher");
                    break;
                }
                _ = ticker.tick() => {}
                Some(()) = nudge_rx.recv() => {
                    debug!("config change notification");
                }
            }
            let Some(outcome) = tick::contained("config watch", || self.poll_once()) else {
                continue;
            };
            if outcome != PollOutcome::Unchanged {
                debug!(?outcome, "config poll");
            }
        }
        Ok(())
    }
}

fn modified(path: &Path) -> io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

/// Watch the config's directory and nudge the poll loop on events touching it.
fn fs_watcher(path: &Path, nudge: Sender<()>) -> notify::Result<RecommendedWatcher> {
    let file_name: Option<OsString> = path.file_name().map(|n| n.to_os_string());
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut watcher = recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            let touches_config = event
                .paths
                .iter()
                .any(|p| p.file_name() == file_name.as_deref());
            if touches_config {
                // A full channel already holds a pending nudge.
                let _ = nudge.try_send(());
            }
        }
        Err(err) => warn!("config watch error: {err}"),
    })?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}
