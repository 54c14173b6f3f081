//! Timer-driven slide advance.
//!
//! Runs on a dedicated blocking thread. While stopped it parks on the state's
//! condition variable; while playing it waits out the current delay with the
//! lock released and then steps the index. A stop, reset or reload that lands
//! mid-delay is seen when the wait ends.

use std::ops::ControlFlow;

use tracing::{debug, info, instrument};

use crate::state::SlideshowState;
use crate::tasks::tick;

/// Drive the slideshow until [`SlideshowState::close`] is called.
///
/// A panic inside one cycle is logged and the next cycle starts from the
/// state as it stands.
#[instrument(skip_all)]
pub fn run(state: &SlideshowState) {
    info!("advance scheduler started");
    loop {
        if let Some(ControlFlow::Break(())) = tick::contained("advance", || cycle(state)) {
            break;
        }
    }
    info!("advance scheduler stopped");
}

/// One idle-wait, delay-wait, advance cycle. Breaks once the state is closed.
fn cycle(state: &SlideshowState) -> ControlFlow<()> {
    // Idle: block until playback starts or we are asked to leave.
    let delay = {
        let guard = state.lock();
        let guard = state
            .changed()
            .wait_while(guard, |inner| !inner.is_playing && !inner.closed)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if guard.closed {
            return ControlFlow::Break(());
        }
        guard.delay()
    };

    // Running: the lock is released for the whole wait. Only shutdown cuts it short.
    let guard = state.lock();
    let (mut guard, _) = state
        .changed()
        .wait_timeout_while(guard, delay, |inner| !inner.closed)
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if guard.closed {
        return ControlFlow::Break(());
    }
    if guard.is_playing {
        guard.advance();
        debug!(
            index = guard.current_index,
            playing = guard.is_playing,
            "advanced"
        );
        drop(guard);
        state.changed().notify_all();
    }
    ControlFlow::Continue(())
}
