//! Keep one failed iteration of a background loop from ending the loop.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::error;

/// Run a single loop iteration. A panic is logged and reported as `None`.
///
/// Shared state stays usable afterwards: the slideshow lock recovers from
/// poisoning and every mutation re-establishes its invariants before unlocking.
pub(crate) fn contained<T>(task: &'static str, tick: impl FnOnce() -> T) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(tick)) {
        Ok(out) => Some(out),
        Err(payload) => {
            error!(task, reason = panic_message(&*payload), "iteration panicked; continuing");
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
