use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Work scheduled on a clock.
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// Monotonic time source with one-shot timers.
///
/// Implemented by `SystemClock` (real time, one scheduler thread) and
/// `ManualClock` (simulated time advanced by hand).
pub trait Clock: Send + Sync {
    /// Time since the clock's origin. Never goes backwards.
    fn now(&self) -> Duration;

    /// Run `task` once, `delay` from now, unless the handle is cancelled first.
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle;
}

/// Cancellation handle for a scheduled task.
#[derive(Debug, Clone, Default)]
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
}

impl TimerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
