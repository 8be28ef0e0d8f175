use std::time::Duration;

use parking_lot::Mutex;

use super::queue::TimerQueue;
use crate::traits::clock::{Clock, TimerHandle, TimerTask};

struct ManualState {
    now: Duration,
    queue: TimerQueue,
}

/// Simulated time. Nothing happens until [`ManualClock::advance`] is called.
///
/// Tasks run on the thread calling `advance`, in due order. Tasks scheduled
/// by a running task fire in the same `advance` call if they fall due inside
/// the window.
pub struct ManualClock {
    state: Mutex<ManualState>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ManualState {
                now: Duration::ZERO,
                queue: TimerQueue::default(),
            }),
        }
    }

    /// Move time forward by `by`, firing every task that falls due.
    pub fn advance(&self, by: Duration) {
        let target = self.state.lock().now + by;
        loop {
            let next = {
                let mut s = self.state.lock();
                let next = s.queue.pop_due(target);
                if let Some(ref pending) = next {
                    s.now = s.now.max(pending.due);
                }
                next
            };
            match next {
                // Lock released: the task may schedule more work.
                Some(pending) => (pending.task)(),
                None => break,
            }
        }
        let mut s = self.state.lock();
        s.now = s.now.max(target);
    }

    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }

    /// Number of live scheduled tasks.
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.state.lock().now
    }

    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let mut s = self.state.lock();
        let due = s.now + delay;
        s.queue.push(due, task)
    }
}
