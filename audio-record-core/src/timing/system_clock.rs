use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

use super::queue::TimerQueue;
use crate::models::error::RecorderError;
use crate::traits::clock::{Clock, TimerHandle, TimerTask};

struct SchedulerState {
    queue: TimerQueue,
    shutdown: bool,
}

struct Scheduler {
    origin: Instant,
    state: Mutex<SchedulerState>,
    wakeup: Condvar,
}

/// Real monotonic time. Timers run on one dedicated `recorder-timers` thread.
///
/// Tasks should be short; a slow task delays every timer behind it.
pub struct SystemClock {
    scheduler: Arc<Scheduler>,
    worker: Option<thread::JoinHandle<()>>,
}

impl SystemClock {
    pub fn new() -> Result<Self, RecorderError> {
        let scheduler = Arc::new(Scheduler {
            origin: Instant::now(),
            state: Mutex::new(SchedulerState {
                queue: TimerQueue::default(),
                shutdown: false,
            }),
            wakeup: Condvar::new(),
        });

        let worker_scheduler = Arc::clone(&scheduler);
        let worker = thread::Builder::new()
            .name("recorder-timers".into())
            .spawn(move || run_scheduler(&worker_scheduler))
            .map_err(|e| RecorderError::ConfigurationFailed(format!("failed to spawn timer thread: {}", e)))?;

        Ok(Self {
            scheduler,
            worker: Some(worker),
        })
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.scheduler.origin.elapsed()
    }

    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let due = self.now() + delay;
        let handle = self.scheduler.state.lock().queue.push(due, task);
        self.scheduler.wakeup.notify_one();
        handle
    }
}

impl Drop for SystemClock {
    fn drop(&mut self) {
        {
            let mut s = self.scheduler.state.lock();
            s.shutdown = true;
            s.queue.clear();
        }
        self.scheduler.wakeup.notify_all();
        if let Some(handle) = self.worker.take() {
            // A task holding the last reference to this clock would be
            // joining itself.
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

fn run_scheduler(scheduler: &Scheduler) {
    let mut guard = scheduler.state.lock();
    while !guard.shutdown {
        let now = scheduler.origin.elapsed();
        if let Some(pending) = guard.queue.pop_due(now) {
            MutexGuard::unlocked(&mut guard, || (pending.task)());
            continue;
        }
        match guard.queue.next_due() {
            Some(due) => {
                let deadline = scheduler.origin + due;
                scheduler.wakeup.wait_until(&mut guard, deadline);
            }
            None => scheduler.wakeup.wait(&mut guard),
        }
    }
    log::debug!("Timer thread exiting");
}
