use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::config::clamp_duration_secs;
use crate::models::error::RecorderError;
use crate::models::events::RecorderEvent;
use crate::models::state::{StopReason, WaitStart};
use crate::session::recording::{RecordingSession, TICK_INTERVAL};
use crate::traits::capture_provider::CaptureProvider;
use crate::traits::clock::{Clock, TimerHandle};

struct WaitState {
    waiting: bool,
    started_at: Duration,
    target_secs: f64,
    record_secs: f64,
    generation: u64,
    expiry: Option<TimerHandle>,
    display: Option<TimerHandle>,
}

struct WaitShared<P: CaptureProvider + 'static> {
    session: RecordingSession<P>,
    clock: Arc<dyn Clock>,
    state: Mutex<WaitState>,
}

/// Countdown that starts a recording when it runs out.
///
/// Once started the countdown cannot be cancelled. It holds the session's
/// wait gate, so every manual start (through this controller or straight on
/// the session) is refused until it expires.
pub struct WaitThenRecord<P: CaptureProvider + 'static> {
    shared: Arc<WaitShared<P>>,
}

impl<P: CaptureProvider + 'static> Clone for WaitThenRecord<P> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<P: CaptureProvider + 'static> WaitThenRecord<P> {
    pub fn new(session: RecordingSession<P>) -> Self {
        let record_secs = session.config().record_secs();
        let clock = session.clock();
        Self {
            shared: Arc::new(WaitShared {
                session,
                clock,
                state: Mutex::new(WaitState {
                    waiting: false,
                    started_at: Duration::ZERO,
                    target_secs: 0.0,
                    record_secs,
                    generation: 0,
                    expiry: None,
                    display: None,
                }),
            }),
        }
    }

    pub fn session(&self) -> &RecordingSession<P> {
        &self.shared.session
    }

    pub fn is_waiting(&self) -> bool {
        self.shared.session.is_waiting()
    }

    /// Recording length used when the countdown expires.
    pub fn record_secs(&self) -> f64 {
        self.shared.state.lock().record_secs
    }

    pub fn set_record_secs(&self, secs: f64) {
        let fallback = self.shared.session.config().record_secs();
        self.shared.state.lock().record_secs = clamp_duration_secs(secs, fallback);
    }

    /// `(elapsed, target)` of the running countdown.
    pub fn wait_progress(&self) -> Option<(f64, f64)> {
        let s = self.shared.state.lock();
        if !s.waiting {
            return None;
        }
        let elapsed = self.shared.clock.now().saturating_sub(s.started_at).as_secs_f64();
        Some((elapsed.min(s.target_secs), s.target_secs))
    }

    /// Begin a countdown of `wait_secs` (clamped to [1, 3600]).
    ///
    /// Any running recording is stopped first. A second call while waiting is
    /// ignored.
    pub fn start_wait(&self, wait_secs: f64) -> WaitStart {
        let shared = &self.shared;
        let target = clamp_duration_secs(wait_secs, shared.session.config().wait_secs());

        let generation = {
            let mut s = shared.state.lock();
            if s.waiting || !shared.session.arm_wait() {
                log::info!("countdown already running; ignoring start_wait");
                return WaitStart::AlreadyWaiting;
            }
            s.waiting = true;
            s.started_at = shared.clock.now();
            s.target_secs = target;
            s.generation += 1;
            s.generation
        };

        shared.session.stop(StopReason::PreWait);
        log::info!("countdown started: {:.1}s", target);
        shared.session.emit(RecorderEvent::WaitStarted { target_secs: target });

        let weak = Arc::downgrade(shared);
        let expiry = shared.clock.schedule(
            Duration::from_secs_f64(target),
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    Self::expire(&shared, generation);
                }
            }),
        );
        let display = Self::schedule_display(shared, generation);

        let mut s = shared.state.lock();
        if s.generation == generation && s.waiting {
            s.expiry = Some(expiry);
            s.display = Some(display);
        }
        WaitStart::Started { target_secs: target }
    }

    /// Start recording now unless a countdown is running.
    pub fn start_recording(&self, secs: f64) -> Result<(), RecorderError> {
        self.shared.session.start(secs)
    }

    fn expire(shared: &Arc<WaitShared<P>>, generation: u64) {
        let (target, record_secs) = {
            let mut s = shared.state.lock();
            if !s.waiting || s.generation != generation {
                return;
            }
            s.waiting = false;
            s.expiry = None;
            if let Some(display) = s.display.take() {
                display.cancel();
            }
            (s.target_secs, s.record_secs)
        };

        log::info!("countdown expired after {:.1}s; starting recording", target);
        shared.session.emit(RecorderEvent::WaitExpired { target_secs: target });
        if let Err(e) = shared.session.start_after_wait(record_secs) {
            log::warn!("automatic start failed: {}", e);
        }
    }

    fn schedule_display(shared: &Arc<WaitShared<P>>, generation: u64) -> TimerHandle {
        let weak: Weak<WaitShared<P>> = Arc::downgrade(shared);
        shared.clock.schedule(
            TICK_INTERVAL,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    Self::refresh_display(&shared, generation);
                }
            }),
        )
    }

    /// Cosmetic countdown refresh. The expiry timer alone decides when the
    /// recording starts.
    fn refresh_display(shared: &Arc<WaitShared<P>>, generation: u64) {
        let (elapsed, target) = {
            let s = shared.state.lock();
            if !s.waiting || s.generation != generation {
                return;
            }
            let elapsed = shared.clock.now().saturating_sub(s.started_at).as_secs_f64();
            (elapsed.min(s.target_secs), s.target_secs)
        };
        shared.session.emit(RecorderEvent::WaitProgress {
            elapsed_secs: elapsed,
            target_secs: target,
        });

        let next = Self::schedule_display(shared, generation);
        let mut s = shared.state.lock();
        if s.waiting && s.generation == generation {
            s.display = Some(next);
        } else {
            next.cancel();
        }
    }
}
