use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::models::audio_models::{AudioChunk, AudioSource};
use crate::models::config::{clamp_duration_secs, RecorderConfig};
use crate::models::error::RecorderError;
use crate::models::events::{RecorderEvent, RecordingProgress, StopSummary};
use crate::models::recording_result::EncodedAudio;
use crate::models::state::{RecordingState, StopReason};
use crate::processing::constraints::{build_capture_request, CAPTURE_CHANNELS, CAPTURE_SAMPLE_RATE};
use crate::processing::mp3_encoder::encode_mp3;
use crate::processing::pcm_buffer::PcmBuffer;
use crate::traits::capture_delegate::RecorderDelegate;
use crate::traits::capture_provider::{CaptureProvider, ChunkCallback};
use crate::traits::clock::{Clock, TimerHandle};
use crate::traits::frame_encoder::{EncoderParams, Mp3EncoderFactory};

/// Interval of the progress ticker that also watches the stop boundary.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Internal mutable session state, protected by `parking_lot::Mutex`.
struct SessionState {
    state: RecordingState,
    buffer: PcmBuffer,
    encoded: Option<EncodedAudio>,
    started_at: Option<Duration>,
    target_secs: f64,
    sample_rate: u32,
    attempt: u64,
    auto_stop: Option<TimerHandle>,
    ticker: Option<TimerHandle>,
    /// Set while a countdown owns the next start.
    waiting: bool,
}

impl SessionState {
    fn new() -> Self {
        Self {
            state: RecordingState::Idle,
            buffer: PcmBuffer::new(),
            encoded: None,
            started_at: None,
            target_secs: 0.0,
            sample_rate: CAPTURE_SAMPLE_RATE,
            attempt: 0,
            auto_stop: None,
            ticker: None,
            waiting: false,
        }
    }

    fn elapsed_secs(&self, now: Duration) -> f64 {
        let Some(start) = self.started_at else {
            return 0.0;
        };
        now.saturating_sub(start).as_secs_f64()
    }

    fn cancel_timers(&mut self) {
        if let Some(handle) = self.auto_stop.take() {
            handle.cancel();
        }
        if let Some(handle) = self.ticker.take() {
            handle.cancel();
        }
    }
}

/// State reachable from the capture callback. Never touches the device.
struct Core {
    state: Mutex<SessionState>,
    encode_gate: Mutex<()>,
    clock: Arc<dyn Clock>,
    encoder: Arc<dyn Mp3EncoderFactory>,
    delegate: RwLock<Option<Arc<dyn RecorderDelegate>>>,
    config: RecorderConfig,
}

impl Core {
    fn emit(&self, event: RecorderEvent) {
        let delegate = self.delegate.read().clone();
        if let Some(d) = delegate {
            d.on_event(&event);
        }
    }

    /// Chunk sink handed to the capture device.
    fn accept_chunk(&self, chunk: AudioChunk) {
        let progress = {
            let mut s = self.state.lock();
            if !s.state.is_recording() {
                return;
            }
            s.buffer.push(chunk);
            let elapsed = s.elapsed_secs(self.clock.now());
            let target = s.target_secs;
            s.state = RecordingState::Recording {
                elapsed_secs: elapsed,
                target_secs: target,
            };
            RecordingProgress {
                elapsed_secs: elapsed,
                target_secs: target,
            }
        };
        self.emit(RecorderEvent::Progress(progress));
    }
}

struct Shared<P> {
    device: Mutex<P>,
    core: Arc<Core>,
}

/// Bounded-duration microphone recording.
///
/// Owns the capture device, the PCM buffer of the current attempt and the
/// cached MP3 encoding of it. Cloning yields another handle to the same
/// session.
///
/// ```text
/// [CaptureProvider] → chunk callback → [PcmBuffer] → ensure_encoded() → [EncodedAudio]
///                                           ↑
///              auto-stop timer + 100 ms ticker (Clock) → stop()
/// ```
///
/// Lock order is device, then state. The capture callback only takes the
/// state lock, so stopping the device never waits on a chunk in flight.
/// Events are emitted with neither lock held.
pub struct RecordingSession<P: CaptureProvider + 'static> {
    shared: Arc<Shared<P>>,
}

impl<P: CaptureProvider + 'static> Clone for RecordingSession<P> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<P: CaptureProvider + 'static> RecordingSession<P> {
    pub fn new(
        provider: P,
        encoder: Arc<dyn Mp3EncoderFactory>,
        clock: Arc<dyn Clock>,
        config: RecorderConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                device: Mutex::new(provider),
                core: Arc::new(Core {
                    state: Mutex::new(SessionState::new()),
                    encode_gate: Mutex::new(()),
                    clock,
                    encoder,
                    delegate: RwLock::new(None),
                    config,
                }),
            }),
        }
    }

    pub fn set_delegate(&self, delegate: Arc<dyn RecorderDelegate>) {
        *self.shared.core.delegate.write() = Some(delegate);
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.shared.core.config
    }

    pub fn state(&self) -> RecordingState {
        self.shared.core.state.lock().state
    }

    /// Number of recordings started successfully so far.
    pub fn attempt(&self) -> u64 {
        self.shared.core.state.lock().attempt
    }

    /// Rate reported by the device for the current attempt.
    pub fn sample_rate(&self) -> u32 {
        self.shared.core.state.lock().sample_rate
    }

    pub fn sample_count(&self) -> usize {
        self.shared.core.state.lock().buffer.sample_count()
    }

    pub fn chunk_count(&self) -> usize {
        self.shared.core.state.lock().buffer.chunk_count()
    }

    pub fn cached_audio(&self) -> Option<EncodedAudio> {
        self.shared.core.state.lock().encoded.clone()
    }

    pub fn progress(&self) -> RecordingProgress {
        let core = &self.shared.core;
        let s = core.state.lock();
        let elapsed_secs = if s.state.is_recording() {
            s.elapsed_secs(core.clock.now())
        } else {
            s.state.elapsed().unwrap_or(0.0)
        };
        RecordingProgress {
            elapsed_secs,
            target_secs: s.target_secs,
        }
    }

    pub(crate) fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.shared.core.clock)
    }

    /// Publish on the session's event channel.
    pub(crate) fn emit(&self, event: RecorderEvent) {
        self.shared.core.emit(event);
    }

    /// True while a countdown holds the session; manual starts are refused.
    pub fn is_waiting(&self) -> bool {
        self.shared.core.state.lock().waiting
    }

    /// Claim the session for a countdown. False if one already holds it.
    pub(crate) fn arm_wait(&self) -> bool {
        let mut s = self.shared.core.state.lock();
        if s.waiting {
            return false;
        }
        s.waiting = true;
        true
    }

    pub fn is_available(&self) -> bool {
        self.shared.device.lock().is_available()
    }

    pub fn device_info(&self) -> AudioSource {
        self.shared.device.lock().device_info()
    }

    /// Start a recording of `target_secs` (clamped to [1, 3600]).
    ///
    /// Transitions: idle → starting → recording, or back to idle when the
    /// device cannot be opened. Refused with `WaitInProgress` while a
    /// countdown holds the session.
    pub fn start(&self, target_secs: f64) -> Result<(), RecorderError> {
        self.start_gated(target_secs, false)
    }

    /// Start handed over by an expired countdown. Releases the wait gate.
    pub(crate) fn start_after_wait(&self, target_secs: f64) -> Result<(), RecorderError> {
        self.start_gated(target_secs, true)
    }

    fn start_gated(&self, target_secs: f64, from_wait: bool) -> Result<(), RecorderError> {
        let core = &self.shared.core;
        let target = clamp_duration_secs(target_secs, core.config.record_secs());

        {
            let mut s = core.state.lock();
            if from_wait {
                s.waiting = false;
            } else if s.waiting {
                log::warn!("manual start refused while the countdown runs");
                return Err(RecorderError::WaitInProgress);
            }
            if !s.state.is_idle() {
                log::debug!("start ignored: session is {}", s.state.name());
                return Err(RecorderError::AlreadyRecording);
            }
            s.state = RecordingState::Starting;
            s.buffer.clear();
            s.encoded = None;
            s.started_at = None;
            s.target_secs = target;
        }
        core.emit(RecorderEvent::StateChanged(RecordingState::Starting));

        let request = build_capture_request(core.config.profile);
        let sink = Arc::clone(core);
        let on_chunk: ChunkCallback = Arc::new(move |chunk: AudioChunk| sink.accept_chunk(chunk));

        let mut device = self.shared.device.lock();
        let sample_rate = match device.start(&request, on_chunk) {
            Ok(rate) => rate,
            Err(e) => {
                core.state.lock().state = RecordingState::Idle;
                drop(device);
                log::warn!("capture device unavailable: {}", e);
                let err = RecorderError::CaptureUnavailable(e);
                core.emit(RecorderEvent::Error(err.clone()));
                core.emit(RecorderEvent::StateChanged(RecordingState::Idle));
                return Err(err);
            }
        };

        let recording = RecordingState::Recording {
            elapsed_secs: 0.0,
            target_secs: target,
        };
        let attempt = {
            let mut s = core.state.lock();
            if s.waiting {
                // A countdown began while the device was opening.
                s.state = RecordingState::Idle;
                None
            } else {
                s.state = recording;
                s.started_at = Some(core.clock.now());
                s.sample_rate = if sample_rate > 0 { sample_rate } else { CAPTURE_SAMPLE_RATE };
                s.attempt += 1;
                Some(s.attempt)
            }
        };
        let Some(attempt) = attempt else {
            let released = device.stop();
            drop(device);
            log::warn!("start abandoned: a countdown took the session");
            if let Err(e) = released {
                log::warn!("failed to release capture device: {}", e);
            }
            core.emit(RecorderEvent::StateChanged(RecordingState::Idle));
            return Err(RecorderError::WaitInProgress);
        };

        let weak = Arc::downgrade(&self.shared);
        let auto_stop = core.clock.schedule(
            Duration::from_secs_f64(target),
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    RecordingSession { shared }.stop(StopReason::Timer);
                }
            }),
        );
        let ticker = Self::schedule_tick(&self.shared, attempt);
        {
            let mut s = core.state.lock();
            s.auto_stop = Some(auto_stop);
            s.ticker = Some(ticker);
        }
        drop(device);

        log::info!(
            "recording attempt {} started: {:.1}s at {} Hz ({})",
            attempt,
            target,
            sample_rate,
            core.config.profile.as_str()
        );
        core.emit(RecorderEvent::StateChanged(recording));
        Ok(())
    }

    /// Stop the current recording. A no-op unless recording.
    ///
    /// Transitions: recording → stopping → idle. Emits a final progress
    /// notification, then `Stopped`, then the idle state.
    pub fn stop(&self, reason: StopReason) -> Option<StopSummary> {
        let core = &self.shared.core;
        let mut device = self.shared.device.lock();
        {
            let mut s = core.state.lock();
            if !s.state.is_recording() {
                log::debug!("stop({}) ignored: session is {}", reason, s.state.name());
                return None;
            }
            s.state = RecordingState::Stopping;
            s.cancel_timers();
        }
        let released = device.stop();

        let (progress, summary) = {
            let mut s = core.state.lock();
            let elapsed = s.elapsed_secs(core.clock.now());
            s.state = RecordingState::Idle;
            (
                RecordingProgress {
                    elapsed_secs: elapsed,
                    target_secs: s.target_secs,
                },
                StopSummary {
                    reason,
                    sample_count: s.buffer.sample_count(),
                    chunk_count: s.buffer.chunk_count(),
                    elapsed_secs: elapsed,
                },
            )
        };
        drop(device);

        core.emit(RecorderEvent::StateChanged(RecordingState::Stopping));
        if let Err(e) = released {
            log::warn!("failed to release capture device: {}", e);
            core.emit(RecorderEvent::Error(RecorderError::CaptureUnavailable(e)));
        }
        log::info!(
            "recording stopped ({}): {} samples in {} chunks, {:.2}s",
            reason,
            summary.sample_count,
            summary.chunk_count,
            summary.elapsed_secs
        );
        core.emit(RecorderEvent::Progress(progress));
        core.emit(RecorderEvent::Stopped(summary));
        core.emit(RecorderEvent::StateChanged(RecordingState::Idle));
        Some(summary)
    }

    /// Encode the last recording once and cache it until the next start.
    pub fn ensure_encoded(&self) -> Result<EncodedAudio, RecorderError> {
        let core = &self.shared.core;
        let _gate = core.encode_gate.lock();

        let (chunks, params, attempt) = {
            let s = core.state.lock();
            if !s.state.is_idle() {
                return Err(RecorderError::InvalidState(format!(
                    "cannot encode while {}",
                    s.state.name()
                )));
            }
            if let Some(ref cached) = s.encoded {
                return Ok(cached.clone());
            }
            if s.buffer.is_empty() {
                return Err(RecorderError::NoAudioCaptured);
            }
            let params = EncoderParams {
                sample_rate: s.sample_rate,
                bitrate_kbps: core.config.bitrate_kbps(),
                channels: CAPTURE_CHANNELS,
            };
            (s.buffer.chunks().to_vec(), params, s.attempt)
        };

        let encoded = match encode_mp3(&chunks, params, core.encoder.as_ref()) {
            Ok(encoded) => encoded,
            Err(e) => {
                log::error!("encoding attempt {} failed: {}", attempt, e);
                core.emit(RecorderEvent::Error(e.clone()));
                return Err(e);
            }
        };
        log::info!(
            "encoded attempt {}: {} bytes at {} kbps",
            attempt,
            encoded.len(),
            params.bitrate_kbps
        );

        let mut s = core.state.lock();
        if s.attempt == attempt && s.state.is_idle() {
            s.encoded = Some(encoded.clone());
        }
        Ok(encoded)
    }

    fn schedule_tick(shared: &Arc<Shared<P>>, attempt: u64) -> TimerHandle {
        let weak: Weak<Shared<P>> = Arc::downgrade(shared);
        shared.core.clock.schedule(
            TICK_INTERVAL,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    Self::tick(shared, attempt);
                }
            }),
        )
    }

    /// Refresh elapsed time and enforce the stop boundary.
    fn tick(shared: Arc<Shared<P>>, attempt: u64) {
        let core = &shared.core;
        let progress = {
            let mut s = core.state.lock();
            if s.attempt != attempt || !s.state.is_recording() {
                return;
            }
            let elapsed = s.elapsed_secs(core.clock.now());
            let target = s.target_secs;
            s.state = RecordingState::Recording {
                elapsed_secs: elapsed,
                target_secs: target,
            };
            RecordingProgress {
                elapsed_secs: elapsed,
                target_secs: target,
            }
        };

        if progress.elapsed_secs >= progress.target_secs {
            RecordingSession { shared }.stop(StopReason::AutoStop);
            return;
        }

        core.emit(RecorderEvent::Progress(progress));
        let next = Self::schedule_tick(&shared, attempt);
        let mut s = core.state.lock();
        if s.attempt == attempt && s.state.is_recording() {
            s.ticker = Some(next);
        } else {
            next.cancel();
        }
    }
}
