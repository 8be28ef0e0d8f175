//! Fakes shared by the unit tests: capture device, MP3 encoder, media
//! element, HTTP transport and an event log.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::models::audio_models::{AudioChunk, AudioSource, CaptureRequest};
use crate::models::events::{PlaybackEvent, RecorderEvent, StopSummary};
use crate::models::recording_result::EncodedAudio;
use crate::models::state::RecordingState;
use crate::traits::capture_delegate::{PlaybackDelegate, RecorderDelegate};
use crate::traits::capture_provider::{CaptureProvider, ChunkCallback};
use crate::traits::frame_encoder::{EncoderParams, Mp3EncoderFactory, Mp3FrameEncoder};
use crate::traits::media_backend::{MediaBackend, SourceHandle};
use crate::traits::upload_transport::{TransportResponse, UploadTransport};

// --- capture ---

#[derive(Default)]
struct ProbeState {
    callback: Option<ChunkCallback>,
    starts: usize,
    stops: usize,
    fail_next_start: Option<String>,
    teardown: Vec<String>,
    last_request: Option<CaptureRequest>,
    on_open: Option<Box<dyn FnOnce() + Send>>,
}

/// Test-side handle to a `FakeCapture`: pushes chunks and inspects calls.
#[derive(Clone, Default)]
pub struct CaptureProbe {
    state: Arc<Mutex<ProbeState>>,
}

impl CaptureProbe {
    /// Deliver a chunk through the registered callback. False when the
    /// device is closed.
    pub fn push(&self, samples: Vec<f32>) -> bool {
        let callback = self.state.lock().callback.clone();
        match callback {
            Some(cb) => {
                cb(AudioChunk::new(samples));
                true
            }
            None => false,
        }
    }

    pub fn fail_next_start(&self, message: &str) {
        self.state.lock().fail_next_start = Some(message.to_string());
    }

    /// Run `hook` inside the next `start`, before the device reports open.
    pub fn on_next_open(&self, hook: impl FnOnce() + Send + 'static) {
        self.state.lock().on_open = Some(Box::new(hook));
    }

    pub fn starts(&self) -> usize {
        self.state.lock().starts
    }

    pub fn stops(&self) -> usize {
        self.state.lock().stops
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().callback.is_some()
    }

    pub fn teardown(&self) -> Vec<String> {
        self.state.lock().teardown.clone()
    }

    pub fn last_request(&self) -> Option<CaptureRequest> {
        self.state.lock().last_request.clone()
    }
}

pub struct FakeCapture {
    probe: CaptureProbe,
    sample_rate: u32,
}

impl FakeCapture {
    pub fn new() -> (Self, CaptureProbe) {
        let probe = CaptureProbe::default();
        (
            Self {
                probe: probe.clone(),
                sample_rate: 48000,
            },
            probe,
        )
    }
}

impl CaptureProvider for FakeCapture {
    fn is_available(&self) -> bool {
        true
    }

    fn start(&mut self, request: &CaptureRequest, on_chunk: ChunkCallback) -> Result<u32, String> {
        let hook = self.probe.state.lock().on_open.take();
        if let Some(hook) = hook {
            hook();
        }
        let mut s = self.probe.state.lock();
        if let Some(message) = s.fail_next_start.take() {
            return Err(message);
        }
        if s.callback.is_some() {
            return Err("device already open".into());
        }
        s.starts += 1;
        s.callback = Some(on_chunk);
        s.last_request = Some(request.clone());
        Ok(self.sample_rate)
    }

    fn stop(&mut self) -> Result<(), String> {
        let mut s = self.probe.state.lock();
        if s.callback.take().is_none() {
            return Ok(());
        }
        s.stops += 1;
        let order: Vec<String> = s
            .last_request
            .as_ref()
            .map(|r| r.teardown_order().map(|stage| stage.name().to_string()).collect())
            .unwrap_or_default();
        s.teardown = order;
        Ok(())
    }

    fn device_info(&self) -> AudioSource {
        AudioSource {
            id: "fake-mic".into(),
            name: "Fake Microphone".into(),
            is_default: true,
        }
    }
}

// --- encoder ---

#[derive(Default)]
struct EncoderStats {
    created: usize,
    frames: Vec<usize>,
    last_frame: Vec<i16>,
    flushes: usize,
}

/// Deterministic stand-in for LAME: one 8-byte record per frame, 4-byte tail.
#[derive(Clone, Default)]
pub struct FakeEncoderFactory {
    stats: Arc<Mutex<EncoderStats>>,
    silent: bool,
}

impl FakeEncoderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// An encoder that never emits a byte.
    pub fn silent() -> Self {
        Self {
            silent: true,
            ..Self::default()
        }
    }

    pub fn created(&self) -> usize {
        self.stats.lock().created
    }

    pub fn frames_seen(&self) -> Vec<usize> {
        self.stats.lock().frames.clone()
    }

    pub fn last_frame(&self) -> Vec<i16> {
        self.stats.lock().last_frame.clone()
    }

    pub fn flushes(&self) -> usize {
        self.stats.lock().flushes
    }
}

struct FakeEncoder {
    stats: Arc<Mutex<EncoderStats>>,
    silent: bool,
}

impl Mp3FrameEncoder for FakeEncoder {
    fn encode_frame(&mut self, pcm: &[i16]) -> Result<Vec<u8>, String> {
        let mut s = self.stats.lock();
        s.frames.push(pcm.len());
        s.last_frame = pcm.to_vec();
        if self.silent {
            return Ok(Vec::new());
        }
        let sum: i64 = pcm.iter().map(|&v| v as i64).sum();
        let mut out = vec![0xFF, 0xFB, 0x90, 0x00];
        out.extend_from_slice(&(sum as i32).to_le_bytes());
        Ok(out)
    }

    fn flush(&mut self) -> Result<Vec<u8>, String> {
        self.stats.lock().flushes += 1;
        if self.silent {
            return Ok(Vec::new());
        }
        Ok(vec![0u8; 4])
    }
}

impl Mp3EncoderFactory for FakeEncoderFactory {
    fn create(&self, _params: &EncoderParams) -> Result<Box<dyn Mp3FrameEncoder>, String> {
        self.stats.lock().created += 1;
        Ok(Box::new(FakeEncoder {
            stats: Arc::clone(&self.stats),
            silent: self.silent,
        }))
    }
}

// --- events ---

/// Delegate that records every notification.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<RecorderEvent>>>,
}

impl EventLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<RecorderEvent> {
        self.events.lock().clone()
    }

    pub fn stopped(&self) -> Vec<StopSummary> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                RecorderEvent::Stopped(summary) => Some(*summary),
                _ => None,
            })
            .collect()
    }

    pub fn states(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                RecorderEvent::StateChanged(state) => Some(state.name()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&RecorderEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl RecorderDelegate for EventLog {
    fn on_event(&self, event: &RecorderEvent) {
        self.events.lock().push(event.clone());
    }
}

pub fn is_state(event: &RecorderEvent, state: RecordingState) -> bool {
    matches!(event, RecorderEvent::StateChanged(s) if s.name() == state.name())
}

#[derive(Clone, Default)]
pub struct PlaybackLog {
    events: Arc<Mutex<Vec<PlaybackEvent>>>,
}

impl PlaybackLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<PlaybackEvent> {
        self.events.lock().clone()
    }
}

impl PlaybackDelegate for PlaybackLog {
    fn on_event(&self, event: &PlaybackEvent) {
        self.events.lock().push(*event);
    }
}

// --- media ---

#[derive(Default)]
struct MediaState {
    next_id: usize,
    live: Vec<SourceHandle>,
    revoked: Vec<SourceHandle>,
    loaded: Option<SourceHandle>,
    current: f64,
    duration: f64,
    playing: bool,
    ended: bool,
    refuse_play: bool,
}

/// Test-side handle to a `FakeMedia` element.
#[derive(Clone, Default)]
pub struct MediaProbe {
    state: Arc<Mutex<MediaState>>,
}

impl MediaProbe {
    pub fn live_handles(&self) -> Vec<SourceHandle> {
        self.state.lock().live.clone()
    }

    pub fn revoked(&self) -> Vec<SourceHandle> {
        self.state.lock().revoked.clone()
    }

    pub fn loaded(&self) -> Option<SourceHandle> {
        self.state.lock().loaded.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    pub fn refuse_play(&self, refuse: bool) {
        self.state.lock().refuse_play = refuse;
    }

    /// Simulate playback progressing; reaching the duration ends playback.
    pub fn play_to(&self, secs: f64) {
        let mut s = self.state.lock();
        s.current = secs.min(s.duration);
        if s.current >= s.duration {
            s.ended = true;
            s.playing = false;
        }
    }
}

pub struct FakeMedia {
    probe: MediaProbe,
}

impl FakeMedia {
    pub fn new() -> (Self, MediaProbe) {
        let probe = MediaProbe::default();
        (Self { probe: probe.clone() }, probe)
    }
}

impl MediaBackend for FakeMedia {
    fn create_source(&mut self, audio: &EncodedAudio) -> Result<SourceHandle, String> {
        if audio.is_empty() {
            return Err("empty blob".into());
        }
        let mut s = self.probe.state.lock();
        s.next_id += 1;
        let handle = SourceHandle(format!("blob:{}", s.next_id));
        s.live.push(handle.clone());
        Ok(handle)
    }

    fn revoke_source(&mut self, handle: &SourceHandle) {
        let mut s = self.probe.state.lock();
        s.live.retain(|h| h != handle);
        s.revoked.push(handle.clone());
    }

    fn load(&mut self, handle: &SourceHandle) -> Result<f64, String> {
        let mut s = self.probe.state.lock();
        if !s.live.contains(handle) {
            return Err(format!("unknown source {}", handle.0));
        }
        s.loaded = Some(handle.clone());
        s.current = 0.0;
        s.duration = 3.0;
        s.ended = false;
        Ok(s.duration)
    }

    fn clear(&mut self) {
        let mut s = self.probe.state.lock();
        s.loaded = None;
        s.playing = false;
        s.current = 0.0;
        s.duration = 0.0;
    }

    fn play(&mut self) -> Result<(), String> {
        let mut s = self.probe.state.lock();
        if s.refuse_play {
            return Err("play() blocked by autoplay policy".into());
        }
        if s.loaded.is_none() {
            return Err("no source".into());
        }
        if s.ended {
            s.ended = false;
            s.current = 0.0;
        }
        s.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.probe.state.lock().playing = false;
    }

    fn set_current_time(&mut self, secs: f64) {
        let mut s = self.probe.state.lock();
        s.current = secs;
        s.ended = false;
    }

    fn current_time(&self) -> f64 {
        self.probe.state.lock().current
    }

    fn duration(&self) -> f64 {
        self.probe.state.lock().duration
    }

    fn is_ended(&self) -> bool {
        self.probe.state.lock().ended
    }
}

// --- transport ---

#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    PostJson { url: String, body: serde_json::Value },
    Put { url: String, content_type: String, size: usize },
}

#[derive(Default)]
struct TransportState {
    post_responses: VecDeque<Result<TransportResponse, String>>,
    put_responses: VecDeque<Result<TransportResponse, String>>,
    calls: Vec<TransportCall>,
}

/// Scripted HTTP client. Unscripted requests answer `200 {}`.
#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<TransportState>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_post(&self, status: u16, body: &str) {
        self.state.lock().post_responses.push_back(Ok(TransportResponse {
            status,
            body: body.as_bytes().to_vec(),
        }));
    }

    pub fn fail_post(&self, message: &str) {
        self.state.lock().post_responses.push_back(Err(message.to_string()));
    }

    pub fn respond_put(&self, status: u16) {
        self.state.lock().put_responses.push_back(Ok(TransportResponse {
            status,
            body: Vec::new(),
        }));
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.state.lock().calls.clone()
    }

    /// Script a successful sign round-trip followed by a 200 PUT.
    pub fn script_presigned_success(&self, url: &str, key: &str) {
        self.respond_post(
            200,
            &serde_json::json!({"presignUrl": url, "presignKey": key}).to_string(),
        );
        self.respond_put(200);
    }
}

fn ok_empty() -> Result<TransportResponse, String> {
    Ok(TransportResponse {
        status: 200,
        body: b"{}".to_vec(),
    })
}

#[async_trait]
impl UploadTransport for FakeTransport {
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<TransportResponse, String> {
        let mut s = self.state.lock();
        s.calls.push(TransportCall::PostJson {
            url: url.to_string(),
            body: body.clone(),
        });
        s.post_responses.pop_front().unwrap_or_else(ok_empty)
    }

    async fn put_bytes(&self, url: &str, content_type: &str, body: Vec<u8>) -> Result<TransportResponse, String> {
        let mut s = self.state.lock();
        s.calls.push(TransportCall::Put {
            url: url.to_string(),
            content_type: content_type.to_string(),
            size: body.len(),
        });
        s.put_responses.pop_front().unwrap_or_else(ok_empty)
    }
}
