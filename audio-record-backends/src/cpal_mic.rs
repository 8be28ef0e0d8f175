//! Microphone capture provider on top of `cpal`.
//!
//! The stream is built and owned by a dedicated thread (cpal streams are not
//! `Send` on every host). Each device block is downmixed to mono, run through
//! the requested processing stages and delivered as an `AudioChunk`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Host, Sample, SampleFormat, SizedSample, Stream, StreamConfig, SupportedStreamConfig};
use parking_lot::Mutex;

use audio_record_core::models::audio_models::{AudioChunk, AudioSource, CaptureConstraints, CaptureRequest};
use audio_record_core::models::error::RecorderError;
use audio_record_core::processing::stage_chain::StageChain;
use audio_record_core::traits::capture_provider::{CaptureProvider, ChunkCallback};

/// How long `start` waits for the capture thread to open the device.
const OPEN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct CpalMicCapture {
    device_name: Option<String>,
    running: Arc<AtomicBool>,
    capture_handle: Mutex<Option<thread::JoinHandle<()>>>,
    /// Stage names of the running capture, in connection order.
    stages: Vec<String>,
}

impl CpalMicCapture {
    /// Capture from the host's default input device.
    pub fn default_device() -> Self {
        Self::build(None)
    }

    /// Capture from the input device called `name`.
    pub fn with_device(name: String) -> Self {
        Self::build(Some(name))
    }

    fn build(device_name: Option<String>) -> Self {
        Self {
            device_name,
            running: Arc::new(AtomicBool::new(false)),
            capture_handle: Mutex::new(None),
            stages: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn join_capture_thread(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.capture_handle.lock().take() {
            if handle.join().is_err() {
                log::error!("microphone capture thread panicked");
            }
        }
    }
}

impl CaptureProvider for CpalMicCapture {
    fn is_available(&self) -> bool {
        let host = cpal::default_host();
        find_input_device(&host, self.device_name.as_deref()).is_ok()
    }

    fn start(&mut self, request: &CaptureRequest, on_chunk: ChunkCallback) -> Result<u32, String> {
        if self.running.load(Ordering::SeqCst) {
            return Err("microphone capture already running".into());
        }

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let device_name = self.device_name.clone();
        let thread_request = request.clone();
        let (ready_tx, ready_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("cpal-mic-capture".into())
            .spawn(move || capture_loop(running, device_name, thread_request, on_chunk, ready_tx))
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                format!("failed to spawn capture thread: {}", e)
            })?;
        *self.capture_handle.lock() = Some(handle);

        let opened = match ready_rx.recv_timeout(OPEN_TIMEOUT) {
            Ok(result) => result,
            Err(_) => Err("timed out opening the microphone".to_string()),
        };
        match opened {
            Ok(sample_rate) => {
                self.stages = request.stages.iter().map(|s| s.name().to_string()).collect();
                log::info!(
                    "microphone open at {} Hz, stages: {}",
                    sample_rate,
                    self.stages.join(" → ")
                );
                Ok(sample_rate)
            }
            Err(e) => {
                self.join_capture_thread();
                Err(e)
            }
        }
    }

    fn stop(&mut self) -> Result<(), String> {
        if self.capture_handle.lock().is_none() {
            return Ok(());
        }
        self.join_capture_thread();
        for stage in self.stages.iter().rev() {
            log::debug!("released stage {}", stage);
        }
        self.stages.clear();
        log::info!("microphone closed");
        Ok(())
    }

    fn device_info(&self) -> AudioSource {
        AudioSource {
            id: self.device_name.clone().unwrap_or_else(|| "default-mic".into()),
            name: self.device_name.clone().unwrap_or_else(|| "Default Microphone".into()),
            is_default: self.device_name.is_none(),
        }
    }
}

impl Drop for CpalMicCapture {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Active input devices on the default host.
pub fn list_input_devices() -> Result<Vec<AudioSource>, RecorderError> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());
    let devices = host
        .input_devices()
        .map_err(|e| RecorderError::CaptureUnavailable(format!("failed to list input devices: {}", e)))?;

    Ok(devices
        .filter_map(|device| device.name().ok())
        .map(|name| AudioSource {
            id: name.clone(),
            is_default: default_name.as_deref() == Some(name.as_str()),
            name,
        })
        .collect())
}

/// Runs on the capture thread: opens the stream, reports the outcome, then
/// keeps the stream alive until `running` clears.
fn capture_loop(
    running: Arc<AtomicBool>,
    device_name: Option<String>,
    request: CaptureRequest,
    on_chunk: ChunkCallback,
    ready: mpsc::Sender<Result<u32, String>>,
) {
    let stream = match open_stream(device_name.as_deref(), &request, on_chunk) {
        Ok((stream, sample_rate)) => {
            let _ = ready.send(Ok(sample_rate));
            stream
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(10));
    }

    if let Err(e) = stream.pause() {
        log::warn!("failed to pause microphone stream: {}", e);
    }
    drop(stream);
}

fn find_input_device(host: &Host, name: Option<&str>) -> Result<Device, String> {
    match name {
        None => host
            .default_input_device()
            .ok_or_else(|| "no default input device".to_string()),
        Some(name) => host
            .input_devices()
            .map_err(|e| format!("failed to list input devices: {}", e))?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| format!("input device {:?} not found", name)),
    }
}

/// Prefer a config that supports the requested rate, closest in channel count.
fn pick_config(device: &Device, constraints: &CaptureConstraints) -> Result<SupportedStreamConfig, String> {
    let wanted = constraints.sample_rate;
    if let Ok(ranges) = device.supported_input_configs() {
        let mut matching: Vec<_> = ranges
            .filter(|r| r.min_sample_rate().0 <= wanted && wanted <= r.max_sample_rate().0)
            .collect();
        matching.sort_by_key(|r| r.channels().abs_diff(constraints.channel_count));
        if let Some(range) = matching.into_iter().next() {
            return Ok(range.with_sample_rate(cpal::SampleRate(wanted)));
        }
    }
    log::warn!("{} Hz not supported by the device; using its default config", wanted);
    device
        .default_input_config()
        .map_err(|e| format!("no usable input config: {}", e))
}

fn open_stream(
    device_name: Option<&str>,
    request: &CaptureRequest,
    on_chunk: ChunkCallback,
) -> Result<(Stream, u32), String> {
    let host = cpal::default_host();
    let device = find_input_device(&host, device_name)?;
    let supported = pick_config(&device, &request.constraints)?;
    let sample_format = supported.sample_format();
    let config: StreamConfig = supported.into();
    let sample_rate = config.sample_rate.0;
    let channels = config.channels as usize;

    // Host-level echo cancellation and noise suppression are not reachable
    // through cpal; the constraints only select the stream config here.
    log::debug!(
        "opening {} ({} ch, {:?}), noise suppression requested: {}",
        device.name().unwrap_or_else(|_| "unknown".into()),
        channels,
        sample_format,
        request.constraints.noise_suppression
    );

    let mut chain = StageChain::new(&request.stages, sample_rate);
    let deliver = move |mut mono: Vec<f32>| {
        chain.process(&mut mono);
        on_chunk(AudioChunk::new(mono));
    };

    let stream = match sample_format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, channels, deliver),
        SampleFormat::I16 => build_stream::<i16>(&device, &config, channels, deliver),
        SampleFormat::U16 => build_stream::<u16>(&device, &config, channels, deliver),
        SampleFormat::I32 => build_stream::<i32>(&device, &config, channels, deliver),
        other => return Err(format!("unsupported sample format {:?}", other)),
    }?;

    stream
        .play()
        .map_err(|e| format!("failed to start microphone stream: {}", e))?;
    Ok((stream, sample_rate))
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    channels: usize,
    mut deliver: impl FnMut(Vec<f32>) + Send + 'static,
) -> Result<Stream, String>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| deliver(downmix(data, channels)),
            |err| log::error!("microphone stream error: {}", err),
            None,
        )
        .map_err(|e| format!("failed to build input stream: {}", e))
}

/// Average interleaved frames down to one channel, as f32.
fn downmix<T>(data: &[T], channels: usize) -> Vec<f32>
where
    T: Sample,
    f32: FromSample<T>,
{
    if channels <= 1 {
        return data.iter().map(|&s| f32::from_sample(s)).collect();
    }
    data.chunks(channels)
        .map(|frame| frame.iter().map(|&s| f32::from_sample(s)).sum::<f32>() / frame.len() as f32)
        .collect()
}
