use std::sync::Arc;

use crate::models::audio_models::{AudioChunk, AudioSource, CaptureRequest};

/// Callback invoked once per processing quantum with a block of mono samples.
///
/// Deliveries are strictly ordered; the provider must not invoke it
/// concurrently with itself.
pub type ChunkCallback = Arc<dyn Fn(AudioChunk) + Send + Sync + 'static>;

/// Interface for the microphone capture device.
///
/// Implemented by:
/// - `CpalMicCapture` (audio-record-backends, feature `cpal`)
/// - test fakes that push chunks by hand
pub trait CaptureProvider: Send {
    /// Whether a capture device is currently available.
    fn is_available(&self) -> bool;

    /// Acquire the device with `request`, apply its stages in order, and begin
    /// delivering chunks via `on_chunk`.
    ///
    /// Returns the sample rate the device actually runs at.
    fn start(&mut self, request: &CaptureRequest, on_chunk: ChunkCallback) -> Result<u32, String>;

    /// Stop delivery, release stages in reverse connection order and close
    /// the device. Must be safe to call when not started.
    fn stop(&mut self) -> Result<(), String>;

    /// Information about the device backing this provider.
    fn device_info(&self) -> AudioSource;
}
