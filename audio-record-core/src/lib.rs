//! # audio-record-core
//!
//! Platform-agnostic core of a countdown-then-record microphone recorder.
//!
//! Waits on an optional countdown, records mono audio for a bounded
//! duration, encodes it to MP3 once per recording, plays it back and uploads
//! it either through a presigned URL or as an inline base64 payload.
//! Devices, the MP3 bitstream encoder, the media element and the HTTP client
//! are collaborators behind traits; `audio-record-backends` provides real
//! implementations.
//!
//! ## Architecture
//!
//! ```text
//! audio-record-core (this crate)
//! ├── traits/       ← CaptureProvider, RecorderDelegate, Mp3EncoderFactory, MediaBackend, UploadTransport, Clock
//! ├── models/       ← RecorderError, RecordingState, RecorderSettings, AudioChunk, EncodedAudio, upload models
//! ├── processing/   ← capture constraints, StageChain, PcmBuffer, MP3 framing
//! ├── timing/       ← SystemClock, ManualClock
//! ├── session/      ← RecordingSession, WaitThenRecord, Recorder facade
//! ├── playback/     ← PlaybackController
//! ├── upload/       ← UploadCoordinator, object keys and file names
//! └── storage/      ← MP3 export with metadata sidecar
//! ```

pub mod models;
pub mod playback;
pub mod processing;
pub mod session;
pub mod storage;
pub mod timing;
pub mod traits;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{AudioChunk, AudioSource, CaptureConstraints, CaptureProfile, CaptureRequest, ProcessingStage};
pub use models::config::{RecorderConfig, RecorderSettings, UploadConfig};
pub use models::error::RecorderError;
pub use models::events::{PlaybackEvent, RecorderEvent, RecordingProgress, StopSummary};
pub use models::recording_result::{EncodedAudio, RecordingMetadata};
pub use models::state::{RecordingState, StopReason, WaitStart};
pub use models::upload_models::{PresignedTarget, UploadNotice, UploadOutcome, UploadReceipt};
pub use playback::controller::PlaybackController;
pub use processing::pcm_buffer::PcmBuffer;
pub use processing::stage_chain::StageChain;
pub use session::recorder::Recorder;
pub use session::recording::RecordingSession;
pub use session::wait::WaitThenRecord;
pub use timing::manual_clock::ManualClock;
pub use timing::system_clock::SystemClock;
pub use traits::capture_delegate::{PlaybackDelegate, RecorderDelegate};
pub use traits::capture_provider::{CaptureProvider, ChunkCallback};
pub use traits::clock::{Clock, TimerHandle};
pub use traits::frame_encoder::{EncoderParams, Mp3EncoderFactory, Mp3FrameEncoder};
pub use traits::media_backend::{MediaBackend, SourceHandle};
pub use traits::upload_transport::{TransportResponse, UploadTransport};
pub use upload::coordinator::UploadCoordinator;
