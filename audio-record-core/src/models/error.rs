use thiserror::Error;

/// Errors that can occur while recording, encoding, playing back or uploading.
///
/// Collaborator traits report failures as plain strings; the core maps them
/// onto these variants at the operation boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("capture unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("no audio captured")]
    NoAudioCaptured,

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("sign request failed: {0}")]
    SignRequestFailed(String),

    #[error("sign response invalid: {0}")]
    SignResponseInvalid(String),

    #[error("transfer failed: {0}")]
    TransferFailed(String),

    #[error("playback failed: {0}")]
    PlaybackFailed(String),

    #[error("a recording is already in progress")]
    AlreadyRecording,

    #[error("waiting for the countdown to finish")]
    WaitInProgress,

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),
}
