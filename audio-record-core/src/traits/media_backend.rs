use crate::models::recording_result::EncodedAudio;

/// Handle to a playable resource created from an encoded blob.
///
/// Must be revoked through the backend that created it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceHandle(pub String);

/// A single playable-media element.
pub trait MediaBackend: Send {
    /// Create a playable resource for `audio`.
    fn create_source(&mut self, audio: &EncodedAudio) -> Result<SourceHandle, String>;

    /// Release a resource created by `create_source`.
    fn revoke_source(&mut self, handle: &SourceHandle);

    /// Point the element at `handle` and wait for metadata. Returns the
    /// duration in seconds.
    fn load(&mut self, handle: &SourceHandle) -> Result<f64, String>;

    /// Detach whatever source is loaded.
    fn clear(&mut self);

    /// Start playback from the current position. `Err` when the element
    /// refuses to play (autoplay policy, decode failure).
    fn play(&mut self) -> Result<(), String>;

    fn pause(&mut self);

    fn set_current_time(&mut self, secs: f64);

    fn current_time(&self) -> f64;

    fn duration(&self) -> f64;

    fn is_ended(&self) -> bool;
}
