/// Parameters the MP3 encoder is constructed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderParams {
    pub sample_rate: u32,
    pub bitrate_kbps: u32,
    pub channels: u16,
}

/// An opaque MP3 bitstream encoder fed one MPEG frame at a time.
///
/// Default implementation wraps LAME via `mp3lame-encoder`
/// (audio-record-backends, feature `lame`).
pub trait Mp3FrameEncoder: Send {
    /// Encode one frame of 16-bit PCM. May return an empty vector while the
    /// encoder buffers internally.
    fn encode_frame(&mut self, pcm: &[i16]) -> Result<Vec<u8>, String>;

    /// Finalize and return whatever the encoder still buffers.
    fn flush(&mut self) -> Result<Vec<u8>, String>;
}

/// Creates a fresh encoder per encode call.
pub trait Mp3EncoderFactory: Send + Sync {
    fn create(&self, params: &EncoderParams) -> Result<Box<dyn Mp3FrameEncoder>, String>;
}
