//! Encoder adapter: captured f32 chunks → MP3 blob.
//!
//! Layout of the work handed to the bitstream encoder:
//! ```text
//! [chunk 0][chunk 1]...[chunk n]          merged in arrival order
//! → i16 PCM (symmetric scaling)
//! → [1152][1152]...[rest + zero pad]      one encode call per MPEG frame
//! → flush                                 trailing encoder state
//! ```
//! The encoder itself is opaque (`Mp3FrameEncoder`); this module owns the
//! framing rules.

use crate::models::audio_models::AudioChunk;
use crate::models::error::RecorderError;
use crate::models::recording_result::EncodedAudio;
use crate::processing::pcm_buffer::{float_to_int16, merge_chunks};
use crate::traits::frame_encoder::{EncoderParams, Mp3EncoderFactory};

/// Samples per MPEG-1 Layer III frame.
pub const SAMPLES_PER_FRAME: usize = 1152;

/// Number of encoder calls needed for `sample_count` samples, counting the
/// zero-padded partial frame.
pub fn frame_count(sample_count: usize) -> usize {
    sample_count.div_ceil(SAMPLES_PER_FRAME)
}

/// Encode `chunks` into a single `audio/mpeg` blob.
pub fn encode_mp3(
    chunks: &[AudioChunk],
    params: EncoderParams,
    factory: &dyn Mp3EncoderFactory,
) -> Result<EncodedAudio, RecorderError> {
    if params.channels != 1 {
        return Err(RecorderError::EncodingFailed(format!(
            "unsupported channel count: {}",
            params.channels
        )));
    }

    let merged = merge_chunks(chunks);
    if merged.is_empty() {
        return Err(RecorderError::EncodingFailed("no audio chunks to encode".into()));
    }
    let frames = frame_count(merged.len());
    if frames == 0 {
        return Err(RecorderError::EncodingFailed("frame count is zero".into()));
    }

    let pcm = float_to_int16(&merged);
    let mut encoder = factory.create(&params).map_err(RecorderError::EncodingFailed)?;
    let mut output = Vec::new();

    let mut frames_iter = pcm.chunks_exact(SAMPLES_PER_FRAME);
    for frame in &mut frames_iter {
        let encoded = encoder.encode_frame(frame).map_err(RecorderError::EncodingFailed)?;
        output.extend_from_slice(&encoded);
    }

    let remainder = frames_iter.remainder();
    if !remainder.is_empty() {
        let mut last = [0i16; SAMPLES_PER_FRAME];
        last[..remainder.len()].copy_from_slice(remainder);
        let encoded = encoder.encode_frame(&last).map_err(RecorderError::EncodingFailed)?;
        output.extend_from_slice(&encoded);
    }

    let tail = encoder.flush().map_err(RecorderError::EncodingFailed)?;
    output.extend_from_slice(&tail);

    if output.is_empty() {
        return Err(RecorderError::EncodingFailed("encoder produced no output".into()));
    }

    log::debug!(
        "Encoded {} samples in {} frames → {} bytes ({} kbps)",
        merged.len(),
        frames,
        output.len(),
        params.bitrate_kbps
    );

    Ok(EncodedAudio::new(
        output,
        params.sample_rate,
        params.bitrate_kbps,
        params.channels,
        merged.len(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeEncoderFactory;

    fn params() -> EncoderParams {
        EncoderParams {
            sample_rate: 48000,
            bitrate_kbps: 128,
            channels: 1,
        }
    }

    #[test]
    fn frame_count_rounds_up() {
        assert_eq!(frame_count(0), 0);
        assert_eq!(frame_count(1), 1);
        assert_eq!(frame_count(1152), 1);
        assert_eq!(frame_count(1153), 2);
    }

    #[test]
    fn silence_encodes_to_stable_mpeg_blob() {
        let factory = FakeEncoderFactory::new();
        let chunks = vec![AudioChunk::new(vec![0.0; SAMPLES_PER_FRAME * 3])];

        let first = encode_mp3(&chunks, params(), &factory).unwrap();
        let second = encode_mp3(&chunks, params(), &factory).unwrap();

        assert!(!first.is_empty());
        assert_eq!(first.content_type, "audio/mpeg");
        assert_eq!(first.len(), second.len());
        assert_eq!(first.bytes(), second.bytes());
        assert_eq!(factory.frames_seen(), vec![SAMPLES_PER_FRAME; 6]);
    }

    #[test]
    fn partial_frame_is_zero_padded() {
        let factory = FakeEncoderFactory::new();
        let chunks = vec![
            AudioChunk::new(vec![0.5; 1000]),
            AudioChunk::new(vec![0.5; 200]),
        ];

        let audio = encode_mp3(&chunks, params(), &factory).unwrap();

        assert_eq!(audio.sample_count, 1200);
        assert_eq!(factory.frames_seen(), vec![SAMPLES_PER_FRAME, SAMPLES_PER_FRAME]);
        let last = factory.last_frame();
        assert_eq!(last[47], 16383);
        assert!(last[48..].iter().all(|&s| s == 0));
        assert_eq!(factory.flushes(), 1);
    }

    #[test]
    fn chunk_order_is_preserved() {
        let factory = FakeEncoderFactory::new();
        let chunks = vec![AudioChunk::new(vec![1.0]), AudioChunk::new(vec![-1.0])];
        encode_mp3(&chunks, params(), &factory).unwrap();
        let frame = factory.last_frame();
        assert_eq!(&frame[..2], &[i16::MAX, i16::MIN]);
    }

    #[test]
    fn empty_input_fails() {
        let factory = FakeEncoderFactory::new();
        let err = encode_mp3(&[], params(), &factory).unwrap_err();
        assert!(matches!(err, RecorderError::EncodingFailed(_)));

        let err = encode_mp3(&[AudioChunk::new(vec![])], params(), &factory).unwrap_err();
        assert!(matches!(err, RecorderError::EncodingFailed(_)));
        assert_eq!(factory.created(), 0);
    }

    #[test]
    fn stereo_is_rejected() {
        let factory = FakeEncoderFactory::new();
        let p = EncoderParams { channels: 2, ..params() };
        let err = encode_mp3(&[AudioChunk::new(vec![0.0; 10])], p, &factory).unwrap_err();
        assert!(matches!(err, RecorderError::EncodingFailed(_)));
    }

    #[test]
    fn silent_encoder_output_is_a_failure() {
        let factory = FakeEncoderFactory::silent();
        let err = encode_mp3(&[AudioChunk::new(vec![0.1; 10])], params(), &factory).unwrap_err();
        assert_eq!(err, RecorderError::EncodingFailed("encoder produced no output".into()));
    }
}
