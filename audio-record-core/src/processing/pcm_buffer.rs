use crate::models::audio_models::AudioChunk;

/// Ordered store of the chunks captured during the current recording.
///
/// Unlike a ring buffer nothing is ever dropped: a bounded session keeps at
/// most one hour of mono audio. Cleared at the start of every recording.
#[derive(Debug, Default, Clone)]
pub struct PcmBuffer {
    chunks: Vec<AudioChunk>,
    total_samples: usize,
}

impl PcmBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk. Empty chunks are ignored.
    pub fn push(&mut self, chunk: AudioChunk) {
        if chunk.is_empty() {
            return;
        }
        self.total_samples += chunk.len();
        self.chunks.push(chunk);
    }

    pub fn chunks(&self) -> &[AudioChunk] {
        &self.chunks
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn sample_count(&self) -> usize {
        self.total_samples
    }

    pub fn is_empty(&self) -> bool {
        self.total_samples == 0
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.total_samples = 0;
    }

    /// Concatenate all chunks in arrival order.
    pub fn merged(&self) -> Vec<f32> {
        merge_chunks(&self.chunks)
    }

    /// Merged samples as linear 16-bit PCM.
    pub fn to_int16(&self) -> Vec<i16> {
        float_to_int16(&self.merged())
    }
}

/// Concatenate chunks preserving order.
pub fn merge_chunks(chunks: &[AudioChunk]) -> Vec<f32> {
    let total = chunks.iter().map(AudioChunk::len).sum();
    let mut merged = Vec::with_capacity(total);
    for chunk in chunks {
        merged.extend_from_slice(chunk.samples());
    }
    merged
}

/// Convert f32 samples in `[-1.0, 1.0]` to i16 with symmetric scaling.
///
/// Negative samples scale by 32768 and non-negative by 32767, so both
/// extremes map onto the full i16 range. Out-of-range input is clamped and
/// NaN becomes 0.
pub fn float_to_int16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| {
            let s = s.clamp(-1.0, 1.0);
            if s < 0.0 {
                (s * 32768.0) as i16
            } else {
                (s * 32767.0) as i16
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_merge_in_order() {
        let mut buf = PcmBuffer::new();
        buf.push(AudioChunk::new(vec![1.0, 2.0]));
        buf.push(AudioChunk::new(vec![3.0]));

        assert_eq!(buf.chunk_count(), 2);
        assert_eq!(buf.sample_count(), 3);
        assert_eq!(buf.merged(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn empty_chunks_are_ignored() {
        let mut buf = PcmBuffer::new();
        buf.push(AudioChunk::new(vec![]));
        assert!(buf.is_empty());
        assert_eq!(buf.chunk_count(), 0);
    }

    #[test]
    fn clear_resets_everything() {
        let mut buf = PcmBuffer::new();
        buf.push(AudioChunk::new(vec![0.5; 128]));
        buf.clear();

        assert!(buf.is_empty());
        assert_eq!(buf.sample_count(), 0);
        assert!(buf.merged().is_empty());
    }

    #[test]
    fn int16_conversion_is_symmetric() {
        let pcm = float_to_int16(&[0.0, 1.0, -1.0, 0.5, -0.5]);
        assert_eq!(pcm, vec![0, 32767, -32768, 16383, -16384]);
    }

    #[test]
    fn int16_conversion_clamps() {
        assert_eq!(float_to_int16(&[2.0, -3.0, f32::NAN]), vec![32767, -32768, 0]);
    }

    #[test]
    fn buffer_to_int16() {
        let mut buf = PcmBuffer::new();
        buf.push(AudioChunk::new(vec![1.0]));
        buf.push(AudioChunk::new(vec![-1.0]));
        assert_eq!(buf.to_int16(), vec![i16::MAX, i16::MIN]);
    }
}
