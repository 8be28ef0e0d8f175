//! MP3 bitstream encoder backed by LAME (`mp3lame-encoder`).

use mp3lame_encoder::{max_required_buffer_size, Bitrate, Builder, Encoder, FlushNoGap, MonoPcm};

use audio_record_core::traits::frame_encoder::{EncoderParams, Mp3EncoderFactory, Mp3FrameEncoder};

/// Builds one LAME encoder per recording.
#[derive(Debug, Clone, Copy, Default)]
pub struct LameEncoderFactory;

impl LameEncoderFactory {
    pub fn new() -> Self {
        Self
    }
}

/// Nearest LAME bitrate at or above `kbps` (320 at most).
pub fn lame_bitrate(kbps: u32) -> Bitrate {
    match kbps {
        0..=8 => Bitrate::Kbps8,
        9..=16 => Bitrate::Kbps16,
        17..=24 => Bitrate::Kbps24,
        25..=32 => Bitrate::Kbps32,
        33..=40 => Bitrate::Kbps40,
        41..=48 => Bitrate::Kbps48,
        49..=64 => Bitrate::Kbps64,
        65..=80 => Bitrate::Kbps80,
        81..=96 => Bitrate::Kbps96,
        97..=112 => Bitrate::Kbps112,
        113..=128 => Bitrate::Kbps128,
        129..=160 => Bitrate::Kbps160,
        161..=192 => Bitrate::Kbps192,
        193..=224 => Bitrate::Kbps224,
        225..=256 => Bitrate::Kbps256,
        _ => Bitrate::Kbps320,
    }
}

impl Mp3EncoderFactory for LameEncoderFactory {
    fn create(&self, params: &EncoderParams) -> Result<Box<dyn Mp3FrameEncoder>, String> {
        if params.channels != 1 {
            return Err(format!("LAME adapter is mono only, got {} channels", params.channels));
        }
        let mut builder = Builder::new().ok_or_else(|| "failed to allocate LAME encoder".to_string())?;
        builder
            .set_num_channels(1)
            .map_err(|e| format!("set_num_channels: {:?}", e))?;
        builder
            .set_sample_rate(params.sample_rate)
            .map_err(|e| format!("set_sample_rate({}): {:?}", params.sample_rate, e))?;
        builder
            .set_brate(lame_bitrate(params.bitrate_kbps))
            .map_err(|e| format!("set_brate({}): {:?}", params.bitrate_kbps, e))?;
        let encoder = builder.build().map_err(|e| format!("failed to initialize LAME: {:?}", e))?;

        log::debug!(
            "LAME encoder ready: {} Hz, {} kbps, mono",
            params.sample_rate,
            params.bitrate_kbps
        );
        Ok(Box::new(LameFrameEncoder { encoder }))
    }
}

struct LameFrameEncoder {
    encoder: Encoder,
}

// SAFETY: the LAME context is only reached through `&mut self`, so it is
// never used from two threads at once.
unsafe impl Send for LameFrameEncoder {}

impl Mp3FrameEncoder for LameFrameEncoder {
    fn encode_frame(&mut self, pcm: &[i16]) -> Result<Vec<u8>, String> {
        let mut out = Vec::with_capacity(max_required_buffer_size(pcm.len()));
        let written = self
            .encoder
            .encode(MonoPcm(pcm), out.spare_capacity_mut())
            .map_err(|e| format!("LAME encode failed: {:?}", e))?;
        // SAFETY: LAME initialized `written` bytes of the spare capacity.
        unsafe {
            out.set_len(written);
        }
        Ok(out)
    }

    fn flush(&mut self) -> Result<Vec<u8>, String> {
        // Flush emits at most one frame plus the reservoir.
        let mut out = Vec::with_capacity(max_required_buffer_size(1152));
        let written = self
            .encoder
            .flush::<FlushNoGap>(out.spare_capacity_mut())
            .map_err(|e| format!("LAME flush failed: {:?}", e))?;
        // SAFETY: as above.
        unsafe {
            out.set_len(written);
        }
        Ok(out)
    }
}
