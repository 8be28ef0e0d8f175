use crate::models::audio_models::{CaptureConstraints, CaptureProfile, CaptureRequest, ProcessingStage};

pub const CAPTURE_SAMPLE_RATE: u32 = 48000;
pub const CAPTURE_CHANNELS: u16 = 1;
pub const SINK_STAGE_NAME: &str = "recorder-sink";

/// Device constraints for `profile`.
///
/// Echo cancellation and automatic gain are always off; noise suppression is
/// on for voice only.
pub fn build_capture_constraints(profile: CaptureProfile) -> CaptureConstraints {
    CaptureConstraints {
        sample_rate: CAPTURE_SAMPLE_RATE,
        channel_count: CAPTURE_CHANNELS,
        echo_cancellation: false,
        noise_suppression: matches!(profile, CaptureProfile::Voice),
        auto_gain_control: false,
    }
}

/// Processing chain between the device and the chunk sink, in connection order:
/// input gain → compressor → sink.
pub fn build_processing_stages(profile: CaptureProfile) -> Vec<ProcessingStage> {
    let gain = match profile {
        CaptureProfile::Voice => 1.2,
        CaptureProfile::Music => 1.0,
    };
    vec![
        ProcessingStage::Gain { gain },
        ProcessingStage::Compressor {
            threshold_db: -10.0,
            ratio: 3.0,
            attack_secs: 0.003,
            release_secs: 0.25,
            knee_db: 6.0,
        },
        ProcessingStage::Sink {
            name: SINK_STAGE_NAME.to_string(),
        },
    ]
}

pub fn build_capture_request(profile: CaptureProfile) -> CaptureRequest {
    CaptureRequest {
        profile,
        constraints: build_capture_constraints(profile),
        stages: build_processing_stages(profile),
    }
}
