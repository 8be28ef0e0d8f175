use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Capture preset selecting device constraints, processing stages and bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureProfile {
    #[default]
    Voice,
    Music,
}

impl CaptureProfile {
    /// Bitrate used when the configuration does not override it.
    pub fn default_bitrate_kbps(&self) -> u32 {
        match self {
            Self::Voice => 96,
            Self::Music => 128,
        }
    }

    /// Voice honors the requested bitrate; music is always encoded at 128 kbps.
    pub fn effective_bitrate_kbps(&self, requested: Option<u32>) -> u32 {
        match self {
            Self::Voice => requested.unwrap_or_else(|| self.default_bitrate_kbps()),
            Self::Music => 128,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Music => "music",
        }
    }
}

/// One block of mono f32 samples delivered by the capture device.
///
/// Cheap to clone: the samples live behind an `Arc` and are never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    samples: Arc<[f32]>,
}

impl AudioChunk {
    pub fn new(samples: Vec<f32>) -> Self {
        Self {
            samples: samples.into(),
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl From<Vec<f32>> for AudioChunk {
    fn from(samples: Vec<f32>) -> Self {
        Self::new(samples)
    }
}

impl From<&[f32]> for AudioChunk {
    fn from(samples: &[f32]) -> Self {
        Self {
            samples: samples.into(),
        }
    }
}

/// Device constraint set requested from the capture device.
///
/// Serialized with the browser-style constraint names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureConstraints {
    pub sample_rate: u32,
    pub channel_count: u16,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

/// A named processing stage between the device source and the chunk sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProcessingStage {
    Gain {
        gain: f32,
    },
    Compressor {
        threshold_db: f32,
        ratio: f32,
        attack_secs: f32,
        release_secs: f32,
        knee_db: f32,
    },
    Sink {
        name: String,
    },
}

impl ProcessingStage {
    pub fn name(&self) -> &str {
        match self {
            Self::Gain { .. } => "gain",
            Self::Compressor { .. } => "compressor",
            Self::Sink { name } => name,
        }
    }
}

/// Everything a capture provider needs to open the device.
///
/// Stages are listed in connection order; providers release them in
/// reverse order (see [`CaptureRequest::teardown_order`]).
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    pub profile: CaptureProfile,
    pub constraints: CaptureConstraints,
    pub stages: Vec<ProcessingStage>,
}

impl CaptureRequest {
    pub fn teardown_order(&self) -> impl Iterator<Item = &ProcessingStage> {
        self.stages.iter().rev()
    }
}

/// An audio input device available for capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSource {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}
