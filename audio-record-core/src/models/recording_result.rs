use std::sync::Arc;

use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::audio_models::CaptureProfile;

pub const MPEG_CONTENT_TYPE: &str = "audio/mpeg";

/// An encoded recording: the MP3 byte blob plus the parameters it was built from.
///
/// Cloning shares the underlying bytes, so a cached blob handed out twice is
/// the same allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedAudio {
    bytes: Arc<[u8]>,
    pub content_type: String,
    pub sample_rate: u32,
    pub bitrate_kbps: u32,
    pub channels: u16,
    pub sample_count: usize,
}

impl EncodedAudio {
    pub fn new(bytes: Vec<u8>, sample_rate: u32, bitrate_kbps: u32, channels: u16, sample_count: usize) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: MPEG_CONTENT_TYPE.to_string(),
            sample_rate,
            bitrate_kbps,
            channels,
            sample_count,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True when both values point at the same encoded allocation.
    pub fn same_blob(&self, other: &EncodedAudio) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.sample_count as f64 / self.sample_rate as f64
    }

    /// Standard base64 of the blob (no data-URL prefix).
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }

    /// SHA-256 hex digest of the blob.
    pub fn checksum(&self) -> String {
        let digest = Sha256::digest(&self.bytes);
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Sidecar metadata written next to an exported recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub file_name: String,
    pub duration_secs: f64,
    pub sample_rate: u32,
    pub bitrate_kbps: u32,
    pub size_bytes: u64,
    pub content_type: String,
    pub checksum: String,
    pub profile: CaptureProfile,
    pub created_at: String,
}

impl RecordingMetadata {
    pub fn describe(audio: &EncodedAudio, file_name: &str, profile: CaptureProfile) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_name: file_name.to_string(),
            duration_secs: audio.duration_secs(),
            sample_rate: audio.sample_rate,
            bitrate_kbps: audio.bitrate_kbps,
            size_bytes: audio.len() as u64,
            content_type: audio.content_type.clone(),
            checksum: audio.checksum(),
            profile,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_and_checksum() {
        let audio = EncodedAudio::new(b"abc".to_vec(), 48000, 96, 1, 48000);
        assert_eq!(audio.to_base64(), "YWJj");
        assert_eq!(
            audio.checksum(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(audio.content_type, "audio/mpeg");
        assert!((audio.duration_secs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn clones_share_the_blob() {
        let audio = EncodedAudio::new(vec![1, 2, 3], 48000, 96, 1, 10);
        let copy = audio.clone();
        assert!(audio.same_blob(&copy));

        let other = EncodedAudio::new(vec![1, 2, 3], 48000, 96, 1, 10);
        assert!(!audio.same_blob(&other));
        assert_eq!(audio, other);
    }

    #[test]
    fn metadata_describes_blob() {
        let audio = EncodedAudio::new(vec![0u8; 10], 48000, 128, 1, 24000);
        let meta = RecordingMetadata::describe(&audio, "recording_x.mp3", CaptureProfile::Music);
        assert_eq!(meta.size_bytes, 10);
        assert_eq!(meta.bitrate_kbps, 128);
        assert!((meta.duration_secs - 0.5).abs() < 1e-9);
        assert_eq!(meta.checksum.len(), 64);
    }
}
