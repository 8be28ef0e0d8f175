use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::audio_models::CaptureProfile;
use super::error::RecorderError;

pub const MIN_DURATION_SECS: f64 = 1.0;
pub const MAX_DURATION_SECS: f64 = 3600.0;
pub const DEFAULT_RECORD_SECS: f64 = 60.0;
pub const DEFAULT_WAIT_SECS: f64 = 30.0;

/// Clamp a user-supplied duration to `[1, 3600]` seconds.
///
/// Non-finite input (NaN, ±inf) falls back to `fallback` before clamping.
pub fn clamp_duration_secs(value: f64, fallback: f64) -> f64 {
    let value = if value.is_finite() { value } else { fallback };
    value.clamp(MIN_DURATION_SECS, MAX_DURATION_SECS)
}

/// Recording behaviour for a page load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Capture preset (default: voice).
    pub profile: CaptureProfile,

    /// Bitrate override in kbps. Only honored by the voice profile.
    pub bitrate_kbps: Option<u32>,

    /// Recording length in seconds (default: 60).
    pub record_duration_secs: f64,

    /// Countdown length before an automatic recording (default: 30).
    pub wait_duration_secs: f64,
}

impl RecorderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(kbps) = self.bitrate_kbps {
            if !(8..=320).contains(&kbps) {
                return Err(format!("unsupported bitrate: {} kbps", kbps));
            }
        }
        if self.record_duration_secs.is_nan() || self.wait_duration_secs.is_nan() {
            return Err("durations must be numbers".into());
        }
        Ok(())
    }

    pub fn bitrate_kbps(&self) -> u32 {
        self.profile.effective_bitrate_kbps(self.bitrate_kbps)
    }

    pub fn record_secs(&self) -> f64 {
        clamp_duration_secs(self.record_duration_secs, DEFAULT_RECORD_SECS)
    }

    pub fn wait_secs(&self) -> f64 {
        clamp_duration_secs(self.wait_duration_secs, DEFAULT_WAIT_SECS)
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            profile: CaptureProfile::Voice,
            bitrate_kbps: None,
            record_duration_secs: DEFAULT_RECORD_SECS,
            wait_duration_secs: DEFAULT_WAIT_SECS,
        }
    }
}

/// Upload endpoints and naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Signing endpoint: `POST {keyname, contentType}` → `{presignUrl, presignKey}`.
    pub presign_endpoint: String,

    /// Inline endpoint: `POST {filename, data}` with base64 data.
    pub inline_endpoint: String,

    /// Object key directory, e.g. `records` → `records/recording_..._12345.mp3`.
    pub key_prefix: String,

    pub file_prefix: String,
    pub file_extension: String,
    pub content_type: String,

    /// Base URL for links to uploaded objects (`{base}/{objectKey}`).
    pub public_base_url: Option<String>,
}

impl UploadConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.presign_endpoint.trim().is_empty() {
            return Err("presign endpoint must not be empty".into());
        }
        if self.inline_endpoint.trim().is_empty() {
            return Err("inline endpoint must not be empty".into());
        }
        if self.content_type.trim().is_empty() {
            return Err("content type must not be empty".into());
        }
        if self.file_extension.contains('.') || self.file_extension.is_empty() {
            return Err(format!("invalid file extension: {:?}", self.file_extension));
        }
        Ok(())
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            presign_endpoint: "/api/presigned-url".into(),
            inline_endpoint: "/api/upload-base64".into(),
            key_prefix: "records".into(),
            file_prefix: "recording".into(),
            file_extension: "mp3".into(),
            content_type: "audio/mpeg".into(),
            public_base_url: None,
        }
    }
}

/// Both configuration sections, loadable from one JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderSettings {
    pub recorder: RecorderConfig,
    pub upload: UploadConfig,
}

impl RecorderSettings {
    pub fn from_json_str(json: &str) -> Result<Self, RecorderError> {
        let settings: Self = serde_json::from_str(json)
            .map_err(|e| RecorderError::ConfigurationFailed(format!("failed to parse settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, RecorderError> {
        let json = fs::read_to_string(path)
            .map_err(|e| RecorderError::ConfigurationFailed(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), RecorderError> {
        self.recorder.validate().map_err(RecorderError::ConfigurationFailed)?;
        self.upload.validate().map_err(RecorderError::ConfigurationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_handles_bounds_and_garbage() {
        assert_eq!(clamp_duration_secs(0.2, 60.0), 1.0);
        assert_eq!(clamp_duration_secs(99_999.0, 60.0), 3600.0);
        assert_eq!(clamp_duration_secs(f64::NAN, 60.0), 60.0);
        assert_eq!(clamp_duration_secs(f64::INFINITY, 30.0), 30.0);
        assert_eq!(clamp_duration_secs(42.0, 60.0), 42.0);
    }

    #[test]
    fn defaults_are_valid() {
        let settings = RecorderSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.recorder.record_secs(), 60.0);
        assert_eq!(settings.recorder.wait_secs(), 30.0);
        assert_eq!(settings.recorder.bitrate_kbps(), 96);
        assert_eq!(settings.upload.content_type, "audio/mpeg");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let settings = RecorderSettings::from_json_str(
            r#"{"recorder": {"profile": "music", "record_duration_secs": 5},
                "upload": {"presign_endpoint": "https://sign.example/voices"}}"#,
        )
        .unwrap();
        assert_eq!(settings.recorder.profile, CaptureProfile::Music);
        assert_eq!(settings.recorder.record_secs(), 5.0);
        assert_eq!(settings.recorder.bitrate_kbps(), 128);
        assert_eq!(settings.upload.presign_endpoint, "https://sign.example/voices");
        assert_eq!(settings.upload.key_prefix, "records");
    }

    #[test]
    fn rejects_bad_bitrate() {
        let err = RecorderSettings::from_json_str(r#"{"recorder": {"bitrate_kbps": 1000}}"#).unwrap_err();
        assert!(matches!(err, RecorderError::ConfigurationFailed(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(RecorderSettings::from_json_str("{not json").is_err());
    }
}
