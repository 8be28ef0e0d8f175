use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::audio_models::CaptureProfile;
use crate::models::error::RecorderError;
use crate::models::recording_result::{EncodedAudio, RecordingMetadata};
use crate::upload::keys::{timestamp_filename, timestamp_rand_filename};

pub const EXPORT_EXTENSION: &str = "mp3";

/// Write `audio` to `{dir}/{prefix}_{YYYYMMDD}_{HHMMSS}.mp3` with a
/// `.metadata.json` sidecar. Returns the recording path.
///
/// A random suffix is added when the timestamped name is already taken.
pub fn save_recording(
    audio: &EncodedAudio,
    dir: &Path,
    prefix: &str,
    profile: CaptureProfile,
) -> Result<PathBuf, RecorderError> {
    if audio.is_empty() {
        return Err(RecorderError::NoAudioCaptured);
    }
    fs::create_dir_all(dir)
        .map_err(|e| RecorderError::StorageError(format!("failed to create {}: {}", dir.display(), e)))?;

    let mut file_name = timestamp_filename(prefix, EXPORT_EXTENSION);
    if dir.join(&file_name).exists() {
        file_name = timestamp_rand_filename(prefix, EXPORT_EXTENSION);
    }
    let path = dir.join(&file_name);

    fs::write(&path, audio.bytes())
        .map_err(|e| RecorderError::StorageError(format!("failed to write recording: {}", e)))?;
    let metadata = RecordingMetadata::describe(audio, &file_name, profile);
    write_metadata(&metadata, &path)?;

    log::info!("saved {} ({} bytes)", path.display(), audio.len());
    Ok(path)
}

/// Write recording metadata as a JSON sidecar file.
///
/// Creates `{recording_path}.metadata.json` alongside the recording.
pub fn write_metadata(metadata: &RecordingMetadata, recording_path: &Path) -> Result<(), RecorderError> {
    let metadata_path = recording_path.with_extension("metadata.json");
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| RecorderError::StorageError(format!("failed to serialize metadata: {}", e)))?;
    fs::write(&metadata_path, json)
        .map_err(|e| RecorderError::StorageError(format!("failed to write metadata: {}", e)))?;
    Ok(())
}

/// Read recording metadata from a JSON sidecar file.
pub fn read_metadata(recording_path: &Path) -> Result<RecordingMetadata, RecorderError> {
    let metadata_path = recording_path.with_extension("metadata.json");
    let json = fs::read_to_string(&metadata_path)
        .map_err(|e| RecorderError::StorageError(format!("failed to read metadata: {}", e)))?;
    let metadata: RecordingMetadata = serde_json::from_str(&json)
        .map_err(|e| RecorderError::StorageError(format!("failed to parse metadata: {}", e)))?;
    Ok(metadata)
}

/// True when the file on disk still matches the checksum in its sidecar.
pub fn verify_recording(recording_path: &Path) -> Result<bool, RecorderError> {
    let metadata = read_metadata(recording_path)?;
    Ok(sha256_file(recording_path)? == metadata.checksum)
}

fn sha256_file(path: &Path) -> Result<String, RecorderError> {
    let data =
        fs::read(path).map_err(|e| RecorderError::StorageError(format!("failed to read file for checksum: {}", e)))?;
    let digest = Sha256::digest(&data);
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("audio_record_test_{}_{}", name, uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn audio() -> EncodedAudio {
        EncodedAudio::new(vec![0xFF, 0xFB, 0x90, 0x00, 7, 7, 7], 48000, 96, 1, 96_000)
    }

    #[test]
    fn save_writes_blob_and_sidecar() {
        let dir = temp_dir("save");
        let path = save_recording(&audio(), &dir, "recording", CaptureProfile::Voice).unwrap();

        assert_eq!(fs::read(&path).unwrap(), audio().bytes());
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("recording_"));
        assert!(name.ends_with(".mp3"));

        let metadata = read_metadata(&path).unwrap();
        assert_eq!(metadata.file_name, name);
        assert_eq!(metadata.size_bytes, 7);
        assert_eq!(metadata.bitrate_kbps, 96);
        assert_eq!(metadata.profile, CaptureProfile::Voice);
        assert!((metadata.duration_secs - 2.0).abs() < 1e-9);
        assert_eq!(metadata.checksum, audio().checksum());
        assert!(verify_recording(&path).unwrap());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn second_save_in_same_second_gets_new_name() {
        let dir = temp_dir("collide");
        let first = save_recording(&audio(), &dir, "take", CaptureProfile::Music).unwrap();
        let second = save_recording(&audio(), &dir, "take", CaptureProfile::Music).unwrap();
        assert_ne!(first, second);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn tampered_file_fails_verification() {
        let dir = temp_dir("tamper");
        let path = save_recording(&audio(), &dir, "recording", CaptureProfile::Voice).unwrap();
        fs::write(&path, b"junk").unwrap();
        assert!(!verify_recording(&path).unwrap());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn empty_audio_is_not_saved() {
        let dir = temp_dir("empty");
        let empty = EncodedAudio::new(Vec::new(), 48000, 96, 1, 0);
        assert_eq!(
            save_recording(&empty, &dir, "recording", CaptureProfile::Voice),
            Err(RecorderError::NoAudioCaptured)
        );
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_sidecar_is_storage_error() {
        let err = read_metadata(Path::new("/nonexistent/recording.mp3")).unwrap_err();
        assert!(matches!(err, RecorderError::StorageError(_)));
    }
}
