use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::models::config::UploadConfig;
use crate::models::error::RecorderError;
use crate::models::recording_result::EncodedAudio;
use crate::models::upload_models::{
    InlinePayload, PresignedTarget, SignRequest, SignResponse, UploadNotice, UploadOutcome, UploadReceipt,
    UploadRecord,
};
use crate::traits::upload_transport::UploadTransport;
use crate::upload::keys::{normalize_object_key, object_key, timestamp_filename, timestamp_rand_filename};

/// Clears the in-flight flag when the upload future completes or is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Uploads the encoded recording, either as an object through a presigned
/// URL or inline as base64 JSON.
///
/// ```text
/// presigned: POST sign {keyname, contentType} → {presignUrl, presignKey}
///            PUT presignUrl (Content-Type as signed) ← raw bytes
/// inline:    POST {filename, data: base64} → any JSON
/// ```
///
/// Each path refuses to upload the same recording attempt twice. One upload
/// may be outstanding at a time across both paths.
pub struct UploadCoordinator<T: UploadTransport> {
    transport: T,
    config: UploadConfig,
    presigned: Mutex<UploadRecord>,
    inline: Mutex<UploadRecord>,
    in_flight: AtomicBool,
}

impl<T: UploadTransport> UploadCoordinator<T> {
    pub fn new(transport: T, config: UploadConfig) -> Self {
        Self {
            transport,
            config,
            presigned: Mutex::new(UploadRecord::default()),
            inline: Mutex::new(UploadRecord::default()),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    pub fn presigned_record(&self) -> UploadRecord {
        *self.presigned.lock()
    }

    pub fn inline_record(&self) -> UploadRecord {
        *self.inline.lock()
    }

    pub fn is_uploading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Upload recording `attempt` through a presigned URL.
    ///
    /// Pre-flight refusals come back as `UploadOutcome::Refused` without any
    /// network activity.
    pub async fn upload_presigned(
        &self,
        attempt: u64,
        audio: Option<EncodedAudio>,
    ) -> Result<UploadOutcome, RecorderError> {
        let audio = match Self::preflight(&self.presigned, attempt, audio) {
            Ok(audio) => audio,
            Err(notice) => return Ok(Self::refuse(notice)),
        };
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            return Ok(Self::refuse(UploadNotice::UploadInProgress));
        };

        let file_name = timestamp_rand_filename(&self.config.file_prefix, &self.config.file_extension);
        let candidate = object_key(&self.config.key_prefix, &file_name);
        let target = self.request_signed_target(&candidate, &self.config.content_type).await?;
        let key = target.object_key.clone();
        self.transfer(target, &audio).await?;

        {
            let mut record = self.presigned.lock();
            record.recording_attempt = attempt;
            record.mark_uploaded();
        }

        let public_url = self
            .config
            .public_base_url
            .as_ref()
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), key));
        log::info!("uploaded attempt {} as {} ({} bytes)", attempt, key, audio.len());
        Ok(UploadOutcome::Uploaded(UploadReceipt::Object {
            object_key: key,
            public_url,
            size_bytes: audio.len(),
        }))
    }

    /// Signing round-trip for `candidate`, normalized before it is sent.
    pub async fn request_signed_target(
        &self,
        candidate: &str,
        content_type: &str,
    ) -> Result<PresignedTarget, RecorderError> {
        let keyname = normalize_object_key(candidate);
        if keyname.is_empty() {
            return Err(RecorderError::SignRequestFailed(format!(
                "object key {:?} is empty after normalization",
                candidate
            )));
        }

        let body = serde_json::to_value(SignRequest {
            keyname,
            content_type: content_type.to_string(),
        })
        .map_err(|e| RecorderError::SignRequestFailed(format!("failed to serialize request: {}", e)))?;

        let response = self
            .transport
            .post_json(&self.config.presign_endpoint, &body)
            .await
            .map_err(|e| {
                log::warn!("sign request failed: {}", e);
                RecorderError::SignRequestFailed(e)
            })?;
        if !response.is_success() {
            log::warn!("sign endpoint returned {}: {}", response.status, response.body_text());
            return Err(RecorderError::SignRequestFailed(format!(
                "sign endpoint returned {}",
                response.status
            )));
        }

        let parsed: SignResponse = serde_json::from_slice(&response.body)
            .map_err(|e| RecorderError::SignResponseInvalid(format!("unparsable sign response: {}", e)))?;
        let upload_url = parsed
            .presign_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| RecorderError::SignResponseInvalid("missing presignUrl".into()))?;
        let object_key = parsed
            .presign_key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| RecorderError::SignResponseInvalid("missing presignKey".into()))?;

        Ok(PresignedTarget {
            upload_url,
            object_key,
            content_type: content_type.to_string(),
        })
    }

    /// PUT the blob to a signed target. The target is consumed: a signed URL
    /// is never reused.
    pub async fn transfer(&self, target: PresignedTarget, audio: &EncodedAudio) -> Result<(), RecorderError> {
        let response = self
            .transport
            .put_bytes(&target.upload_url, &target.content_type, audio.bytes().to_vec())
            .await
            .map_err(|e| {
                log::warn!("transfer of {} failed: {}", target.object_key, e);
                RecorderError::TransferFailed(e)
            })?;
        if !response.is_success() {
            log::warn!("object store returned {} for {}", response.status, target.object_key);
            return Err(RecorderError::TransferFailed(format!(
                "upload returned {}",
                response.status
            )));
        }
        Ok(())
    }

    /// Upload recording `attempt` as `{filename, data}` with base64 data.
    pub async fn upload_inline(
        &self,
        attempt: u64,
        audio: Option<EncodedAudio>,
    ) -> Result<UploadOutcome, RecorderError> {
        let audio = match Self::preflight(&self.inline, attempt, audio) {
            Ok(audio) => audio,
            Err(notice) => return Ok(Self::refuse(notice)),
        };
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            return Ok(Self::refuse(UploadNotice::UploadInProgress));
        };

        let filename = timestamp_filename(&self.config.file_prefix, &self.config.file_extension);
        let body = serde_json::to_value(InlinePayload {
            filename: filename.clone(),
            data: audio.to_base64(),
        })
        .map_err(|e| RecorderError::TransferFailed(format!("failed to serialize payload: {}", e)))?;

        let response = self
            .transport
            .post_json(&self.config.inline_endpoint, &body)
            .await
            .map_err(RecorderError::TransferFailed)?;
        if !response.is_success() {
            log::warn!("inline upload returned {}: {}", response.status, response.body_text());
            return Err(RecorderError::TransferFailed(format!(
                "inline upload returned {}",
                response.status
            )));
        }
        let reply = serde_json::from_slice(&response.body).unwrap_or_else(|_| serde_json::json!({}));

        {
            let mut record = self.inline.lock();
            record.recording_attempt = attempt;
            record.mark_uploaded();
        }
        log::info!("uploaded attempt {} inline as {}", attempt, filename);
        Ok(UploadOutcome::Uploaded(UploadReceipt::Inline {
            filename,
            response: reply,
        }))
    }

    fn preflight(
        record: &Mutex<UploadRecord>,
        attempt: u64,
        audio: Option<EncodedAudio>,
    ) -> Result<EncodedAudio, UploadNotice> {
        {
            let mut r = record.lock();
            r.recording_attempt = attempt;
            r.check()?;
        }
        match audio {
            Some(audio) if !audio.is_empty() => Ok(audio),
            _ => Err(UploadNotice::NoAudioCaptured),
        }
    }

    fn refuse(notice: UploadNotice) -> UploadOutcome {
        log::info!("upload refused: {}", notice.message());
        UploadOutcome::Refused(notice)
    }
}
