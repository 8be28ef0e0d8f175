use serde::{Deserialize, Serialize};

/// Short-lived upload destination returned by the signing endpoint.
///
/// Single use: the transfer consumes it. `content_type` is the value that was
/// signed and must be sent unchanged on the PUT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedTarget {
    pub upload_url: String,
    pub object_key: String,
    pub content_type: String,
}

/// Body of the signing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRequest {
    pub keyname: String,
    pub content_type: String,
}

/// Body of the signing response. Fields are optional so a missing one can be
/// reported as an invalid response rather than a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignResponse {
    pub presign_url: Option<String>,
    pub presign_key: Option<String>,
}

/// Body of the inline (base64) upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlinePayload {
    pub filename: String,
    pub data: String,
}

/// Per-path upload bookkeeping.
///
/// An upload is permitted only while `recording_attempt > uploaded_attempt`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadRecord {
    pub recording_attempt: u64,
    pub uploaded_attempt: u64,
}

impl UploadRecord {
    pub fn check(&self) -> Result<(), UploadNotice> {
        if self.recording_attempt == 0 {
            return Err(UploadNotice::NothingRecorded);
        }
        if self.recording_attempt <= self.uploaded_attempt {
            return Err(UploadNotice::AlreadyUploaded);
        }
        Ok(())
    }

    pub fn mark_uploaded(&mut self) {
        self.uploaded_attempt = self.recording_attempt;
    }
}

/// Pre-flight refusals. These are user-facing notices, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadNotice {
    NothingRecorded,
    AlreadyUploaded,
    NoAudioCaptured,
    UploadInProgress,
}

impl UploadNotice {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NothingRecorded => "record something before uploading",
            Self::AlreadyUploaded => "this recording was already uploaded; record again to upload",
            Self::NoAudioCaptured => "the last recording captured no audio",
            Self::UploadInProgress => "an upload is already in progress",
        }
    }
}

/// What a successful upload produced.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadReceipt {
    Object {
        object_key: String,
        public_url: Option<String>,
        size_bytes: usize,
    },
    Inline {
        filename: String,
        response: serde_json::Value,
    },
}

/// Outcome of an upload attempt that did not hit a hard error.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Uploaded(UploadReceipt),
    Refused(UploadNotice),
}

impl UploadOutcome {
    pub fn is_uploaded(&self) -> bool {
        matches!(self, Self::Uploaded(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_follows_attempt_numbers() {
        let record = UploadRecord { recording_attempt: 2, uploaded_attempt: 2 };
        assert_eq!(record.check(), Err(UploadNotice::AlreadyUploaded));

        let record = UploadRecord { recording_attempt: 2, uploaded_attempt: 1 };
        assert_eq!(record.check(), Ok(()));

        assert_eq!(UploadRecord::default().check(), Err(UploadNotice::NothingRecorded));
    }

    #[test]
    fn mark_uploaded_closes_the_gate() {
        let mut record = UploadRecord { recording_attempt: 3, uploaded_attempt: 1 };
        record.mark_uploaded();
        assert_eq!(record.uploaded_attempt, 3);
        assert!(record.check().is_err());
    }

    #[test]
    fn sign_request_wire_shape() {
        let body = serde_json::to_value(SignRequest {
            keyname: "records/a.mp3".into(),
            content_type: "audio/mpeg".into(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"keyname": "records/a.mp3", "contentType": "audio/mpeg"}));
    }

    #[test]
    fn sign_response_tolerates_missing_fields() {
        let parsed: SignResponse = serde_json::from_str(r#"{"presignKey": "k"}"#).unwrap();
        assert_eq!(parsed.presign_url, None);
        assert_eq!(parsed.presign_key.as_deref(), Some("k"));
    }
}
