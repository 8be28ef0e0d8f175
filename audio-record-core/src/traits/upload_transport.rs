use async_trait::async_trait;

/// Status and raw body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The HTTP client used by the upload coordinator.
///
/// `Err` means the request never produced a response (DNS, connect, TLS...).
/// Non-2xx responses are returned as `Ok` and judged by the caller.
///
/// Default implementation: `ReqwestTransport` (audio-record-backends).
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// `POST {url}` with a JSON body.
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<TransportResponse, String>;

    /// `PUT {url}` with `Content-Type: {content_type}` and a raw body.
    async fn put_bytes(&self, url: &str, content_type: &str, body: Vec<u8>) -> Result<TransportResponse, String>;
}
