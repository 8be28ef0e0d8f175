//! HTTP transport for the upload coordinator, backed by `reqwest`.
//!
//! Relative endpoints (`/api/presigned-url`) are resolved against an optional
//! base URL; absolute URLs such as presigned PUT targets are used unchanged.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};

use audio_record_core::models::error::RecorderError;
use audio_record_core::traits::upload_transport::{TransportResponse, UploadTransport};

pub struct ReqwestTransport {
    client: Client,
    base_url: Option<String>,
}

impl ReqwestTransport {
    pub fn new(base_url: Option<&str>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Transport whose requests give up after `timeout`.
    pub fn with_timeout(base_url: Option<&str>, timeout: Duration) -> Result<Self, RecorderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RecorderError::ConfigurationFailed(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: Option<&str>) -> Self {
        Self {
            client,
            base_url: base_url.map(|b| b.trim_end_matches('/').to_string()),
        }
    }

    pub fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        match self.base_url {
            Some(ref base) => format!("{}/{}", base, url.trim_start_matches('/')),
            None => url.to_string(),
        }
    }

    async fn collect(response: Response) -> Result<TransportResponse, String> {
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| format!("failed to read response body: {}", e))?;
        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[async_trait]
impl UploadTransport for ReqwestTransport {
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<TransportResponse, String> {
        let url = self.resolve(url);
        log::debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| format!("POST {} failed: {}", url, e))?;
        Self::collect(response).await
    }

    async fn put_bytes(&self, url: &str, content_type: &str, body: Vec<u8>) -> Result<TransportResponse, String> {
        let url = self.resolve(url);
        log::debug!("PUT {} ({} bytes, {})", url, body.len(), content_type);
        let response = self
            .client
            .put(&url)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| format!("PUT {} failed: {}", url, e))?;
        Self::collect(response).await
    }
}
