use crate::{
    config::RelayConfig,
    error::{Result, StudioError},
    models::{ErrorResponse, UploadRequest, UploadResponse},
};
use reqwest::Client;

/// Client side of the Storage Relay: hands a data URL to the upload endpoint
/// and gets back a public URL, without ever touching cloud credentials.
#[derive(Clone)]
pub struct RelayClient {
    client: Client,
    endpoint: String,
}

impl RelayClient {
    pub fn new(client: Client, config: &RelayConfig) -> Self {
        Self {
            client,
            endpoint: config.upload_endpoint(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn persist(&self, data_url: &str) -> Result<String> {
        log::info!("📤 Uploading image ({} chars) to {}", data_url.len(), self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&UploadRequest {
                image: data_url.to_string(),
            })
            .send()
            .await
            .map_err(|e| StudioError::RequestError(format!("Upload request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|body| body.error)
                .ok()
                .filter(|error| !error.is_empty())
                .unwrap_or_else(|| format!("Upload failed ({})", status.as_u16()));
            return Err(StudioError::StorageError(message));
        }

        let body: UploadResponse = response.json().await.map_err(|e| {
            StudioError::SerializationError(format!("Invalid upload response: {}", e))
        })?;
        log::info!("✅ Image available at {}", body.url);
        Ok(body.url)
    }
}
