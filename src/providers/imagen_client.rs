use super::gemini_client::{google_error, API_KEY_HEADER};
use crate::{
    data_url,
    error::{Result, StudioError},
    models::{AspectRatio, PredictInstance, PredictParameters, PredictRequest, PredictResponse},
};
use reqwest::Client;

/// Client for the dedicated image-synthesis models (`:predict`).
#[derive(Clone)]
pub struct ImagenClient {
    client: Client,
    base_url: String,
}

impl ImagenClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub async fn predict(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<String> {
        let request = PredictRequest {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: aspect_ratio.as_str().to_string(),
            },
        };

        let url = format!(
            "{}/models/{}:predict",
            self.base_url.trim_end_matches('/'),
            model
        );

        log::info!("🖼️  Synthesizing image with model: {} ({})", model, aspect_ratio);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| StudioError::RequestError(format!("Imagen request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            log::error!("❌ Imagen API returned {}: {}", status, body);
            return Err(google_error(status.as_u16(), &body));
        }

        let parsed: PredictResponse = serde_json::from_str(&body)?;
        let prediction = parsed
            .predictions
            .into_iter()
            .find(|p| p.bytes_base64_encoded.is_some())
            .ok_or_else(|| {
                StudioError::ContentMissing("No image data found in the API response.".into())
            })?;

        let mime_type = prediction
            .mime_type
            .unwrap_or_else(|| "image/png".to_string());
        let payload = prediction.bytes_base64_encoded.unwrap_or_default();

        Ok(data_url::wrap_base64(&mime_type, &payload))
    }
}
