use crate::{
    data_url,
    error::{Result, StudioError},
    models::{
        AspectRatio, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
        GoogleErrorEnvelope, ImageAsset, ImageConfig, Part,
    },
};
use reqwest::Client;

pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Builds a provider error from a non-2xx Google API response, preferring the
/// `error.message` of the standard envelope over the raw body.
pub(crate) fn google_error(status: u16, body: &str) -> StudioError {
    let message = serde_json::from_str::<GoogleErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| {
            let status_name = envelope.error.status;
            envelope.error.message.map(|message| match status_name {
                Some(name) if !message.contains(&name) => format!("{} ({})", message, name),
                _ => message,
            })
        })
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                body.chars().take(500).collect()
            }
        });
    StudioError::provider(status, message)
}

/// Client for the conversational image models (`:generateContent`).
#[derive(Clone)]
pub struct GeminiImageClient {
    client: Client,
    base_url: String,
}

impl GeminiImageClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Sends the reference images followed by the prompt and returns the first
    /// inline image of the reply as a data URL. The aspect ratio is only sent
    /// when given; image-to-image inputs are already letterboxed.
    pub async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        images: &[ImageAsset],
        prompt: &str,
        aspect_ratio: Option<AspectRatio>,
    ) -> Result<String> {
        let mut parts: Vec<Part> = images
            .iter()
            .map(|image| Part::inline(image.mime_type(), image.base64_data()))
            .collect();
        parts.push(Part::text(prompt));

        let request = GenerateContentRequest {
            contents: vec![Content { parts }],
            generation_config: aspect_ratio.map(|ratio| GenerationConfig {
                image_config: ImageConfig {
                    aspect_ratio: ratio.as_str().to_string(),
                },
            }),
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        );

        log::info!(
            "🎨 Generating image with model: {} ({} reference image(s))",
            model,
            images.len()
        );

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| StudioError::RequestError(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            log::error!("❌ Gemini API returned {}: {}", status, body);
            return Err(google_error(status.as_u16(), &body));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
        let inline = parsed.first_inline_image().ok_or_else(|| {
            StudioError::ContentMissing("No image data found in the API response.".into())
        })?;

        Ok(data_url::wrap_base64(
            inline.mime_type.as_deref().unwrap_or("image/png"),
            &inline.data,
        ))
    }
}
