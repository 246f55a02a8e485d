use crate::{
    config::QwenConfig,
    data_url,
    error::{Result, StudioError},
    models::{DiffusionOptions, DiffusionRequest},
    reconcile::Reconciler,
    storage::RelayClient,
};
use reqwest::{
    header::{CACHE_CONTROL, CONTENT_TYPE},
    Client,
};
use serde_json::Value;

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const ERROR_SNIPPET_LEN: usize = 200;

/// Message for a failed gateway call: `error.message`, then `message`, then a
/// status line. Raw body text is only appended when it is not JSON.
pub(crate) fn gateway_error(status: u16, body: &str) -> StudioError {
    let fallback = format!("Qwen API error ({})", status);

    let message = match serde_json::from_str::<Value>(body) {
        Ok(json) => json
            .pointer("/error/message")
            .and_then(Value::as_str)
            .or_else(|| json.get("message").and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or(fallback),
        Err(_) if !body.is_empty() => {
            let snippet: String = body.chars().take(ERROR_SNIPPET_LEN).collect();
            format!("{}: {}", fallback, snippet)
        }
        Err(_) => fallback,
    };

    StudioError::provider(status, message)
}

/// Diffusion refinement through the Qwen image gateway.
#[derive(Clone)]
pub struct QwenClient {
    client: Client,
    config: QwenConfig,
    relay: RelayClient,
    reconciler: Reconciler,
}

impl QwenClient {
    pub fn new(client: Client, config: &QwenConfig, relay: RelayClient) -> Self {
        Self {
            reconciler: Reconciler::new(client.clone()),
            client,
            config: config.clone(),
            relay,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Runs `image` (a data URL or public URL) through the gateway and returns
    /// the result as a data URL.
    pub async fn diffuse(&self, image: &str, options: &DiffusionOptions) -> Result<String> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            StudioError::ConfigError(
                "QWEN_API_KEY is not set. Add it to your environment to use diffusion.".into(),
            )
        })?;

        let image_url = if data_url::is_data_url(image) {
            log::info!("🌐 Diffusion source is a data URL, publishing it first");
            self.relay.persist(image).await?
        } else {
            image.to_string()
        };

        log::info!(
            "🌀 Diffusing {} (steps={}, guidance={}, acceleration={:?})",
            image_url,
            options.num_inference_steps,
            options.guidance_scale,
            options.acceleration
        );

        let response = self
            .client
            .post(&self.config.gateway_url)
            .header(CONTENT_TYPE, "application/json")
            .header(CACHE_CONTROL, "no-cache")
            .header(SUBSCRIPTION_KEY_HEADER, api_key)
            .json(&DiffusionRequest {
                image_url: &image_url,
                options,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(gateway_error(status.as_u16(), &body));
        }

        let body: Value = response.json().await?;
        self.reconciler.reconcile(&body, options.output_format).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_error_message_wins() {
        let err = gateway_error(401, r#"{"error":{"message":"Invalid subscription key"},"message":"x"}"#);
        assert_eq!(err.user_message(crate::models::QualityTier::Fast), "Invalid subscription key");
    }

    #[test]
    fn top_level_message_is_second() {
        let err = gateway_error(429, r#"{"message":"Rate limit exceeded"}"#);
        assert!(matches!(
            err,
            StudioError::ProviderError { status: 429, ref message } if message == "Rate limit exceeded"
        ));
    }

    #[test]
    fn json_without_message_uses_status_line() {
        let err = gateway_error(500, r#"{"detail":"boom"}"#);
        assert_eq!(err.to_string(), "Provider error (500): Qwen API error (500)");
    }

    #[test]
    fn plain_text_body_is_truncated() {
        let body = "x".repeat(500);
        let err = gateway_error(502, &body);
        let StudioError::ProviderError { message, .. } = err else {
            panic!("expected provider error");
        };
        assert_eq!(message, format!("Qwen API error (502): {}", "x".repeat(200)));
    }

    #[tokio::test]
    async fn missing_key_is_a_config_error() {
        let client = Client::new();
        let relay = RelayClient::new(client.clone(), &crate::config::RelayConfig::new());
        let qwen = QwenClient::new(client, &QwenConfig::new(), relay);

        assert!(!qwen.is_configured());
        let err = qwen
            .diffuse("https://example.com/a.png", &DiffusionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::ConfigError(_)));
    }
}
