use super::{
    credentials::{CredentialSelector, NoopCredentialSelector},
    gemini_client::GeminiImageClient,
    imagen_client::ImagenClient,
};
use crate::{
    canvas,
    config::{FastTextBackend, GeminiConfig},
    error::{Result, StudioError},
    logger,
    models::{GenerationMode, GenerationRequest, QualityTier},
};
use reqwest::Client;
use std::sync::Arc;

/// Upstream path a request will take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Conversational { model: String },
    Synthesis { model: String },
}

/// Dispatches a [`GenerationRequest`] to the right upstream model and returns
/// exactly one image as a data URL.
#[derive(Clone)]
pub struct ProviderAdapter {
    config: GeminiConfig,
    gemini: GeminiImageClient,
    imagen: ImagenClient,
    credentials: Arc<dyn CredentialSelector>,
}

impl ProviderAdapter {
    pub fn new(client: Client, config: &GeminiConfig) -> Self {
        Self {
            config: config.clone(),
            gemini: GeminiImageClient::new(client.clone(), config.base_url.clone()),
            imagen: ImagenClient::new(client, config.base_url.clone()),
            credentials: Arc::new(NoopCredentialSelector),
        }
    }

    pub fn with_credential_selector(mut self, selector: Arc<dyn CredentialSelector>) -> Self {
        self.credentials = selector;
        self
    }

    pub fn model_for(&self, tier: QualityTier) -> &str {
        match tier {
            QualityTier::Fast => &self.config.fast_model,
            QualityTier::Pro => &self.config.pro_model,
        }
    }

    pub fn route(&self, mode: GenerationMode, tier: QualityTier) -> Route {
        let use_synthesis = mode == GenerationMode::TextToImage
            && tier == QualityTier::Fast
            && self.config.fast_text_backend == FastTextBackend::Imagen;

        if use_synthesis {
            Route::Synthesis {
                model: self.config.imagen_model.clone(),
            }
        } else {
            Route::Conversational {
                model: self.model_for(tier).to_string(),
            }
        }
    }

    /// Resolves the key for this call. `pro` calls give the host a chance to
    /// pick a key first; otherwise the configured key is used.
    async fn api_key_for(&self, tier: QualityTier) -> Result<String> {
        if tier == QualityTier::Pro {
            if !self.credentials.has_selected_key().await {
                log::info!("🔑 No key selected for the Pro model, opening key selection");
                self.credentials.open_selection().await?;
            }
            if let Some(key) = self.credentials.selected_key().await {
                return Ok(key);
            }
        }

        self.config
            .api_key
            .clone()
            .ok_or_else(|| StudioError::ConfigError("API_KEY environment variable not set".into()))
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let _timer = logger::timer(&format!("generation {}", request.id()));
        let api_key = self.api_key_for(request.tier()).await?;
        let route = self.route(request.mode(), request.tier());

        log::debug!(
            "Request {}: mode={:?} tier={} ratio={} route={:?}",
            request.id(),
            request.mode(),
            request.tier(),
            request.aspect_ratio(),
            route
        );

        let outcome = match (request.mode(), route) {
            (GenerationMode::TextToImage, Route::Synthesis { model }) => {
                self.imagen
                    .predict(&api_key, &model, request.prompt(), request.aspect_ratio())
                    .await
            }
            (GenerationMode::TextToImage, Route::Conversational { model }) => {
                self.gemini
                    .generate_content(
                        &api_key,
                        &model,
                        &[],
                        request.prompt(),
                        Some(request.aspect_ratio()),
                    )
                    .await
            }
            (GenerationMode::ImageToImage, route) => {
                let model = match route {
                    Route::Conversational { model } | Route::Synthesis { model } => model,
                };
                let normalized =
                    canvas::normalize_all(request.images(), request.aspect_ratio().as_str())
                        .await?;
                self.gemini
                    .generate_content(&api_key, &model, &normalized, request.prompt(), None)
                    .await
            }
        };

        if let Err(e) = &outcome {
            log::error!("❌ Generation {} failed: {}", request.id(), e);
            if e.is_permission_denied() && request.tier() == QualityTier::Pro {
                log::warn!("💡 The Pro model may not be enabled for this key; the Fast tier should work");
            }
        }
        outcome
    }
}
