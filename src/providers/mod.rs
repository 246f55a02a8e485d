pub mod adapter;
pub mod credentials;
pub mod gemini_client;
pub mod imagen_client;
pub mod qwen_client;

use crate::{
    config::Config,
    error::Result,
    models::{DiffusionOptions, GenerationRequest, GenerationRequestBuilder, GenerationResult},
    storage::RelayClient,
};
use reqwest::Client;
use std::sync::Arc;

pub use adapter::{ProviderAdapter, Route};
pub use credentials::{CredentialSelector, NoopCredentialSelector};
pub use gemini_client::GeminiImageClient;
pub use imagen_client::ImagenClient;
pub use qwen_client::QwenClient;

/// Entry point for the studio: generation, diffusion refinement and
/// publishing share one HTTP client.
#[derive(Clone)]
pub struct StudioClient {
    adapter: ProviderAdapter,
    qwen: QwenClient,
    relay: RelayClient,
}

impl StudioClient {
    pub fn new(config: &Config) -> Self {
        Self::with_http_client(Client::new(), config)
    }

    pub fn with_http_client(client: Client, config: &Config) -> Self {
        let relay = RelayClient::new(client.clone(), &config.relay);
        Self {
            adapter: ProviderAdapter::new(client.clone(), &config.gemini),
            qwen: QwenClient::new(client, &config.qwen, relay.clone()),
            relay,
        }
    }

    pub fn with_credential_selector(mut self, selector: Arc<dyn CredentialSelector>) -> Self {
        self.adapter = self.adapter.with_credential_selector(selector);
        self
    }

    pub fn adapter(&self) -> &ProviderAdapter {
        &self.adapter
    }

    pub fn qwen(&self) -> &QwenClient {
        &self.qwen
    }

    pub fn relay(&self) -> &RelayClient {
        &self.relay
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.adapter.generate(request).await
    }

    /// Like [`generate`](Self::generate) but folds failures into a
    /// displayable [`GenerationResult`].
    pub async fn generate_result(&self, request: &GenerationRequest) -> GenerationResult {
        GenerationResult::from_outcome(self.generate(request).await, request.tier())
    }

    /// Validates and runs a request in one step. Validation failures come back
    /// as [`GenerationResult::Error`] without any network traffic.
    pub async fn submit(&self, builder: GenerationRequestBuilder) -> GenerationResult {
        let tier = builder.quality_tier();
        match builder.build() {
            Ok(request) => self.generate_result(&request).await,
            Err(e) => GenerationResult::from_outcome(Err(e), tier),
        }
    }

    /// Generates and publishes the image, returning its public URL.
    pub async fn generate_and_persist(&self, request: &GenerationRequest) -> Result<String> {
        let data_url = self.generate(request).await?;
        self.persist(&data_url).await
    }

    /// Runs an existing image through the diffusion gateway.
    pub async fn refine(&self, image: &str, options: &DiffusionOptions) -> Result<String> {
        self.qwen.diffuse(image, options).await
    }

    pub async fn persist(&self, data_url: &str) -> Result<String> {
        self.relay.persist(data_url).await
    }
}
