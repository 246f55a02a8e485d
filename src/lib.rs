//! Client-side pipeline for a generative image studio.
//!
//! A prompt and up to five reference images go in; one image comes out as a
//! data URL. Reference images are letterboxed onto a canvas of the requested
//! aspect ratio ([`canvas`]), the request is routed to a Gemini or Imagen model
//! ([`providers`]), odd-shaped provider payloads are folded into a single data
//! URL ([`reconcile`]) and results can be published to Cloud Storage through a
//! small upload relay ([`storage`], [`server`]).
//!
//! ```no_run
//! use genstudio::{AspectRatio, Config, GenerationRequest, StudioClient};
//!
//! # async fn run() -> genstudio::Result<()> {
//! let client = StudioClient::new(&Config::from_env());
//! let request = GenerationRequest::builder("a lighthouse at dusk")
//!     .aspect_ratio(AspectRatio::Widescreen)
//!     .build()?;
//! let data_url = client.generate(&request).await?;
//! println!("{} bytes of data URL", data_url.len());
//! # Ok(())
//! # }
//! ```

pub mod canvas;
pub mod config;
pub mod data_url;
pub mod error;
pub mod logger;
pub mod models;
pub mod providers;
pub mod reconcile;
#[cfg(feature = "server")]
pub mod server;
pub mod storage;

pub use config::{Config, FastTextBackend, GeminiConfig, QwenConfig, RelayConfig, StorageConfig};
pub use error::{Result, StudioError};
pub use models::{
    Acceleration, AspectRatio, DiffusionOptions, GenerationMode, GenerationRequest,
    GenerationResult, ImageAsset, ImageSet, OutputFormat, QualityTier,
};
pub use providers::{CredentialSelector, ProviderAdapter, QwenClient, StudioClient};
pub use reconcile::{ImagePayload, Reconciler};
pub use storage::{ObjectStore, RelayClient, UploadService};
