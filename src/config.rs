use crate::error::{Result, StudioError};
use std::env;

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_FAST_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_PRO_MODEL: &str = "gemini-3-pro-image-preview";
pub const DEFAULT_IMAGEN_MODEL: &str = "imagen-4.0-generate-001";
pub const DEFAULT_QWEN_GATEWAY_URL: &str =
    "https://gateway.pixazo.ai/qwen-image-layered/v1/qwen-image-layered-request";
pub const DEFAULT_UPLOAD_API_URL: &str = "http://localhost:3001";
pub const DEFAULT_GCS_API_BASE: &str = "https://storage.googleapis.com";
pub const DEFAULT_PORT: u16 = 3001;

pub const PROJECT_ID_KEY: &str = "GOOGLE_CLOUD_PROJECT_ID";
pub const BUCKET_NAME_KEY: &str = "GOOGLE_CLOUD_BUCKET_NAME";
pub const KEY_JSON_KEY: &str = "GOOGLE_CLOUD_KEY_JSON";
pub const KEY_FILE_KEY: &str = "GOOGLE_CLOUD_KEY_FILE";

fn env_any(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| env::var(key).ok())
        .find(|value| !value.trim().is_empty())
}

/// Which model family serves `fast` text-to-image requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FastTextBackend {
    /// The conversational image model, same as every other request.
    #[default]
    Gemini,
    /// The dedicated image-synthesis model family.
    Imagen,
}

impl FastTextBackend {
    fn from_env_value(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "imagen" => FastTextBackend::Imagen,
            _ => FastTextBackend::Gemini,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub fast_model: String,
    pub pro_model: String,
    pub imagen_model: String,
    pub fast_text_backend: FastTextBackend,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            base_url: DEFAULT_GEMINI_API_BASE.to_string(),
            fast_model: DEFAULT_FAST_MODEL.to_string(),
            pro_model: DEFAULT_PRO_MODEL.to_string(),
            imagen_model: DEFAULT_IMAGEN_MODEL.to_string(),
            fast_text_backend: FastTextBackend::Gemini,
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        GeminiConfig {
            api_key: env_any(&["API_KEY", "GEMINI_API_KEY"]),
            base_url: env_any(&["GEMINI_API_BASE"]).unwrap_or(defaults.base_url),
            fast_text_backend: env_any(&["GEMINI_FAST_TEXT_BACKEND"])
                .map(|v| FastTextBackend::from_env_value(&v))
                .unwrap_or_default(),
            ..defaults
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_models(mut self, fast: impl Into<String>, pro: impl Into<String>) -> Self {
        self.fast_model = fast.into();
        self.pro_model = pro.into();
        self
    }

    pub fn with_imagen_model(mut self, model: impl Into<String>) -> Self {
        self.imagen_model = model.into();
        self
    }

    pub fn with_fast_text_backend(mut self, backend: FastTextBackend) -> Self {
        self.fast_text_backend = backend;
        self
    }
}

#[derive(Debug, Clone)]
pub struct QwenConfig {
    pub api_key: Option<String>,
    pub gateway_url: String,
}

impl Default for QwenConfig {
    fn default() -> Self {
        QwenConfig {
            api_key: None,
            gateway_url: DEFAULT_QWEN_GATEWAY_URL.to_string(),
        }
    }
}

impl QwenConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        QwenConfig {
            api_key: env_any(&["QWEN_API_KEY", "PIXAZO_API_KEY"]),
            gateway_url: env_any(&["QWEN_GATEWAY_URL"])
                .unwrap_or_else(|| DEFAULT_QWEN_GATEWAY_URL.to_string()),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_gateway_url(mut self, url: impl Into<String>) -> Self {
        self.gateway_url = url.into();
        self
    }
}

/// Where the client side of the Storage Relay posts images.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub upload_api_url: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            upload_api_url: DEFAULT_UPLOAD_API_URL.to_string(),
        }
    }
}

impl RelayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        RelayConfig {
            upload_api_url: env_any(&["UPLOAD_API_URL", "VITE_UPLOAD_API_URL"])
                .unwrap_or_else(|| DEFAULT_UPLOAD_API_URL.to_string()),
        }
    }

    pub fn with_upload_api_url(mut self, url: impl Into<String>) -> Self {
        self.upload_api_url = url.into();
        self
    }

    pub fn upload_endpoint(&self) -> String {
        format!("{}/api/upload", self.upload_api_url.trim_end_matches('/'))
    }
}

/// Cloud Storage settings for the server side of the relay.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub project_id: Option<String>,
    pub bucket_name: Option<String>,
    pub key_json: Option<String>,
    pub key_file: Option<String>,
    pub api_base: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            project_id: None,
            bucket_name: None,
            key_json: None,
            key_file: None,
            api_base: DEFAULT_GCS_API_BASE.to_string(),
        }
    }
}

impl StorageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        StorageConfig {
            project_id: env_any(&[PROJECT_ID_KEY]),
            bucket_name: env_any(&[BUCKET_NAME_KEY]),
            key_json: env_any(&[KEY_JSON_KEY, "GCLOUD_KEY_JSON"]),
            key_file: env_any(&[KEY_FILE_KEY]),
            api_base: env_any(&["GCS_API_BASE"]).unwrap_or_else(|| DEFAULT_GCS_API_BASE.to_string()),
        }
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_bucket(mut self, bucket_name: impl Into<String>) -> Self {
        self.bucket_name = Some(bucket_name.into());
        self
    }

    pub fn with_key_json(mut self, key_json: impl Into<String>) -> Self {
        self.key_json = Some(key_json.into());
        self
    }

    pub fn with_key_file(mut self, path: impl Into<String>) -> Self {
        self.key_file = Some(path.into());
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Required keys that are absent, in a stable order.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.project_id.is_none() {
            missing.push(PROJECT_ID_KEY);
        }
        if self.bucket_name.is_none() {
            missing.push(BUCKET_NAME_KEY);
        }
        if self.key_json.is_none() && self.key_file.is_none() {
            missing.push(KEY_JSON_KEY);
        }
        missing
    }

    pub fn missing_keys_message(missing: &[&str]) -> String {
        format!(
            "Add these environment variables to the upload service: {}. For {}, paste the full \
             service account key JSON contents (or set {} to the key file path).",
            missing.join(", "),
            KEY_JSON_KEY,
            KEY_FILE_KEY
        )
    }

    pub fn ensure_complete(&self) -> Result<()> {
        let missing = self.missing_keys();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(StudioError::ConfigError(Self::missing_keys_message(&missing)))
        }
    }

    /// Service account JSON, inline or read from the key file.
    pub fn credentials_json(&self) -> Result<String> {
        if let Some(json) = &self.key_json {
            return Ok(json.clone());
        }
        match &self.key_file {
            Some(path) => std::fs::read_to_string(path).map_err(|e| {
                StudioError::ConfigError(format!("Failed to read {} ({}): {}", KEY_FILE_KEY, path, e))
            }),
            None => Err(StudioError::ConfigError(Self::missing_keys_message(&[
                KEY_JSON_KEY,
            ]))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub port: Option<u16>,
    pub gemini: GeminiConfig,
    pub qwen: QwenConfig,
    pub relay: RelayConfig,
    pub storage: StorageConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let port = env::var("PORT").ok().and_then(|port| port.parse().ok());

        Config {
            port,
            gemini: GeminiConfig::from_env(),
            qwen: QwenConfig::from_env(),
            relay: RelayConfig::from_env(),
            storage: StorageConfig::from_env(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = config;
        self
    }

    pub fn with_qwen(mut self, config: QwenConfig) -> Self {
        self.qwen = config;
        self
    }

    pub fn with_relay(mut self, config: RelayConfig) -> Self {
        self.relay = config;
        self
    }

    pub fn with_storage(mut self, config: StorageConfig) -> Self {
        self.storage = config;
        self
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }
}
