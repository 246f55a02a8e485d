use super::{
    auth::{ServiceAccountCredentials, ServiceAccountTokenSource},
    gcs::GcsObjectStore,
    traits::ObjectStore,
};
use crate::{
    config::StorageConfig,
    data_url,
    error::{Result, StudioError},
};
use rand::Rng;
use reqwest::Client;
use std::sync::Arc;

const OBJECT_PREFIX: &str = "generated";
const SUFFIX_LEN: usize = 11;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// `generated/{unix millis}-{random base36}.{ext}`
pub fn object_path(extension: &str) -> String {
    format!(
        "{}/{}-{}.{}",
        OBJECT_PREFIX,
        chrono::Utc::now().timestamp_millis(),
        random_suffix(),
        extension
    )
}

/// Server side of the Storage Relay: decodes a data URL and writes it to
/// object storage under a fresh key.
#[derive(Clone)]
pub struct UploadService {
    store: Arc<dyn ObjectStore>,
}

impl UploadService {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Builds the Cloud Storage backend from configuration. Fails with a
    /// configuration error naming every missing key.
    pub fn from_config(config: &StorageConfig, client: Client) -> Result<Self> {
        config.ensure_complete()?;

        let credentials = ServiceAccountCredentials::from_json(&config.credentials_json()?)?;
        let bucket = config
            .bucket_name
            .clone()
            .ok_or_else(|| StudioError::ConfigError(StorageConfig::missing_keys_message(&config.missing_keys())))?;

        log::info!(
            "☁️  Upload relay using bucket {} (project {})",
            bucket,
            config.project_id.as_deref().unwrap_or("unknown")
        );

        let tokens = Arc::new(ServiceAccountTokenSource::new(credentials, client.clone()));
        let store = GcsObjectStore::new(client, config.api_base.clone(), bucket, tokens);
        Ok(Self::new(Arc::new(store)))
    }

    pub fn bucket(&self) -> &str {
        self.store.bucket()
    }

    /// Stores the image and returns its public URL.
    pub async fn store(&self, image: &str) -> Result<String> {
        if image.trim().is_empty() {
            return Err(StudioError::ValidationError(
                "Missing or invalid image (base64 data URL)".into(),
            ));
        }

        let extension = data_url::image_extension(image);
        let content_type = format!("image/{}", extension);
        let bytes = data_url::decode_base64(data_url::base64_payload(image))
            .map_err(|e| StudioError::ValidationError(e.to_string()))?;
        let path = object_path(extension);

        let stored = self.store.put_object(&path, bytes, &content_type).await?;

        if let Err(e) = self.store.make_public(&path).await {
            log::warn!(
                "⚠️  makePublic failed (bucket may restrict public access): {}",
                e
            );
        }

        Ok(stored.public_url())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::StoredObject;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory store recording every write.
    #[derive(Default)]
    pub(crate) struct RecordingStore {
        pub(crate) objects: Mutex<Vec<(StoredObject, Vec<u8>)>>,
        pub(crate) deny_public: bool,
    }

    #[async_trait]
    impl ObjectStore for RecordingStore {
        fn bucket(&self) -> &str {
            "studio-bucket"
        }

        async fn put_object(
            &self,
            path: &str,
            bytes: Vec<u8>,
            content_type: &str,
        ) -> Result<StoredObject> {
            let object = StoredObject {
                bucket: self.bucket().to_string(),
                path: path.to_string(),
                content_type: content_type.to_string(),
            };
            self.objects
                .lock()
                .unwrap()
                .push((object.clone(), bytes));
            Ok(object)
        }

        async fn make_public(&self, _path: &str) -> Result<()> {
            if self.deny_public {
                Err(StudioError::StorageError("public access prevention".into()))
            } else {
                Ok(())
            }
        }
    }

    fn is_base36(s: &str) -> bool {
        s.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
    }

    #[test]
    fn object_path_shape() {
        let path = object_path("webp");
        let name = path.strip_prefix("generated/").unwrap();
        let (stem, ext) = name.rsplit_once('.').unwrap();
        let (millis, suffix) = stem.split_once('-').unwrap();
        assert_eq!(ext, "webp");
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(is_base36(suffix));
    }

    #[tokio::test]
    async fn stores_decoded_bytes_with_detected_type() {
        let store = Arc::new(RecordingStore::default());
        let service = UploadService::new(store.clone());

        let url = service.store("data:image/jpeg;base64,aGVsbG8=").await.unwrap();

        let objects = store.objects.lock().unwrap();
        let (object, bytes) = &objects[0];
        assert_eq!(bytes, b"hello");
        assert_eq!(object.content_type, "image/jpeg");
        assert!(object.path.ends_with(".jpeg"));
        assert_eq!(
            url,
            format!("https://storage.googleapis.com/studio-bucket/{}", object.path)
        );
    }

    #[tokio::test]
    async fn missing_mime_defaults_to_png() {
        let store = Arc::new(RecordingStore::default());
        let service = UploadService::new(store.clone());

        let url = service.store("data:;base64,aGVsbG8=").await.unwrap();
        assert!(url.ends_with(".png"));
        assert_eq!(store.objects.lock().unwrap()[0].0.content_type, "image/png");
    }

    #[tokio::test]
    async fn unpadded_base64_is_accepted() {
        let store = Arc::new(RecordingStore::default());
        let service = UploadService::new(store.clone());

        service.store("data:image/png;base64,aGVsbG8").await.unwrap();
        assert_eq!(store.objects.lock().unwrap()[0].1, b"hello");
    }

    #[tokio::test]
    async fn make_public_failure_is_not_fatal() {
        let store = Arc::new(RecordingStore {
            deny_public: true,
            ..Default::default()
        });
        let service = UploadService::new(store);

        let url = service.store("data:image/png;base64,aGVsbG8=").await.unwrap();
        assert!(url.starts_with("https://storage.googleapis.com/studio-bucket/generated/"));
    }

    #[tokio::test]
    async fn empty_or_undecodable_image_is_rejected() {
        let service = UploadService::new(Arc::new(RecordingStore::default()));
        assert!(matches!(
            service.store("").await,
            Err(StudioError::ValidationError(_))
        ));
        assert!(matches!(
            service.store("data:image/png;base64,@@@").await,
            Err(StudioError::ValidationError(_))
        ));
    }

    #[test]
    fn from_config_reports_missing_keys() {
        let err = UploadService::from_config(&StorageConfig::new(), Client::new())
            .err()
            .unwrap();
        let message = err.to_string();
        assert!(message.contains("GOOGLE_CLOUD_PROJECT_ID"));
        assert!(message.contains("GOOGLE_CLOUD_BUCKET_NAME"));
        assert!(message.contains("GOOGLE_CLOUD_KEY_JSON"));
    }

    #[test]
    fn from_config_rejects_invalid_key_json() {
        let config = StorageConfig::new()
            .with_project("p")
            .with_bucket("b")
            .with_key_json("not json");
        let err = UploadService::from_config(&config, Client::new()).err().unwrap();
        assert_eq!(err.to_string(), "Configuration error: Invalid GOOGLE_CLOUD_KEY_JSON");
    }
}
