use super::traits::{ObjectStore, TokenSource};
use crate::{
    error::{Result, StudioError},
    models::StoredObject,
};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use serde_json::json;
use std::sync::Arc;

/// Cloud Storage backend over the JSON API.
pub struct GcsObjectStore {
    client: Client,
    api_base: String,
    bucket: String,
    tokens: Arc<dyn TokenSource>,
}

impl GcsObjectStore {
    pub fn new(
        client: Client,
        api_base: impl Into<String>,
        bucket: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            tokens,
        }
    }

    fn upload_url(&self) -> String {
        format!("{}/upload/storage/v1/b/{}/o", self.api_base, self.bucket)
    }

    fn acl_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}/acl",
            self.api_base,
            self.bucket,
            urlencoding::encode(path)
        )
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject> {
        let token = self.tokens.access_token().await?;
        let size = bytes.len();

        let response = self
            .client
            .post(self.upload_url())
            .query(&[("uploadType", "media"), ("name", path)])
            .bearer_auth(token)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| StudioError::StorageError(format!("Cloud Storage request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StudioError::StorageError(format!(
                "Cloud Storage upload failed ({}): {}",
                status, body
            )));
        }

        log::info!("📦 Stored {} ({} bytes) in bucket {}", path, size, self.bucket);

        Ok(StoredObject {
            bucket: self.bucket.clone(),
            path: path.to_string(),
            content_type: content_type.to_string(),
        })
    }

    async fn make_public(&self, path: &str) -> Result<()> {
        let token = self.tokens.access_token().await?;

        let response = self
            .client
            .post(self.acl_url(path))
            .bearer_auth(token)
            .json(&json!({ "entity": "allUsers", "role": "READER" }))
            .send()
            .await
            .map_err(|e| StudioError::StorageError(format!("Cloud Storage request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StudioError::StorageError(format!(
                "Failed to make {} public ({}): {}",
                path, status, body
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::auth::StaticTokenSource;

    #[test]
    fn acl_url_encodes_object_name() {
        let store = GcsObjectStore::new(
            Client::new(),
            "https://storage.googleapis.com/",
            "studio-bucket",
            Arc::new(StaticTokenSource::new("t")),
        );
        assert_eq!(
            store.acl_url("generated/1-abc.png"),
            "https://storage.googleapis.com/storage/v1/b/studio-bucket/o/generated%2F1-abc.png/acl"
        );
        assert_eq!(
            store.upload_url(),
            "https://storage.googleapis.com/upload/storage/v1/b/studio-bucket/o"
        );
    }
}
