use crate::{error::Result, models::StoredObject};
use async_trait::async_trait;

/// Write-only object storage used by the upload relay. Objects are always
/// written under fresh keys; nothing is read back or modified in place.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    fn bucket(&self) -> &str;

    async fn put_object(&self, path: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<StoredObject>;

    async fn make_public(&self, path: &str) -> Result<()>;
}

#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}
