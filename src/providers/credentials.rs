use crate::error::Result;
use async_trait::async_trait;

/// Host capability that lets the user pick which API key pays for `pro`
/// generations. Hosts without such a picker use [`NoopCredentialSelector`],
/// in which case the configured key is used.
#[async_trait]
pub trait CredentialSelector: Send + Sync {
    async fn has_selected_key(&self) -> bool;

    /// Shows the host's key picker. Resolves once the user has finished.
    async fn open_selection(&self) -> Result<()>;

    /// Key chosen through the picker, if it should override the configured one.
    async fn selected_key(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCredentialSelector;

#[async_trait]
impl CredentialSelector for NoopCredentialSelector {
    async fn has_selected_key(&self) -> bool {
        true
    }

    async fn open_selection(&self) -> Result<()> {
        Ok(())
    }
}
