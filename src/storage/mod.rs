pub mod auth;
pub mod gcs;
pub mod relay;
pub mod traits;
pub mod upload;

pub use auth::{ServiceAccountCredentials, ServiceAccountTokenSource, StaticTokenSource};
pub use gcs::GcsObjectStore;
pub use relay::RelayClient;
pub use traits::{ObjectStore, TokenSource};
pub use upload::UploadService;
