use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod state_blob;

pub use memory::InMemoryStateStore;
pub use state_blob::SqlStateStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("stored blob for `{key}` does not match its checksum")]
    ChecksumMismatch { key: String },
}

/// Key-value storage for serialized workflow state.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<String>, RepositoryError>;
    async fn save(&self, key: &str, blob: &str) -> Result<(), RepositoryError>;
}

/// Hex blake3 digest stored next to each blob to catch torn or edited rows.
pub fn blob_checksum(blob: &str) -> String {
    blake3::hash(blob.as_bytes()).to_hex().to_string()
}
