use std::collections::HashMap;

use tokio::sync::RwLock;

use super::{RepositoryError, StateStore};

#[derive(Default)]
pub struct InMemoryStateStore {
    blobs: RwLock<HashMap<String, String>>,
}

impl InMemoryStateStore {
    pub fn with_blob(key: impl Into<String>, blob: impl Into<String>) -> Self {
        Self { blobs: RwLock::new(HashMap::from([(key.into(), blob.into())])) }
    }
}

#[async_trait::async_trait]
impl StateStore for InMemoryStateStore {
    async fn load(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let blobs = self.blobs.read().await;
        Ok(blobs.get(key).cloned())
    }

    async fn save(&self, key: &str, blob: &str) -> Result<(), RepositoryError> {
        let mut blobs = self.blobs.write().await;
        blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::repositories::{InMemoryStateStore, StateStore};

    #[tokio::test]
    async fn in_memory_store_round_trip() {
        let store = InMemoryStateStore::default();
        assert_eq!(store.load("q2d.workflow_state.v1").await.expect("load"), None);

        store.save("q2d.workflow_state.v1", "{\"items\":[]}").await.expect("save");
        store
            .save("q2d.workflow_state.v1", "{\"items\":[],\"activityLog\":[]}")
            .await
            .expect("save");

        let found = store.load("q2d.workflow_state.v1").await.expect("load");
        assert_eq!(found.as_deref(), Some("{\"items\":[],\"activityLog\":[]}"));
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let store = InMemoryStateStore::with_blob("a", "1");
        store.save("b", "2").await.expect("save");

        assert_eq!(store.load("a").await.expect("load").as_deref(), Some("1"));
        assert_eq!(store.load("b").await.expect("load").as_deref(), Some("2"));
    }
}
