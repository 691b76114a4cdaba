use super::{RecordStore, StoreError, run_cancellable};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// [`RecordStore`] kept entirely in process memory.
///
/// Honours the same contract as the Redis store, cancellation included, so
/// the layers above can be exercised without a running Redis.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    partitions: RwLock<HashMap<String, HashMap<String, String>>>,
    cancellation: CancellationToken,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose operations fail once `cancellation` is cancelled.
    pub fn with_cancellation(cancellation: CancellationToken) -> Self {
        Self {
            partitions: RwLock::default(),
            cancellation,
        }
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn set_field(&self, owner: &str, field: &str, value: String) -> Result<(), StoreError> {
        run_cancellable(&self.cancellation, async {
            self.partitions
                .write()
                .await
                .entry(owner.to_string())
                .or_default()
                .insert(field.to_string(), value);
            Ok(())
        })
        .await
    }

    async fn get_field(&self, owner: &str, field: &str) -> Result<String, StoreError> {
        run_cancellable(&self.cancellation, async {
            self.partitions
                .read()
                .await
                .get(owner)
                .and_then(|fields| fields.get(field))
                .cloned()
                .ok_or_else(|| StoreError::NotFound {
                    owner: owner.to_string(),
                    field: field.to_string(),
                })
        })
        .await
    }

    async fn get_all_fields(&self, owner: &str) -> Result<HashMap<String, String>, StoreError> {
        run_cancellable(&self.cancellation, async {
            Ok(self
                .partitions
                .read()
                .await
                .get(owner)
                .cloned()
                .unwrap_or_default())
        })
        .await
    }

    async fn delete_field(&self, owner: &str, field: &str) -> Result<(), StoreError> {
        run_cancellable(&self.cancellation, async {
            let mut partitions = self.partitions.write().await;
            if let Some(fields) = partitions.get_mut(owner) {
                fields.remove(field);
                if fields.is_empty() {
                    partitions.remove(owner);
                }
            }
            Ok(())
        })
        .await
    }
}
