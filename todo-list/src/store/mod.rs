//! Per-owner record storage.
//!
//! Every owner gets its own collection of fields, each field holding one
//! serialized record keyed by the record's identifier. The layers above only
//! ever see the [`RecordStore`] trait, so the Redis backed store used in
//! production can be swapped for [`InMemoryRecordStore`] in tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub mod memory;
pub mod redis;

pub use self::memory::InMemoryRecordStore;
pub use self::redis::RedisRecordStore;

/// Errors raised by a [`RecordStore`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The owner has no field with the requested identifier.
    #[error("field '{field}' not found for owner '{owner}'")]
    NotFound { owner: String, field: String },
    /// The store could not be reached, timed out or was cancelled.
    #[error("store transport failure: {0}")]
    Transport(String),
}

/// Field-level access to per-owner collections.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts or replaces the value of `field` in the owner's collection.
    async fn set_field(&self, owner: &str, field: &str, value: String) -> Result<(), StoreError>;

    /// Reads the value of `field`, failing with [`StoreError::NotFound`] when absent.
    async fn get_field(&self, owner: &str, field: &str) -> Result<String, StoreError>;

    /// Reads every field of the owner's collection. An unknown owner yields an empty map.
    async fn get_all_fields(&self, owner: &str) -> Result<HashMap<String, String>, StoreError>;

    /// Removes `field`. Removing an absent field is not an error.
    async fn delete_field(&self, owner: &str, field: &str) -> Result<(), StoreError>;
}

/// Runs a store operation unless `cancellation` fires first.
///
/// A cancelled token always wins, including when it was cancelled before the
/// operation started.
pub(crate) async fn run_cancellable<T, F>(
    cancellation: &CancellationToken,
    operation: F,
) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::select! {
        biased;
        _ = cancellation.cancelled() => {
            Err(StoreError::Transport("operation cancelled".to_string()))
        }
        result = operation => result,
    }
}
