use super::{RecordStore, StoreError, run_cancellable};
use ::redis::AsyncCommands;
use ::redis::aio::ConnectionManager;
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Prefix of the hash holding one owner's records.
const OWNER_KEY_PREFIX: &str = "todo-";

fn owner_key(owner: &str) -> String {
    format!("{OWNER_KEY_PREFIX}{owner}")
}

/// [`RecordStore`] keeping each owner's records in a Redis hash named `todo-{owner}`.
#[derive(Clone)]
pub struct RedisRecordStore {
    connection: ConnectionManager,
    timeout: Duration,
    cancellation: CancellationToken,
}

impl RedisRecordStore {
    /// Connects to the Redis instance at `redis_url`.
    ///
    /// Every later operation is bounded by `timeout` and fails once
    /// `cancellation` is cancelled.
    #[tracing::instrument(skip(cancellation))]
    pub async fn connect(
        redis_url: &str,
        timeout: Duration,
        cancellation: CancellationToken,
    ) -> Result<Self, StoreError> {
        let client = ::redis::Client::open(redis_url).map_err(transport)?;
        let connection = client
            .get_connection_manager()
            .await
            .map_err(transport)?;
        Ok(Self {
            connection,
            timeout,
            cancellation,
        })
    }

    async fn execute<T, F>(&self, operation: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, ::redis::RedisError>>,
    {
        run_cancellable(&self.cancellation, async {
            match tokio::time::timeout(self.timeout, operation).await {
                Ok(result) => result.map_err(transport),
                Err(_) => Err(StoreError::Transport(format!(
                    "operation timed out after {:?}",
                    self.timeout
                ))),
            }
        })
        .await
    }
}

fn transport(error: ::redis::RedisError) -> StoreError {
    StoreError::Transport(error.to_string())
}

#[async_trait]
impl RecordStore for RedisRecordStore {
    #[tracing::instrument(skip(self, value))]
    async fn set_field(&self, owner: &str, field: &str, value: String) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        self.execute(connection.hset::<_, _, _, ()>(owner_key(owner), field, value))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn get_field(&self, owner: &str, field: &str) -> Result<String, StoreError> {
        let mut connection = self.connection.clone();
        let value: Option<String> = self
            .execute(connection.hget(owner_key(owner), field))
            .await?;
        value.ok_or_else(|| StoreError::NotFound {
            owner: owner.to_string(),
            field: field.to_string(),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn get_all_fields(&self, owner: &str) -> Result<HashMap<String, String>, StoreError> {
        let mut connection = self.connection.clone();
        self.execute(connection.hgetall(owner_key(owner))).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_field(&self, owner: &str, field: &str) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        self.execute(connection.hdel::<_, _, ()>(owner_key(owner), field))
            .await
    }
}
