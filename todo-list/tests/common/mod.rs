use std::time::Duration;
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::{redis, testcontainers};
use todo_list::store::RedisRecordStore;
use tokio_util::sync::CancellationToken;

pub async fn setup_container() -> anyhow::Result<testcontainers::ContainerAsync<redis::Redis>> {
    let container = redis::Redis::default().start().await?;
    Ok(container)
}

pub async fn setup_store(
    container: &testcontainers::ContainerAsync<redis::Redis>,
    cancellation: CancellationToken,
) -> anyhow::Result<RedisRecordStore> {
    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(6379).await?;
    let redis_url = format!("redis://{}:{}/", host, port);
    let store =
        RedisRecordStore::connect(&redis_url, Duration::from_secs(5), cancellation).await?;
    Ok(store)
}
