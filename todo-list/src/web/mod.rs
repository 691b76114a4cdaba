use axum::{Json, Router, routing::get};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::config::Config;
use crate::store::{RecordStore, RedisRecordStore};
use crate::todo::api::v1::{TodoApiDoc, TodoState, create_api_router};
use crate::todo::{StoreTodoRepository, TodoServiceImpl};

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let cancellation = CancellationToken::new();
    let store = RedisRecordStore::connect(
        &config.redis_url(),
        config.store_timeout(),
        cancellation.clone(),
    )
    .await?;
    tracing::info!(
        "Connected to Redis at {}:{}",
        config.redis_host,
        config.redis_port
    );

    let app = create_app(Arc::new(store));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Anything still talking to the store after shutdown fails instead of hanging.
    cancellation.cancel();
    tracing::info!("Web server stopped");
    Ok(())
}

/// Wires store, repository and service together and builds the application router.
pub fn create_app(store: Arc<dyn RecordStore>) -> Router {
    let repository = Arc::new(StoreTodoRepository::new(store));
    let service = Arc::new(TodoServiceImpl::new(repository));
    let todo_state = TodoState { service };

    Router::new()
        .nest("/api", create_api_router(todo_state))
        .route("/health", get(health_check_handler))
        .route("/api-docs/openapi.json", get(openapi_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::new()),
        )
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}

pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(TodoApiDoc::openapi())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", error);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
