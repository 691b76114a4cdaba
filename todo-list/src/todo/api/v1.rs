use crate::todo::{Todo, TodoError, TodoRequest, TodoService};
use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

#[derive(Clone)]
pub struct TodoState {
    pub service: Arc<dyn TodoService>,
}

/// API response carrying a single todo.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TodoResponse {
    pub data: Todo,
}

/// API response carrying all todos of an owner.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TodosResponse {
    pub data: Vec<Todo>,
}

/// JSON response for API errors
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error type for todo handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request body is not a valid todo payload.
    #[error("invalid request")]
    InvalidRequest(#[from] JsonRejection),
    #[error(transparent)]
    Todo(#[from] TodoError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Todo(TodoError::TodoIsCompleted) => StatusCode::CONFLICT,
            ApiError::Todo(error) if error.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Todo(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            tracing::error!("Todo request failed: {:?}", self);
        }

        (
            status_code,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Handler for POST /api/todos/{email} - Creates a todo.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/todos/{email}",
    params(("email" = String, Path, description = "Owner of the todos")),
    request_body = TodoRequest,
    responses(
        (status = 201, description = "Todo created", body = TodoResponse),
        (status = 400, description = "Invalid request or dates", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn create_todo_handler(
    State(state): State<TodoState>,
    Path(email): Path<String>,
    payload: Result<Json<TodoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TodoResponse>), ApiError> {
    let Json(request) = payload?;
    let todo = state.service.create(&email, request).await?;
    Ok((StatusCode::CREATED, Json(TodoResponse { data: todo })))
}

/// Handler for GET /api/todos/{email} - Returns all todos of the owner.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/todos/{email}",
    params(("email" = String, Path, description = "Owner of the todos")),
    responses(
        (status = 200, description = "Successfully retrieved todos", body = TodosResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn get_todos_handler(
    State(state): State<TodoState>,
    Path(email): Path<String>,
) -> Result<Json<TodosResponse>, ApiError> {
    let todos = state.service.get_all(&email).await?;
    Ok(Json(TodosResponse { data: todos }))
}

/// Handler for GET /api/todos/{email}/{id} - Returns a single todo.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/todos/{email}/{id}",
    params(
        ("email" = String, Path, description = "Owner of the todo"),
        ("id" = String, Path, description = "UUID of the todo")
    ),
    responses(
        (status = 200, description = "Successfully retrieved todo", body = TodoResponse),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn get_todo_handler(
    State(state): State<TodoState>,
    Path((email, id)): Path<(String, String)>,
) -> Result<Json<TodoResponse>, ApiError> {
    let todo = state.service.get_by_id(&email, &id).await?;
    Ok(Json(TodoResponse { data: todo }))
}

/// Handler for DELETE /api/todos/{email}/{id} - Deletes a todo.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/todos/{email}/{id}",
    params(
        ("email" = String, Path, description = "Owner of the todo"),
        ("id" = String, Path, description = "UUID of the todo")
    ),
    responses(
        (status = 204, description = "Todo deleted"),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn delete_todo_handler(
    State(state): State<TodoState>,
    Path((email, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.service.delete(&email, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for PUT /api/todos/{email}/{id} - Replaces the content of a todo.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    put,
    path = "/api/todos/{email}/{id}",
    params(
        ("email" = String, Path, description = "Owner of the todo"),
        ("id" = String, Path, description = "UUID of the todo")
    ),
    request_body = TodoRequest,
    responses(
        (status = 200, description = "Todo updated", body = TodoResponse),
        (status = 400, description = "Invalid request, id or dates", body = ErrorResponse),
        (status = 409, description = "Todo is completed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn update_todo_handler(
    State(state): State<TodoState>,
    Path((email, id)): Path<(String, String)>,
    payload: Result<Json<TodoRequest>, JsonRejection>,
) -> Result<Json<TodoResponse>, ApiError> {
    let Json(request) = payload?;
    let todo = state.service.update(&email, &id, request).await?;
    Ok(Json(TodoResponse { data: todo }))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create_todo_handler,
        get_todos_handler,
        get_todo_handler,
        delete_todo_handler,
        update_todo_handler
    ),
    tags((name = "Todos", description = "Todo management"))
)]
pub struct TodoApiDoc;

/// Creates and returns the todos API router.
pub fn create_api_router(state: TodoState) -> Router {
    Router::new()
        .route(
            "/todos/{email}",
            get(get_todos_handler).post(create_todo_handler),
        )
        .route(
            "/todos/{email}/{id}",
            get(get_todo_handler)
                .put(update_todo_handler)
                .delete(delete_todo_handler),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use crate::todo::PersistenceFailure;
    use crate::todo::service::MockTodoService;
    use axum::body::Body;
    use axum::http::{Method, Request, header};
    use chrono::{TimeZone, Utc};
    use tower::ServiceExt;

    const ID: &str = "279f4a4e-48dc-4569-83df-8b30ce488599";

    fn store_failure() -> PersistenceFailure {
        PersistenceFailure::Store(StoreError::Transport("down".to_string()))
    }

    fn todo() -> Todo {
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Todo {
            id: ID.to_string(),
            ..Todo::new("name".to_string(), "description".to_string(), date, date)
        }
    }

    fn valid_body() -> String {
        serde_json::json!({
            "name": "name",
            "description": "description",
            "start_date": "2024-01-01 00:00:00",
            "due_date": "2024-01-01 00:00:00",
        })
        .to_string()
    }

    async fn send(
        service: MockTodoService,
        method: Method,
        uri: &str,
        body: Option<String>,
    ) -> (StatusCode, Vec<u8>) {
        let router = create_api_router(TodoState {
            service: Arc::new(service),
        });
        let request = match body {
            Some(body) => Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body)),
            None => Request::builder().method(method).uri(uri).body(Body::empty()),
        }
        .unwrap();

        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    mod handler_tests {
        use super::*;

        #[tokio::test]
        async fn create_passes_owner_and_request_to_the_service() {
            let mut service = MockTodoService::new();
            service
                .expect_create()
                .withf(|owner, request| {
                    owner == "a@b.com"
                        && request.name == "name"
                        && request.start_date == "2024-01-01 00:00:00"
                })
                .times(1)
                .returning(|_, _| Ok(todo()));

            let (status, body) =
                send(service, Method::POST, "/todos/a@b.com", Some(valid_body())).await;

            assert_eq!(status, StatusCode::CREATED);
            let response: TodoResponse = serde_json::from_slice(&body).unwrap();
            assert_eq!(response.data, todo());
        }

        #[tokio::test]
        async fn create_does_not_reach_the_service_with_a_malformed_body() {
            let mut service = MockTodoService::new();
            service.expect_create().never();

            let (status, body) = send(
                service,
                Method::POST,
                "/todos/a@b.com",
                Some("{]".to_string()),
            )
            .await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
            assert_eq!(error.error, "invalid request");
        }

        #[tokio::test]
        async fn get_todos_wraps_the_list_in_data() {
            let mut service = MockTodoService::new();
            service
                .expect_get_all()
                .withf(|owner| owner == "a@b.com")
                .times(1)
                .returning(|_| Ok(vec![todo()]));

            let (status, body) = send(service, Method::GET, "/todos/a@b.com", None).await;

            assert_eq!(status, StatusCode::OK);
            let response: TodosResponse = serde_json::from_slice(&body).unwrap();
            assert_eq!(response.data, vec![todo()]);
        }

        #[tokio::test]
        async fn get_todo_reports_storage_errors_as_internal_server_error() {
            let mut service = MockTodoService::new();
            service
                .expect_get_by_id()
                .withf(|owner, id| owner == "a@b.com" && id == ID)
                .times(1)
                .returning(|_, _| Err(TodoError::WhileRetrieving(store_failure())));

            let (status, body) =
                send(service, Method::GET, &format!("/todos/a@b.com/{ID}"), None).await;

            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
            assert_eq!(error.error, "error while retrieving");
        }

        #[tokio::test]
        async fn delete_returns_no_content() {
            let mut service = MockTodoService::new();
            service
                .expect_delete()
                .withf(|owner, id| owner == "a@b.com" && id == ID)
                .times(1)
                .returning(|_, _| Ok(()));

            let (status, body) =
                send(service, Method::DELETE, &format!("/todos/a@b.com/{ID}"), None).await;

            assert_eq!(status, StatusCode::NO_CONTENT);
            assert!(body.is_empty());
        }

        #[tokio::test]
        async fn update_returns_conflict_for_a_completed_todo() {
            let mut service = MockTodoService::new();
            service
                .expect_update()
                .withf(|owner, id, _| owner == "a@b.com" && id == ID)
                .times(1)
                .returning(|_, _, _| Err(TodoError::TodoIsCompleted));

            let (status, body) = send(
                service,
                Method::PUT,
                &format!("/todos/a@b.com/{ID}"),
                Some(valid_body()),
            )
            .await;

            assert_eq!(status, StatusCode::CONFLICT);
            let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
            assert_eq!(error.error, "the todo cannot be modified if it's completed");
        }
    }

    #[test]
    fn maps_input_errors_to_bad_request() {
        for error in [
            TodoError::InvalidId,
            TodoError::InvalidStartDate,
            TodoError::InvalidDueDate,
            TodoError::StartDateMustBeBeforeDueDate,
        ] {
            assert_eq!(ApiError::from(error).status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn maps_completed_todo_to_conflict() {
        assert_eq!(
            ApiError::from(TodoError::TodoIsCompleted).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn maps_storage_errors_to_internal_server_error() {
        for error in [
            TodoError::WhileCreating(store_failure()),
            TodoError::WhileRetrieving(store_failure()),
            TodoError::WhileDeleting(store_failure()),
            TodoError::WhileUpdating(store_failure()),
        ] {
            assert_eq!(
                ApiError::from(error).status_code(),
                StatusCode::INTERNAL_SERVER_ERROR
            );
        }
    }

    #[tokio::test]
    async fn renders_the_error_message_as_json() {
        let response = ApiError::from(TodoError::TodoIsCompleted).into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.error, "the todo cannot be modified if it's completed");
    }

    #[test]
    fn documents_every_todo_route() {
        let openapi = TodoApiDoc::openapi();

        let paths: Vec<&str> = openapi.paths.paths.keys().map(String::as_str).collect();
        assert_eq!(
            paths,
            vec!["/api/todos/{email}", "/api/todos/{email}/{id}"]
        );
    }
}
