use super::{PersistenceFailure, Todo, TodoError};
use crate::store::RecordStore;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Persistence of todos, partitioned by owner.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Stores `todo` under a freshly generated ID and returns it with that ID.
    async fn create(&self, owner: &str, todo: Todo) -> Result<Todo, TodoError>;

    /// Returns every todo of the owner, in no particular order.
    async fn get_all(&self, owner: &str) -> Result<Vec<Todo>, TodoError>;

    async fn get_by_id(&self, owner: &str, id: &str) -> Result<Todo, TodoError>;

    /// Removes a todo. Removing a todo that does not exist succeeds.
    async fn delete(&self, owner: &str, id: &str) -> Result<(), TodoError>;

    /// Replaces the todo stored under `id`, creating it when absent.
    async fn update(&self, owner: &str, id: &str, todo: Todo) -> Result<Todo, TodoError>;
}

/// [`TodoRepository`] writing each todo as a JSON document into a [`RecordStore`] field.
pub struct StoreTodoRepository {
    store: Arc<dyn RecordStore>,
}

impl StoreTodoRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

/// Checks that `id` is a well-formed UUID of any version.
pub fn validate_id(id: &str) -> Result<(), TodoError> {
    Uuid::try_parse(id)
        .map(|_| ())
        .map_err(|_| TodoError::InvalidId)
}

fn failure(action: &str, cause: impl Into<PersistenceFailure>) -> PersistenceFailure {
    let cause = cause.into();
    tracing::error!("Failed while {} todo: {}", action, cause);
    cause
}

#[async_trait]
impl TodoRepository for StoreTodoRepository {
    #[tracing::instrument(skip(self, todo))]
    async fn create(&self, owner: &str, mut todo: Todo) -> Result<Todo, TodoError> {
        todo.id = Uuid::new_v4().to_string();
        let value = serde_json::to_string(&todo)
            .map_err(|e| TodoError::WhileCreating(failure("creating", e)))?;

        self.store
            .set_field(owner, &todo.id, value)
            .await
            .map_err(|e| TodoError::WhileCreating(failure("creating", e)))?;

        Ok(todo)
    }

    #[tracing::instrument(skip(self))]
    async fn get_all(&self, owner: &str) -> Result<Vec<Todo>, TodoError> {
        let fields = self
            .store
            .get_all_fields(owner)
            .await
            .map_err(|e| TodoError::WhileRetrieving(failure("retrieving", e)))?;

        // One unreadable record fails the whole listing.
        fields
            .values()
            .map(|value| serde_json::from_str::<Todo>(value))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| TodoError::WhileRetrieving(failure("retrieving", e)))
    }

    #[tracing::instrument(skip(self))]
    async fn get_by_id(&self, owner: &str, id: &str) -> Result<Todo, TodoError> {
        validate_id(id)?;

        let value = self
            .store
            .get_field(owner, id)
            .await
            .map_err(|e| TodoError::WhileRetrieving(failure("retrieving", e)))?;

        serde_json::from_str(&value)
            .map_err(|e| TodoError::WhileRetrieving(failure("retrieving", e)))
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, owner: &str, id: &str) -> Result<(), TodoError> {
        validate_id(id)?;

        self.store
            .delete_field(owner, id)
            .await
            .map_err(|e| TodoError::WhileDeleting(failure("deleting", e)))
    }

    #[tracing::instrument(skip(self, todo))]
    async fn update(&self, owner: &str, id: &str, mut todo: Todo) -> Result<Todo, TodoError> {
        validate_id(id)?;

        todo.id = id.to_string();
        let value = serde_json::to_string(&todo)
            .map_err(|e| TodoError::WhileUpdating(failure("updating", e)))?;

        self.store
            .set_field(owner, id, value)
            .await
            .map_err(|e| TodoError::WhileUpdating(failure("updating", e)))?;

        Ok(todo)
    }
}
