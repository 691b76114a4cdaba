use super::{Todo, TodoError, TodoRepository, TodoRequest, validate_dates};
use async_trait::async_trait;
use std::sync::Arc;

/// Business rules around todos.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodoService: Send + Sync {
    async fn create(&self, owner: &str, request: TodoRequest) -> Result<Todo, TodoError>;
    async fn get_all(&self, owner: &str) -> Result<Vec<Todo>, TodoError>;
    async fn get_by_id(&self, owner: &str, id: &str) -> Result<Todo, TodoError>;
    async fn delete(&self, owner: &str, id: &str) -> Result<(), TodoError>;
    async fn update(&self, owner: &str, id: &str, request: TodoRequest)
    -> Result<Todo, TodoError>;
}

pub struct TodoServiceImpl {
    repository: Arc<dyn TodoRepository>,
}

impl TodoServiceImpl {
    pub fn new(repository: Arc<dyn TodoRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl TodoService for TodoServiceImpl {
    /// Creates a new, not yet completed todo.
    ///
    /// # Returns
    ///
    /// The stored todo with its generated ID, or a date validation error.
    #[tracing::instrument(skip(self))]
    async fn create(&self, owner: &str, request: TodoRequest) -> Result<Todo, TodoError> {
        let (start_date, due_date) = validate_dates(&request.start_date, &request.due_date)?;

        let todo = Todo::new(request.name, request.description, start_date, due_date);
        self.repository.create(owner, todo).await
    }

    #[tracing::instrument(skip(self))]
    async fn get_all(&self, owner: &str) -> Result<Vec<Todo>, TodoError> {
        self.repository.get_all(owner).await
    }

    #[tracing::instrument(skip(self))]
    async fn get_by_id(&self, owner: &str, id: &str) -> Result<Todo, TodoError> {
        self.repository.get_by_id(owner, id).await
    }

    /// Deletes a todo. Completed todos may be deleted too.
    #[tracing::instrument(skip(self))]
    async fn delete(&self, owner: &str, id: &str) -> Result<(), TodoError> {
        self.repository.delete(owner, id).await
    }

    /// Replaces the content of an existing todo.
    ///
    /// The dates are validated before the todo is looked up. A completed todo
    /// is left untouched and reported as [`TodoError::TodoIsCompleted`]; any
    /// other todo is rebuilt from `request` with its completion flag reset.
    #[tracing::instrument(skip(self))]
    async fn update(
        &self,
        owner: &str,
        id: &str,
        request: TodoRequest,
    ) -> Result<Todo, TodoError> {
        let (start_date, due_date) = validate_dates(&request.start_date, &request.due_date)?;

        let existing = self.repository.get_by_id(owner, id).await?;
        if existing.completed {
            return Err(TodoError::TodoIsCompleted);
        }

        let todo = Todo {
            id: existing.id,
            ..Todo::new(request.name, request.description, start_date, due_date)
        };
        self.repository.update(owner, id, todo).await
    }
}
