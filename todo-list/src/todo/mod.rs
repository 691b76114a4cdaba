use crate::store::StoreError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod api;
pub mod repository;
pub mod service;

pub use repository::{StoreTodoRepository, TodoRepository};
pub use service::{TodoService, TodoServiceImpl};

/// Literal format accepted for start and due dates, e.g. `2024-01-01 00:05:00`.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A todo owned by a single caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Todo {
    /// UUID assigned when the todo is created
    pub id: String,
    pub name: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    /// Completed todos can no longer be updated
    pub completed: bool,
}

impl Todo {
    /// Builds a todo that has not been stored yet and therefore has no ID.
    pub fn new(
        name: String,
        description: String,
        start_date: DateTime<Utc>,
        due_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: String::new(),
            name,
            description,
            due_date,
            start_date,
            completed: false,
        }
    }
}

/// Content of a todo as submitted by a caller, for both creation and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TodoRequest {
    pub name: String,
    pub description: String,
    /// Formatted as `YYYY-MM-DD HH:MM:SS`
    pub start_date: String,
    /// Formatted as `YYYY-MM-DD HH:MM:SS`
    pub due_date: String,
}

/// Cause of a failed store round trip.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceFailure {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("malformed todo record: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Error type for todo operations.
#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error("invalid id")]
    InvalidId,
    #[error("start date can not be parsed")]
    InvalidStartDate,
    #[error("due date can not be parsed")]
    InvalidDueDate,
    #[error("start date must be before the due date")]
    StartDateMustBeBeforeDueDate,
    #[error("the todo cannot be modified if it's completed")]
    TodoIsCompleted,
    #[error("error while creating")]
    WhileCreating(#[source] PersistenceFailure),
    #[error("error while retrieving")]
    WhileRetrieving(#[source] PersistenceFailure),
    #[error("error while deleting")]
    WhileDeleting(#[source] PersistenceFailure),
    #[error("error while updating")]
    WhileUpdating(#[source] PersistenceFailure),
}

impl TodoError {
    /// Whether the error was caused by the caller's input or the todo's state,
    /// as opposed to a storage failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TodoError::InvalidId
                | TodoError::InvalidStartDate
                | TodoError::InvalidDueDate
                | TodoError::StartDateMustBeBeforeDueDate
                | TodoError::TodoIsCompleted
        )
    }
}

/// Byte layout of [`DATE_TIME_FORMAT`]; `d` marks a digit, anything else is literal.
const DATE_TIME_SHAPE: &[u8] = b"dddd-dd-dd dd:dd:dd";

/// chrono accepts unpadded fields, signs and extra whitespace, so the fixed
/// width layout is checked first.
fn has_date_time_shape(value: &str) -> bool {
    value.len() == DATE_TIME_SHAPE.len()
        && value
            .bytes()
            .zip(DATE_TIME_SHAPE)
            .all(|(byte, &expected)| match expected {
                b'd' => byte.is_ascii_digit(),
                literal => byte == literal,
            })
}

/// Parses a date in [`DATE_TIME_FORMAT`], reading it as UTC.
pub fn parse_date_time(value: &str) -> Option<DateTime<Utc>> {
    if !has_date_time_shape(value) {
        return None;
    }

    NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT)
        .ok()
        .map(|date_time| date_time.and_utc())
}

/// Parses both dates and checks that the start date does not come after the due date.
///
/// The start date is checked first, so an unparsable start date is reported
/// regardless of the due date.
pub fn validate_dates(
    start_date: &str,
    due_date: &str,
) -> Result<(DateTime<Utc>, DateTime<Utc>), TodoError> {
    let start_date = parse_date_time(start_date).ok_or(TodoError::InvalidStartDate)?;
    let due_date = parse_date_time(due_date).ok_or(TodoError::InvalidDueDate)?;

    if start_date > due_date {
        return Err(TodoError::StartDateMustBeBeforeDueDate);
    }

    Ok((start_date, due_date))
}
