use thiserror::Error;

#[derive(Debug, Error)]
pub enum GradebookError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl GradebookError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// IPC error code for this condition.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "bad_params",
            Self::NotFound { .. } => "not_found",
            Self::Storage(_) => "db_query_failed",
        }
    }
}

pub type Result<T> = std::result::Result<T, GradebookError>;
