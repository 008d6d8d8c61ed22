use thiserror::Error;

#[derive(Debug, Error)]
pub enum CartError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Merge aborted after {merged} line(s): {reason}")]
    MergeAborted { merged: usize, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<sqlx::Error> for CartError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => CartError::NotFound(err.to_string()),
            _ => CartError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for CartError {
    fn from(err: serde_json::Error) -> Self {
        CartError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for CartError {
    fn from(err: std::io::Error) -> Self {
        CartError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CartError>;
