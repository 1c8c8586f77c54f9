//! Error types for the model store

use thiserror::Error;

use cardstock_schema::SchemaError;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in model store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// An engine check failed: unknown model, invalid definition or payload,
    /// or a guarded mutation. Passed through untouched so callers format all
    /// engine errors one way.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Card not found
    #[error("card not found: {id}")]
    CardNotFound { id: String },

    /// Another model already uses the name
    #[error("model name already in use: {name}")]
    DuplicateName { name: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl StoreError {
    /// The engine error, when this wraps one.
    pub fn schema_error(&self) -> Option<&SchemaError> {
        match self {
            Self::Schema(err) => Some(err),
            _ => None,
        }
    }
}
