//! Error types for the profile model.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while reading or writing field values.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A field value could not be converted to or from JSON.
    #[error("field {field}: {source}")]
    Value {
        field: String,
        #[source]
        source: serde_json::Error,
    },

    /// Generic serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A save routed through a [`ProfileOwner`](crate::ProfileOwner) failed.
    #[error("save failed: {0}")]
    Save(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ModelError {
    pub(crate) fn value(field: &str, source: serde_json::Error) -> Self {
        Self::Value {
            field: field.to_string(),
            source,
        }
    }
}
