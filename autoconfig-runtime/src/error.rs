//! Error types for the profile runtime.

use autoconfig_model::ModelError;
use autoconfig_storage::StorageError;
use thiserror::Error;

/// Result type for runtime operations.
pub type ProfileResult<T> = Result<T, ProfileError>;

/// Errors that can occur while binding, persisting or accessing profiles.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The profile type has not been initialized in this registry.
    #[error("profile not registered: {0}")]
    NotRegistered(&'static str),

    /// The process-wide registry already exists.
    #[error("global profile registry already installed")]
    GlobalInstalled,

    /// No accessor with this name exists on the profile.
    #[error("unknown accessor {accessor} on profile {profile}")]
    UnknownAccessor { profile: String, accessor: String },

    /// Two fields of one profile derive the same accessor name.
    #[error("duplicate accessor {accessor} on profile {profile}")]
    DuplicateAccessor { profile: String, accessor: String },

    /// A field descriptor cannot be bound.
    #[error("invalid field {field:?} on profile {profile}: {reason}")]
    InvalidField {
        profile: String,
        field: String,
        reason: String,
    },

    /// A typed accessor read asked for an incompatible type.
    #[error("accessor {accessor} holds {actual}, cannot read it as {expected}")]
    TypeMismatch {
        accessor: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Indexed container operation outside the current bounds.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML (de)serialization error.
    #[error("XML error: {0}")]
    Xml(String),

    /// Field value conversion or owner save error.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Backing file error.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
