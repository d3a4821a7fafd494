//! Error types for the schema model.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while building or loading a schema registry.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Schema source not found: {0}")]
    NotFound(PathBuf),

    #[error("{kind} type {type_name} declared by both {first} and {second}")]
    DuplicateType {
        kind: &'static str,
        type_name: String,
        first: String,
        second: String,
    },

    #[error("{kind} type {type_name} must be a record schema, found {found}")]
    NotARecord {
        kind: &'static str,
        type_name: String,
        found: &'static str,
    },

    #[error("Invalid schema node: {0}")]
    InvalidNode(String),

    #[error("Failed to parse schema document {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
