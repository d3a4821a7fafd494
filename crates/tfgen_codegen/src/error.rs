//! Error types for code generation.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for code generation operations.
pub type CodegenResult<T> = Result<T, CodegenError>;

/// Errors that abort a compilation run.
#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("Undeclared {kind} type {type_name} in module {module}")]
    UndeclaredResourceType {
        kind: &'static str,
        type_name: String,
        module: String,
    },

    #[error("Value at {path} does not match schema: expected {expected}, found {found}")]
    ShapeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Unknown field {field} at {path}")]
    UnknownField { path: String, field: String },

    #[error("Unresolved provider value for {resource_type} ({union}): {reason}")]
    UnresolvedUnion {
        resource_type: String,
        union: String,
        reason: String,
    },

    #[error("Provider value at {path} could not be resolved: {source}")]
    Resolution {
        path: String,
        #[source]
        source: Box<CodegenError>,
    },

    #[error("Provider value at {path} still unresolved after {depth} resolution steps")]
    ResolutionDepthExceeded { path: String, depth: usize },

    #[error("{kind} {type_name}.{name} declared by both {first} and {second}")]
    NameCollision {
        kind: &'static str,
        type_name: String,
        name: String,
        first: String,
        second: String,
    },

    #[error("Invalid module document {path:?}: {message}")]
    InvalidModule { path: PathBuf, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Schema error: {0}")]
    Schema(#[from] tfgen_schema::SchemaError),
}
