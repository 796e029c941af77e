//! Crate-wide error taxonomy.

use thiserror::Error as ThisError;

///
/// QviewError
///
/// Stable error taxonomy surfaced by query construction, apply, and
/// materialization. One flat enum is sufficient here: unlike a
/// multi-subsystem database, this crate has a single call graph from
/// query construction through to a written view.
///

#[derive(Debug, ThisError)]
pub enum QviewError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("corrupt encoded query: {0}")]
    CorruptQuery(String),

    #[error("bad handle: {0}")]
    BadHandle(String),

    #[error("storage error: {0}")]
    StorageError(#[from] StoreError),

    #[error("apply failed: {0}")]
    ApplyFailed(String),

    #[error("view materialization failed: {0}")]
    ViewWriteFailed(String),
}

pub type Result<T> = std::result::Result<T, QviewError>;

///
/// StoreError
///
/// Failures raised by a `Container` backend. Wrapped as
/// `QviewError::StorageError` at the engine boundary.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum StoreError {
    #[error("object not found: {path}")]
    NotFound { path: String },

    #[error("object at {path} is not a {expected}")]
    WrongKind { path: String, expected: &'static str },

    #[error("path already exists: {path}")]
    DuplicatePath { path: String },

    #[error("attribute not found: {attr} on {path}")]
    AttributeNotFound { path: String, attr: String },
}
