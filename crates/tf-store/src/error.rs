//! Error types for tf-store

use thiserror::Error;

/// Store operation errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Connection error (S001)
    #[error("[S001] Store connection failed: {0}")]
    Connection(String),

    /// Pipeline execution error (S002)
    #[error("[S002] Pipeline execution failed: {0}")]
    Execution(String),

    /// Merge key collision (S003)
    #[error("[S003] Merge conflict on '{collection}': {message}")]
    MergeConflict { collection: String, message: String },

    /// Namespace not found (S004)
    #[error("[S004] Namespace not found: {0}")]
    NamespaceNotFound(String),

    /// Malformed stage document (S005)
    #[error("[S005] Invalid stage document: {0}")]
    InvalidStage(String),

    /// Destination already exists (S006)
    #[error("[S006] Collection already exists: {0}")]
    AlreadyExists(String),
}

/// Result type alias for StoreError
pub type StoreResult<T> = Result<T, StoreError>;
