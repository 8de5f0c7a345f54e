//! Error types for tf-core

use thiserror::Error;

/// Core error type for Tideflow
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Duplicate model name
    #[error("[E001] Duplicate model name: {name}")]
    DuplicateModel { name: String },

    /// E002: Reference to a model absent from the project
    #[error("[E002] Model '{model}' references unknown model '{reference}'")]
    MissingReference { model: String, reference: String },

    /// E003: Circular dependency detected
    #[error("[E003] Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    /// E004: Ephemeral model addressed by name
    #[error("[E004] Ephemeral model '{name}' has no queryable output: {context}")]
    EphemeralReference { name: String, context: String },

    /// E005: Run/plan selection named a model absent from the project
    #[error("[E005] Target model not found: {name}")]
    TargetNotFound { name: String },

    /// E006: Project rejected at construction
    #[error("[E006] Project '{project}' is invalid:\n{errors}")]
    ProjectInvalid { project: String, errors: String },

    /// E007: Scheduler could not make progress
    #[error("[E007] Cannot schedule models (unsatisfiable dependencies): {stuck}")]
    SchedulerStuck { stuck: String },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
