//! Error types for the attune domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each collaborator boundary has its own error type; the pipeline
//! propagates them unchanged inside the top-level [`Error`].

use thiserror::Error;

/// The top-level error type for all attune operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Collaborator errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Persona error: {0}")]
    Persona(#[from] PersonaError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Task data error: {0}")]
    TaskData(#[from] TaskDataError),

    // --- Request lifecycle ---
    #[error("Request cancelled during {stage}")]
    Cancelled { stage: String },

    #[error("{stage} timed out after {timeout_ms}ms")]
    Timeout { stage: String, timeout_ms: u64 },

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to load workspace for {user_id}: {reason}")]
    LoadFailed { user_id: String, reason: String },

    #[error("Failed to save workspace for {user_id}: {reason}")]
    SaveFailed { user_id: String, reason: String },
}

#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("Failed to read persona catalog at {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Invalid persona catalog: {0}")]
    Invalid(String),

    #[error("Domain classification failed: {0}")]
    ClassificationFailed(String),
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Embedding provider not configured")]
    NotConfigured,

    #[error("Embedding generation failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum TaskDataError {
    #[error("Failed to read task payload {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Malformed task payload {path}: {reason}")]
    Malformed { path: String, reason: String },
}
