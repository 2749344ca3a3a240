//! Error types for shared Twin values

use thiserror::Error;

/// Result type alias for operations on shared types
pub type Result<T> = std::result::Result<T, TwinError>;

/// Main error type for Twin shared types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TwinError {
    #[error("Invalid task id {0:?}: task ids must be non-empty")]
    InvalidTaskId(String),
}
