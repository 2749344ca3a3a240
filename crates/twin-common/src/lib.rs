//! Twin Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging, and error handling for the Twin workspace.
//!
//! # Overview
//!
//! - **Types**: the ingestion lifecycle vocabulary (`TaskId`, `Phase`,
//!   `FailureKind`, `ProgressEvent`) shared by every client of the backend
//! - **Logging**: `tracing` subscriber setup driven by `LogConfig`
//! - **Error Handling**: `TwinError` for malformed shared values
//!
//! # Example
//!
//! ```
//! use twin_common::types::{advance_progress, Phase, TaskId};
//!
//! let id = TaskId::new("t1").unwrap();
//! assert_eq!(id.as_str(), "t1");
//! assert!(Phase::Processing.can_advance_to(Phase::Succeeded));
//! assert_eq!(advance_progress(85, 10, 90, None), 90);
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{Result, TwinError};
pub use types::{FailureKind, Phase, ProgressEvent, TaskId};
