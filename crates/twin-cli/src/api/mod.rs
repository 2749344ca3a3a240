//! API client module
//!
//! The backend boundary of the ingestion workflow and its HTTP implementation.

pub mod backend;
pub mod client;
pub mod endpoints;
pub mod types;

pub use backend::{IngestBackend, StatusReport, Submission, TransportError};
pub use client::HttpBackend;
