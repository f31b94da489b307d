//! Error handling and ingestion statistics.
//!
//! This module provides:
//! - Error type definitions for every component
//! - Per-cycle ingestion event counters

mod stats;
mod types;

// Re-export public API
pub use stats::IngestStats;
pub use types::{
    IngestError, IngestEvent, InitializationError, InvestigateError, MailboxError, ParseError,
};
