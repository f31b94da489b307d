//! crawlerbox library: reported-phishing ingestion and domain intelligence.
//!
//! Two independent components:
//!
//! - [`Ingestor`]: lists newly reported emails from a [`Mailbox`], downloads each raw
//!   message and hands it to a [`ReportParser`]; either once, or every poll interval
//!   without overlapping cycles.
//! - [`InvestigateClient`]: routes a [`QueryKind`] and a domain to a fixed Umbrella
//!   Investigate endpoint and normalizes the JSON answer.
//!
//! # Example
//!
//! ```no_run
//! use crawlerbox::{Config, InvestigateClient};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     investigate_token: Some("token".to_string()),
//!     ..Default::default()
//! };
//! let client = InvestigateClient::from_config(&config)?;
//! if let Some(series) = client.query_volume("example.com").await? {
//!     for (hour, count) in series.iter() {
//!         println!("{hour}: {count}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime.

#![warn(missing_docs)]

pub mod config;
pub mod error_handling;
pub mod ingest;
pub mod initialization;
pub mod investigate;
pub mod mailbox;
pub mod parser;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel, Opt, RunMode};
pub use error_handling::{IngestError, InvestigateError, MailboxError, ParseError};
pub use ingest::{CycleReport, Ingestor, ReportSelector};
pub use investigate::{InvestigateClient, QueryKind, QueryVolumeSeries, TopDomains};
pub use mailbox::{HttpMailbox, Mailbox, Report};
pub use parser::{MailParser, ParsedReport, ReportParser};
