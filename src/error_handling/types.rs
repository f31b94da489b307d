//! Error type definitions.
//!
//! This module defines the error types returned by initialization, the investigation
//! client, the mailbox, the parser and the ingestion loop, plus the event kinds counted
//! per ingestion cycle.

use std::path::PathBuf;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing an HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// Error reading the pinned investigation certificate.
    #[error("Failed to read certificate {path}: {source}")]
    CertificateReadError {
        /// Path given on the command line
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },

    /// A bearer token could not be turned into a header value.
    #[error("Invalid bearer token: {0}")]
    InvalidTokenError(#[from] reqwest::header::InvalidHeaderValue),

    /// A configured base URL cannot be used.
    #[error("Invalid URL: {0}")]
    InvalidUrlError(#[from] url::ParseError),

    /// A setting required by the selected mode is missing.
    #[error("Missing required setting: {0}")]
    MissingSettingError(&'static str),
}

/// Errors from the investigation API client.
///
/// A non-200 response is not an error: it is logged and reported as an absent result.
#[derive(Error, Debug)]
pub enum InvestigateError {
    /// The request never produced a response (connect failure, timeout, ...).
    #[error("Investigate request failed: {0}")]
    Transport(#[source] ReqwestError),

    /// The response body was not valid JSON.
    #[error("Investigate response is not valid JSON: {0}")]
    Decode(#[source] ReqwestError),

    /// The response lacks a key the query kind depends on.
    #[error("Investigate response is missing key '{0}'")]
    MissingKey(&'static str),

    /// The query-volume response could not be rebuilt into an hourly series.
    #[error("Malformed query-volume response: {0}")]
    MalformedSeries(String),
}

/// Errors from the mailbox collaborator.
#[derive(Error, Debug)]
pub enum MailboxError {
    /// The request never produced a response.
    #[error("Mailbox request failed: {0}")]
    Request(#[source] ReqwestError),

    /// The mailbox answered with a non-success status.
    #[error("Mailbox returned HTTP {0}")]
    Status(u16),

    /// The mailbox payload is not a list of reports.
    #[error("Mailbox returned an unexpected payload: {0}")]
    Decode(#[source] ReqwestError),
}

/// Errors from the parser collaborator.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The raw message is not valid MIME.
    #[error("Invalid MIME message: {0}")]
    Mime(#[from] mailparse::MailParseError),

    /// A parser rejected the message for its own reasons.
    #[error("Message rejected: {0}")]
    Rejected(String),
}

/// Errors that abort an ingestion cycle.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Listing the reports failed.
    #[error(transparent)]
    Mailbox(#[from] MailboxError),

    /// Downloading a report's raw content failed.
    #[error("Failed to fetch raw content of report {id}: {source}")]
    Fetch {
        /// Report identifier
        id: String,
        /// Underlying HTTP failure
        source: ReqwestError,
    },

    /// The raw content URL answered with a non-success status.
    #[error("Raw content of report {id} returned HTTP {status}")]
    FetchStatus {
        /// Report identifier
        id: String,
        /// HTTP status code
        status: u16,
    },

    /// The parser failed on a report.
    #[error("Failed to parse report {id}: {source}")]
    Parse {
        /// Report identifier
        id: String,
        /// Parser failure
        source: ParseError,
    },
}

/// Events counted during an ingestion cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum IngestEvent {
    /// A report was returned by the mailbox
    ReportListed,
    /// A report's raw payload was downloaded
    PayloadFetched,
    /// A report was handed to the parser successfully
    ReportParsed,
    /// Downloading a payload failed
    FetchFailed,
    /// Parsing a payload failed
    ParseFailed,
}
