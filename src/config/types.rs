//! Configuration types.
//!
//! This module defines the library configuration and the enums shared with the CLI.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

use crate::config::constants::{
    DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, INVESTIGATE_API_BASE, POLL_INTERVAL,
    TOP_DOMAINS_TTL,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use crawlerbox::Config;
///
/// let config = Config {
///     mailbox_url: Some("https://reports.example.com/api".to_string()),
///     investigate_token: Some("token".to_string()),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,

    /// HTTP User-Agent header value
    pub user_agent: String,

    /// Period between the starts of two background ingestion cycles
    pub poll_interval: Duration,

    /// Base URL of the reported-email mailbox API
    pub mailbox_url: Option<String>,

    /// Bearer token for the mailbox API
    pub mailbox_token: Option<String>,

    /// Base URL of the investigation API
    pub investigate_url: String,

    /// Bearer token for the investigation API
    pub investigate_token: Option<String>,

    /// PEM certificate trusted in addition to the system roots, for the investigation API only
    pub investigate_ca_cert: Option<PathBuf>,

    /// Accept any certificate from the investigation API (opt-in, logs a warning)
    pub insecure_investigate_tls: bool,

    /// How long a top-domains snapshot stays fresh
    pub top_domains_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            poll_interval: POLL_INTERVAL,
            mailbox_url: None,
            mailbox_token: None,
            investigate_url: INVESTIGATE_API_BASE.to_string(),
            investigate_token: None,
            investigate_ca_cert: None,
            insecure_investigate_tls: false,
            top_domains_ttl: TOP_DOMAINS_TTL,
        }
    }
}
