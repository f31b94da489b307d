//! Command-line options.
//!
//! `Opt` is generated by `clap` and converted into the library [`Config`] plus the
//! [`RunMode`] that decides what the binary does.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use crate::config::constants::{
    DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, INVESTIGATE_API_BASE, POLL_INTERVAL,
    REPORT_DATE_FORMAT, TOP_DOMAINS_TTL,
};
use crate::config::types::{Config, LogFormat, LogLevel};
use crate::ingest::ReportSelector;
use crate::investigate::{limit_suffix, QueryKind};

/// What the binary should do once configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Run ingestion cycles every poll interval until interrupted.
    Background,
    /// Run a single ingestion cycle for the given selector and exit.
    Once(ReportSelector),
    /// Run one investigation query and print the result.
    Query {
        /// Endpoint to call
        kind: QueryKind,
        /// Domain, or the `?limit=` suffix for top-domains
        target: String,
    },
}

/// Command-line options and configuration.
///
/// # Examples
///
/// ```bash
/// # Poll the mailbox every 10 minutes
/// crawlerbox --mailbox-url https://reports.example.com/api
///
/// # Process one reported email and exit
/// crawlerbox --phish_id 8c1f2e
///
/// # Process every report submitted on a given day
/// crawlerbox --date 2024-03-18
///
/// # Query the investigation API
/// crawlerbox --query risk-score --domain example.com
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "crawlerbox",
    about = "Fetches, parses and crawls newly reported phishing emails."
)]
pub struct Opt {
    /// Identifier of the reported email to process
    #[arg(short = 'i', long = "phish_id", conflicts_with = "date")]
    pub phish_id: Option<String>,

    /// Process every email reported on this date (YYYY-MM-DD)
    #[arg(short = 'd', long, value_parser = parse_report_date)]
    pub date: Option<NaiveDate>,

    /// Run a single investigation query instead of ingesting reports
    #[arg(long, conflicts_with_all = ["phish_id", "date"])]
    pub query: Option<QueryKind>,

    /// Domain passed to --query
    #[arg(long, requires = "query")]
    pub domain: Option<String>,

    /// Maximum number of entries for --query top-domains
    #[arg(long, requires = "query")]
    pub limit: Option<u32>,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// HTTP client timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Seconds between the starts of two background ingestion cycles
    #[arg(
        long,
        default_value_t = POLL_INTERVAL.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval_secs: u64,

    /// Base URL of the reported-email mailbox API
    #[arg(long, env = "MAILBOX_URL")]
    pub mailbox_url: Option<String>,

    /// Bearer token for the mailbox API
    #[arg(long, env = "MAILBOX_TOKEN", hide_env_values = true)]
    pub mailbox_token: Option<String>,

    /// Base URL of the investigation API
    #[arg(long, env = "INVESTIGATE_URL", default_value = INVESTIGATE_API_BASE)]
    pub investigate_url: String,

    /// Bearer token for the investigation API
    #[arg(long, env = "INVESTIGATE_TOKEN", hide_env_values = true)]
    pub investigate_token: Option<String>,

    /// Extra PEM root certificate trusted for the investigation API
    #[arg(long, value_parser)]
    pub investigate_ca_cert: Option<PathBuf>,

    /// Disable certificate verification for the investigation API (not recommended)
    #[arg(long)]
    pub insecure_investigate_tls: bool,
}

fn parse_report_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, REPORT_DATE_FORMAT)
        .map_err(|e| format!("expected a date like 2024-03-18: {e}"))
}

impl Opt {
    /// Decides the run mode from the mutually exclusive selector flags.
    ///
    /// # Errors
    ///
    /// Returns a clap error when `--query` needs a `--domain` that was not given.
    pub fn run_mode(&self) -> Result<RunMode, clap::Error> {
        if let Some(kind) = self.query {
            let target = match (kind, &self.domain) {
                (QueryKind::TopDomains, _) => limit_suffix(self.limit),
                (_, Some(domain)) => domain.clone(),
                (_, None) => {
                    return Err(Opt::command().error(
                        ErrorKind::MissingRequiredArgument,
                        format!("--query {kind} requires --domain <DOMAIN>"),
                    ))
                }
            };
            return Ok(RunMode::Query { kind, target });
        }

        Ok(match (&self.phish_id, self.date) {
            (Some(id), _) => RunMode::Once(ReportSelector::Id(id.clone())),
            (None, Some(date)) => RunMode::Once(ReportSelector::Date(date)),
            (None, None) => RunMode::Background,
        })
    }

    /// Builds the library configuration from the parsed options.
    pub fn to_config(&self) -> Config {
        Config {
            log_level: self.log_level.clone(),
            log_format: self.log_format.clone(),
            timeout_seconds: self.timeout_seconds,
            user_agent: self.user_agent.clone(),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            mailbox_url: self.mailbox_url.clone(),
            mailbox_token: self.mailbox_token.clone(),
            investigate_url: self.investigate_url.clone(),
            investigate_token: self.investigate_token.clone(),
            investigate_ca_cert: self.investigate_ca_cert.clone(),
            insecure_investigate_tls: self.insecure_investigate_tls,
            top_domains_ttl: TOP_DOMAINS_TTL,
        }
    }
}
