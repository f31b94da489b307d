//! Configuration constants.
//!
//! Timeouts, endpoints and scheduling parameters used throughout the application.

use std::time::Duration;

/// Interval between the start of two background ingestion cycles (10 minutes).
pub const POLL_INTERVAL: Duration = Duration::from_secs(600);
/// Shortest accepted poll interval; shorter periods are raised to this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default per-request timeout in seconds for both HTTP clients.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// TCP connection timeout in seconds
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 5;

// Redirect handling
/// Maximum number of redirect hops followed when downloading a raw report.
pub const MAX_REDIRECT_HOPS: usize = 10;

/// Base URL of the Umbrella Investigate API.
pub const INVESTIGATE_API_BASE: &str = "https://investigate.api.umbrella.com";

/// How long a top-domains snapshot stays fresh before `TopDomains::get` refetches it.
pub const TOP_DOMAINS_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Key under which the related-domains endpoint nests its result list.
pub const RELATED_DOMAINS_KEY: &str = "tb1";

/// Date format accepted by `--date` and sent to the mailbox.
pub const REPORT_DATE_FORMAT: &str = "%Y-%m-%d";

/// User-Agent sent on every outgoing request.
pub const DEFAULT_USER_AGENT: &str = concat!("crawlerbox/", env!("CARGO_PKG_VERSION"));
