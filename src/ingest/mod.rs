//! Ingestion of reported phishing emails.
//!
//! One cycle lists the reports for a [`ReportSelector`], then for each report in
//! mailbox order logs `[i/N]`, downloads the raw message (following redirects) and
//! hands it to the parser. The first failing report aborts the rest of the cycle.

mod scheduler;

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use log::{debug, info};

use crate::config::REPORT_DATE_FORMAT;
use crate::error_handling::{IngestError, IngestEvent, IngestStats};
use crate::mailbox::{Mailbox, Report};
use crate::parser::ReportParser;

/// Which reports a cycle processes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportSelector {
    /// Reports submitted on the local calendar date when the cycle starts
    Today,
    /// Reports submitted on a given date
    Date(NaiveDate),
    /// The report(s) with a given identifier
    Id(String),
}

impl fmt::Display for ReportSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportSelector::Today => write!(f, "today"),
            ReportSelector::Date(date) => write!(f, "date {}", date.format(REPORT_DATE_FORMAT)),
            ReportSelector::Id(id) => write!(f, "id {id}"),
        }
    }
}

/// Outcome of a completed ingestion cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Selector the cycle ran for
    pub selector: ReportSelector,
    /// Number of reports returned by the mailbox
    pub total: usize,
    /// Number of reports handed to the parser successfully
    pub parsed: usize,
    /// Wall-clock duration of the cycle
    pub elapsed: Duration,
}

/// Drives mailbox, download and parser for one or more cycles.
pub struct Ingestor<M, P> {
    mailbox: M,
    parser: P,
    client: Arc<reqwest::Client>,
}

impl<M, P> Ingestor<M, P>
where
    M: Mailbox + Sync,
    P: ReportParser + Sync,
{
    /// Creates an ingestor. `client` downloads raw messages and must follow redirects.
    pub fn new(mailbox: M, parser: P, client: Arc<reqwest::Client>) -> Self {
        Self {
            mailbox,
            parser,
            client,
        }
    }

    /// Lists the reports matching `selector`.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::Mailbox` if the mailbox call fails.
    pub async fn list_reports(&self, selector: &ReportSelector) -> Result<Vec<Report>, IngestError> {
        let reports = match selector {
            ReportSelector::Today => {
                self.mailbox
                    .fetch_new_emails_by_date(Local::now().date_naive())
                    .await?
            }
            ReportSelector::Date(date) => self.mailbox.fetch_new_emails_by_date(*date).await?,
            ReportSelector::Id(id) => self.mailbox.fetch_new_emails_by_id(id).await?,
        };
        Ok(reports)
    }

    async fn fetch_raw(&self, report: &Report) -> Result<Vec<u8>, IngestError> {
        let fetch_err = |source| IngestError::Fetch {
            id: report.id.clone(),
            source,
        };

        let response = self
            .client
            .get(&report.raw_url)
            .send()
            .await
            .map_err(fetch_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::FetchStatus {
                id: report.id.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(fetch_err)?;
        debug!("Fetched {} bytes for report {}", body.len(), report.id);
        Ok(body.to_vec())
    }

    /// Downloads and parses every report in `inbox`, in order.
    ///
    /// Returns the number of reports parsed.
    ///
    /// # Errors
    ///
    /// The first download or parse failure stops the batch and is returned.
    pub async fn analyze(&self, inbox: &[Report], stats: &IngestStats) -> Result<usize, IngestError> {
        let total = inbox.len();
        for (i, report) in inbox.iter().enumerate() {
            info!("[{}/{}] Parsing phish email id: {}", i + 1, total, report.id);

            let raw = match self.fetch_raw(report).await {
                Ok(raw) => raw,
                Err(e) => {
                    stats.increment(IngestEvent::FetchFailed);
                    return Err(e);
                }
            };
            stats.increment(IngestEvent::PayloadFetched);

            if let Err(source) = self.parser.parse(&report.id, &raw) {
                stats.increment(IngestEvent::ParseFailed);
                return Err(IngestError::Parse {
                    id: report.id.clone(),
                    source,
                });
            }
            stats.increment(IngestEvent::ReportParsed);
        }
        Ok(stats.get(IngestEvent::ReportParsed))
    }

    /// Runs one full cycle: list, download, parse.
    ///
    /// # Errors
    ///
    /// Mailbox, download and parse failures abort the cycle.
    pub async fn run_cycle(&self, selector: ReportSelector) -> Result<CycleReport, IngestError> {
        let start = Instant::now();
        let stats = IngestStats::new();

        let inbox = self.list_reports(&selector).await?;
        for _ in &inbox {
            stats.increment(IngestEvent::ReportListed);
        }
        info!("Found {} reported email(s) for {}", inbox.len(), selector);

        let result = self.analyze(&inbox, &stats).await;
        info!("Cycle for {} finished: {}", selector, stats.summary());
        let parsed = result?;

        Ok(CycleReport {
            selector,
            total: inbox.len(),
            parsed,
            elapsed: start.elapsed(),
        })
    }
}
