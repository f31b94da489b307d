//! Reported-email mailbox access.
//!
//! The ingestion loop only depends on the [`Mailbox`] trait. [`HttpMailbox`] is the
//! shipped implementation and talks to a JSON reporting API:
//!
//! - `GET {base}/reports?date=YYYY-MM-DD` lists the reports submitted on a date
//! - `GET {base}/reports/{id}` lists the report(s) with the given identifier
//!
//! Both endpoints answer with a JSON array of `{"id": ..., "rawUrl": ..., "date": ...}`.

use std::future::Future;
use std::sync::Arc;

use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::config::REPORT_DATE_FORMAT;
use crate::error_handling::MailboxError;

/// One reported phishing email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Identifier assigned by the reporting system
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// URL serving the raw RFC 822 message
    #[serde(rename = "rawUrl")]
    pub raw_url: String,
    /// Submission date, when the mailbox provides it
    #[serde(default)]
    pub date: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

/// Source of newly reported emails.
pub trait Mailbox {
    /// Lists the reports submitted on `date`.
    fn fetch_new_emails_by_date(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<Report>, MailboxError>> + Send;

    /// Lists the report(s) with identifier `id`.
    fn fetch_new_emails_by_id(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Vec<Report>, MailboxError>> + Send;
}

/// [`Mailbox`] backed by a JSON reporting API.
#[derive(Debug, Clone)]
pub struct HttpMailbox {
    client: Arc<reqwest::Client>,
    base_url: Url,
    token: Option<String>,
}

impl HttpMailbox {
    /// Creates a mailbox client rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns a parse error if `base_url` is not an absolute hierarchical URL.
    pub fn new(
        client: Arc<reqwest::Client>,
        base_url: &str,
        token: Option<String>,
    ) -> Result<Self, url::ParseError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
        }
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_reports(&self, url: Url) -> Result<Vec<Report>, MailboxError> {
        debug!("Listing reports from {}", url);
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(MailboxError::Request)?;
        let status = response.status();
        if !status.is_success() {
            return Err(MailboxError::Status(status.as_u16()));
        }
        response
            .json::<Vec<Report>>()
            .await
            .map_err(MailboxError::Decode)
    }
}

impl Mailbox for HttpMailbox {
    async fn fetch_new_emails_by_date(&self, date: NaiveDate) -> Result<Vec<Report>, MailboxError> {
        let mut url = self.endpoint(&["reports"]);
        url.query_pairs_mut()
            .append_pair("date", &date.format(REPORT_DATE_FORMAT).to_string());
        self.get_reports(url).await
    }

    async fn fetch_new_emails_by_id(&self, id: &str) -> Result<Vec<Report>, MailboxError> {
        let url = self.endpoint(&["reports", id]);
        self.get_reports(url).await
    }
}
