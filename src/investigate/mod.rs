//! Umbrella Investigate API client.
//!
//! Each [`QueryKind`] maps to one fixed path under the API base URL. The domain (or,
//! for top-domains, an optional `?limit=N` suffix) is appended verbatim: no escaping
//! and no validation happens here.
//!
//! Responses are normalized per kind:
//! - query-volume is rebuilt into an hourly [`QueryVolumeSeries`]
//! - related-domains is unwrapped from its `tb1` key
//! - everything else is returned as decoded
//!
//! A non-200 answer is logged once at error level and reported as `Ok(None)`.

mod series;
mod top_domains;

use std::sync::Arc;

use log::{debug, error};
use reqwest::StatusCode;
use serde_json::Value;
use strum_macros::{Display, EnumIter, EnumString};

use crate::config::{Config, RELATED_DOMAINS_KEY};
use crate::error_handling::{InitializationError, InvestigateError};
use crate::initialization::init_investigate_client;

pub use series::QueryVolumeSeries;
pub use top_domains::TopDomains;

/// Fixed set of investigation endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum QueryKind {
    /// Hourly query counts over the last 30 days
    QueryVolume,
    /// Raw passive DNS history
    #[strum(to_string = "pdns", serialize = "passive-dns")]
    PassiveDns,
    /// Known subdomains
    Subdomains,
    /// Domains requested around the same time as this one
    RelatedDomains,
    /// Security scores (DGA, ASN, geo diversity, ...)
    SecurityInfo,
    /// Aggregate risk score and its indicators
    RiskScore,
    /// Umbrella popularity list
    TopDomains,
}

impl QueryKind {
    /// Path template the target is appended to.
    pub fn path(self) -> &'static str {
        match self {
            QueryKind::QueryVolume => "/domains/volume/",
            QueryKind::PassiveDns => "/pdns/raw/",
            QueryKind::Subdomains => "/subdomains/",
            QueryKind::RelatedDomains => "/links/name/",
            QueryKind::SecurityInfo => "/security/name/",
            QueryKind::RiskScore => "/domains/risk-score/",
            QueryKind::TopDomains => "/topmillion",
        }
    }
}

/// Client for the investigation API.
///
/// Cheap to clone; the underlying `reqwest::Client` is shared. The client is
/// expected to carry the bearer token as a default header (see
/// [`init_investigate_client`]).
#[derive(Debug, Clone)]
pub struct InvestigateClient {
    client: Arc<reqwest::Client>,
    base_url: String,
}

impl InvestigateClient {
    /// Wraps an already configured HTTP client.
    pub fn new(client: Arc<reqwest::Client>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Builds the HTTP client (token, trust settings) and wraps it.
    ///
    /// # Errors
    ///
    /// Propagates any [`init_investigate_client`] failure.
    pub fn from_config(config: &Config) -> Result<Self, InitializationError> {
        let client = init_investigate_client(config)?;
        Ok(Self::new(client, config.investigate_url.clone()))
    }

    /// Full request URL for `kind` and `target`.
    pub fn url(&self, kind: QueryKind, target: &str) -> String {
        format!(
            "{}{}{}",
            self.base_url.trim_end_matches('/'),
            kind.path(),
            target
        )
    }

    /// Issues the GET and decodes the body, without any per-kind reshaping.
    async fn fetch(&self, kind: QueryKind, target: &str) -> Result<Option<Value>, InvestigateError> {
        let url = self.url(kind, target);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(InvestigateError::Transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            error!(
                "[!] Error with the investigate {} request: got HTTP/{}",
                kind,
                status.as_u16()
            );
            return Ok(None);
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(InvestigateError::Decode)?;
        Ok(Some(value))
    }

    /// Calls the endpoint for `kind` and returns the normalized JSON.
    ///
    /// Query-volume results are returned as an object keyed by RFC 3339 hour.
    ///
    /// # Errors
    ///
    /// Transport and decode failures, a missing `tb1` key for related-domains, and a
    /// malformed volume series are errors. A non-200 status is `Ok(None)`.
    pub async fn invoke(
        &self,
        kind: QueryKind,
        target: &str,
    ) -> Result<Option<Value>, InvestigateError> {
        let Some(value) = self.fetch(kind, target).await? else {
            return Ok(None);
        };

        let normalized = match kind {
            QueryKind::QueryVolume => {
                if is_empty_answer(&value) {
                    return Ok(None);
                }
                let series = QueryVolumeSeries::from_response(&value)?;
                serde_json::to_value(series)
                    .map_err(|e| InvestigateError::MalformedSeries(e.to_string()))?
            }
            QueryKind::RelatedDomains => unwrap_related(value)?,
            _ => value,
        };
        Ok(Some(normalized))
    }

    /// Requests per hour for `domain` over the last 30 days.
    ///
    /// An empty body (`{}`, `[]` or `null`) is reported as `Ok(None)`.
    pub async fn query_volume(
        &self,
        domain: &str,
    ) -> Result<Option<QueryVolumeSeries>, InvestigateError> {
        match self.fetch(QueryKind::QueryVolume, domain).await? {
            Some(value) if !is_empty_answer(&value) => {
                QueryVolumeSeries::from_response(&value).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Passive DNS history for `domain`.
    pub async fn passive_dns(&self, domain: &str) -> Result<Option<Value>, InvestigateError> {
        self.invoke(QueryKind::PassiveDns, domain).await
    }

    /// Subdomains of `domain` (`firstSeen`, `name`, `securityCategories`).
    pub async fn subdomains(&self, domain: &str) -> Result<Option<Value>, InvestigateError> {
        self.invoke(QueryKind::Subdomains, domain).await
    }

    /// `[related_domain, count]` pairs for domains requested around the same time.
    pub async fn related_domains(&self, domain: &str) -> Result<Option<Value>, InvestigateError> {
        self.invoke(QueryKind::RelatedDomains, domain).await
    }

    /// Security indicators for `domain`, unmodified.
    pub async fn security_info(&self, domain: &str) -> Result<Option<Value>, InvestigateError> {
        self.invoke(QueryKind::SecurityInfo, domain).await
    }

    /// Risk score (0 to 100) and its indicators for `domain`, unmodified.
    pub async fn risk_score(&self, domain: &str) -> Result<Option<Value>, InvestigateError> {
        self.invoke(QueryKind::RiskScore, domain).await
    }

    /// Popularity list, optionally truncated to `limit` entries.
    ///
    /// A limit of zero means no limit.
    pub async fn top_domains(&self, limit: Option<u32>) -> Result<Option<Value>, InvestigateError> {
        self.invoke(QueryKind::TopDomains, &limit_suffix(limit)).await
    }
}

/// `?limit=N` target for top-domains; empty when `limit` is absent or zero.
pub fn limit_suffix(limit: Option<u32>) -> String {
    limit
        .filter(|&limit| limit > 0)
        .map(|limit| format!("?limit={limit}"))
        .unwrap_or_default()
}

fn is_empty_answer(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn unwrap_related(mut value: Value) -> Result<Value, InvestigateError> {
    value
        .get_mut(RELATED_DOMAINS_KEY)
        .map(Value::take)
        .ok_or(InvestigateError::MissingKey(RELATED_DOMAINS_KEY))
}
