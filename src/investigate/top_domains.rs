//! Lazily fetched top-domains snapshot.
//!
//! Nothing is fetched until the first [`TopDomains::get`]. A snapshot older than the
//! TTL is refetched on the next `get`; [`TopDomains::refresh`] refetches
//! unconditionally. A refresh that fails or answers non-200 keeps the previous
//! snapshot.
//!
//! Only one refetch runs at a time. While it is in flight, `get` keeps serving the
//! stale snapshot instead of waiting for it.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use super::InvestigateClient;
use crate::config::Config;
use crate::error_handling::{InitializationError, InvestigateError};

#[derive(Debug)]
struct Snapshot {
    fetched_at: Instant,
    domains: Arc<Value>,
}

/// Shared, read-mostly view of the top-domains list.
#[derive(Debug)]
pub struct TopDomains {
    client: InvestigateClient,
    limit: Option<u32>,
    ttl: Duration,
    snapshot: RwLock<Option<Snapshot>>,
    refreshing: Mutex<()>,
}

impl TopDomains {
    /// Creates an empty accessor. No request is made.
    pub fn new(client: InvestigateClient, limit: Option<u32>, ttl: Duration) -> Self {
        Self {
            client,
            limit,
            ttl,
            snapshot: RwLock::new(None),
            refreshing: Mutex::new(()),
        }
    }

    /// Builds the investigation client from `config` and uses its `top_domains_ttl`.
    ///
    /// # Errors
    ///
    /// Propagates any [`InvestigateClient::from_config`] failure.
    pub fn from_config(config: &Config, limit: Option<u32>) -> Result<Self, InitializationError> {
        let client = InvestigateClient::from_config(config)?;
        Ok(Self::new(client, limit, config.top_domains_ttl))
    }

    /// Freshness window of a snapshot.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, snapshot: &Snapshot) -> bool {
        snapshot.fetched_at.elapsed() < self.ttl
    }

    /// Returns the cached snapshot without any I/O.
    pub async fn cached(&self) -> Option<Arc<Value>> {
        self.snapshot
            .read()
            .await
            .as_ref()
            .map(|s| Arc::clone(&s.domains))
    }

    async fn fresh(&self) -> Option<Arc<Value>> {
        self.snapshot
            .read()
            .await
            .as_ref()
            .filter(|s| self.is_fresh(s))
            .map(|s| Arc::clone(&s.domains))
    }

    /// Returns the snapshot, fetching it first if absent or stale.
    ///
    /// When a stale snapshot cannot be refreshed, or another caller is already
    /// refreshing it, the stale one is returned.
    ///
    /// # Errors
    ///
    /// Returns the fetch error only when there is no snapshot to fall back to.
    pub async fn get(&self) -> Result<Option<Arc<Value>>, InvestigateError> {
        if let Some(domains) = self.fresh().await {
            return Ok(Some(domains));
        }

        let _refreshing = match self.cached().await {
            Some(stale) => match self.refreshing.try_lock() {
                Ok(guard) => guard,
                Err(_) => return Ok(Some(stale)),
            },
            None => self.refreshing.lock().await,
        };

        // A refresh may have completed while we waited for the guard
        if let Some(domains) = self.fresh().await {
            return Ok(Some(domains));
        }

        match self.client.top_domains(self.limit).await {
            Ok(Some(domains)) => Ok(Some(self.store(domains).await)),
            Ok(None) => Ok(self.cached().await),
            Err(e) => match self.cached().await {
                Some(stale) => {
                    warn!("Keeping stale top-domains snapshot: {}", e);
                    Ok(Some(stale))
                }
                None => Err(e),
            },
        }
    }

    /// Refetches the snapshot regardless of its age.
    ///
    /// Returns the new snapshot, or `None` on a non-200 answer (the previous
    /// snapshot, if any, is kept).
    ///
    /// # Errors
    ///
    /// Transport and decode errors; the previous snapshot is kept.
    pub async fn refresh(&self) -> Result<Option<Arc<Value>>, InvestigateError> {
        let _refreshing = self.refreshing.lock().await;
        match self.client.top_domains(self.limit).await? {
            Some(domains) => Ok(Some(self.store(domains).await)),
            None => Ok(None),
        }
    }

    async fn store(&self, domains: Value) -> Arc<Value> {
        let domains = Arc::new(domains);
        let count = domains.as_array().map(Vec::len).unwrap_or(0);
        info!("Fetched top-domains snapshot ({} entries)", count);
        *self.snapshot.write().await = Some(Snapshot {
            fetched_at: Instant::now(),
            domains: Arc::clone(&domains),
        });
        domains
    }
}
