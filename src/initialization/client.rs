//! HTTP client initialization.
//!
//! This module builds the two HTTP clients the application uses: a general client
//! for the mailbox and raw report downloads, and a dedicated client for the
//! investigation API carrying its bearer token and trust settings.

use std::sync::Arc;
use std::time::Duration;

use log::warn;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Certificate, ClientBuilder};

use crate::config::{Config, MAX_REDIRECT_HOPS, TCP_CONNECT_TIMEOUT_SECS};
use crate::error_handling::InitializationError;

fn base_builder(config: &Config) -> ClientBuilder {
    ClientBuilder::new()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .connect_timeout(Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS))
        .user_agent(config.user_agent.clone())
}

/// Initializes the HTTP client used for the mailbox and raw report downloads.
///
/// Creates a `reqwest::Client` configured with:
/// - User-Agent header from the configuration
/// - Request and connect timeouts
/// - Redirect following enabled (up to 10 hops)
///
/// # Errors
///
/// Returns `InitializationError::HttpClientError` if client creation fails.
pub fn init_client(config: &Config) -> Result<Arc<reqwest::Client>, InitializationError> {
    let client = base_builder(config)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECT_HOPS))
        .build()?;
    Ok(Arc::new(client))
}

/// Initializes the HTTP client for the investigation API.
///
/// Every request carries `Authorization: Bearer <token>`. Certificate verification
/// stays on unless `insecure_investigate_tls` is set, in which case a warning is
/// logged. A PEM file given in `investigate_ca_cert` is trusted in addition to the
/// system roots, for this client only.
///
/// # Errors
///
/// Returns an error if the token is missing or not a valid header value, if the
/// certificate cannot be read or parsed, or if client creation fails.
pub fn init_investigate_client(
    config: &Config,
) -> Result<Arc<reqwest::Client>, InitializationError> {
    let token = config
        .investigate_token
        .as_deref()
        .ok_or(InitializationError::MissingSettingError("investigate token"))?;

    let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))?;
    auth.set_sensitive(true);
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);

    let mut builder = base_builder(config).default_headers(headers);

    if let Some(path) = &config.investigate_ca_cert {
        let pem = std::fs::read(path).map_err(|source| {
            InitializationError::CertificateReadError {
                path: path.clone(),
                source,
            }
        })?;
        builder = builder.add_root_certificate(Certificate::from_pem(&pem)?);
    }

    if config.insecure_investigate_tls {
        warn!(
            "TLS certificate verification is DISABLED for {}",
            config.investigate_url
        );
        builder = builder.danger_accept_invalid_certs(true);
    }

    Ok(Arc::new(builder.build()?))
}
