//! Application initialization and resource setup.
//!
//! This module provides functions to initialize all shared resources:
//! - The logger
//! - HTTP clients (general and investigation API)
//! - The mailbox and parser collaborators
//!
//! All initialization functions return proper error types for error handling.

mod client;
mod logger;

use std::sync::Arc;

use crate::config::Config;
use crate::error_handling::InitializationError;
use crate::mailbox::HttpMailbox;

// Re-export public API
pub use client::{init_client, init_investigate_client};
pub use logger::init_logger_with;

/// Initializes the HTTP mailbox collaborator from the configuration.
///
/// # Errors
///
/// Returns `InitializationError::MissingSettingError` when no mailbox URL is configured,
/// or `InitializationError::InvalidUrlError` when it cannot be used as a base URL.
pub fn init_mailbox(
    config: &Config,
    client: Arc<reqwest::Client>,
) -> Result<HttpMailbox, InitializationError> {
    let base_url = config
        .mailbox_url
        .as_deref()
        .ok_or(InitializationError::MissingSettingError("mailbox url"))?;
    let mailbox = HttpMailbox::new(client, base_url, config.mailbox_token.clone())?;
    Ok(mailbox)
}
