//! Reported-email parsing.
//!
//! The ingestion loop hands every downloaded message to a [`ReportParser`]. The
//! shipped [`MailParser`] decodes the MIME structure, pulls out the sender-related
//! headers and the links found in text bodies, and logs a one-line summary.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use log::info;
use mailparse::{MailHeaderMap, ParsedMail};
use regex::Regex;
use serde::Serialize;

use crate::error_handling::ParseError;

/// Consumer of raw reported messages.
pub trait ReportParser {
    /// Parses the raw message of report `id`.
    fn parse(&self, id: &str, raw: &[u8]) -> Result<(), ParseError>;
}

/// Fields extracted from a reported message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedReport {
    /// Report identifier
    pub id: String,
    /// `Subject` header
    pub subject: Option<String>,
    /// `From` header
    pub from: Option<String>,
    /// `Reply-To` header
    pub reply_to: Option<String>,
    /// `Return-Path` header
    pub return_path: Option<String>,
    /// http(s) links found in text parts, in order of first appearance
    pub links: Vec<String>,
    /// Hosts of `links`, sorted and deduplicated
    pub domains: Vec<String>,
}

static LINK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"'<>()\[\]]+"#).ok());

/// MIME-aware [`ReportParser`].
#[derive(Debug, Clone, Default)]
pub struct MailParser;

impl MailParser {
    /// Creates a parser.
    pub fn new() -> Self {
        Self
    }

    /// Decodes `raw` and extracts headers and links.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Rejected` for an empty payload and `ParseError::Mime`
    /// when the message cannot be decoded.
    pub fn parse_message(&self, id: &str, raw: &[u8]) -> Result<ParsedReport, ParseError> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Err(ParseError::Rejected("empty message".to_string()));
        }

        let mail = mailparse::parse_mail(raw)?;
        let headers = mail.get_headers();

        let mut links = Vec::new();
        collect_links(&mail, &mut links)?;

        let domains = links
            .iter()
            .filter_map(|link| url::Url::parse(link).ok())
            .filter_map(|url| url.host_str().map(str::to_ascii_lowercase))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Ok(ParsedReport {
            id: id.to_string(),
            subject: headers.get_first_value("Subject"),
            from: headers.get_first_value("From"),
            reply_to: headers.get_first_value("Reply-To"),
            return_path: headers.get_first_value("Return-Path"),
            links,
            domains,
        })
    }
}

/// Walks the MIME tree and appends links from every `text/*` part, skipping duplicates.
fn collect_links(part: &ParsedMail<'_>, links: &mut Vec<String>) -> Result<(), ParseError> {
    if part.subparts.is_empty() {
        if part.ctype.mimetype.starts_with("text/") {
            let Some(re) = LINK.as_ref() else {
                return Ok(());
            };
            let body = part.get_body()?;
            for m in re.find_iter(&body) {
                let link = m.as_str().trim_end_matches(['.', ',', ';']).to_string();
                if !links.contains(&link) {
                    links.push(link);
                }
            }
        }
        return Ok(());
    }
    for sub in &part.subparts {
        collect_links(sub, links)?;
    }
    Ok(())
}

impl ReportParser for MailParser {
    fn parse(&self, id: &str, raw: &[u8]) -> Result<(), ParseError> {
        let parsed = self.parse_message(id, raw)?;
        info!(
            "Parsed phish email {}: subject={:?} from={:?} ({} links, {} domains)",
            parsed.id,
            parsed.subject.as_deref().unwrap_or(""),
            parsed.from.as_deref().unwrap_or(""),
            parsed.links.len(),
            parsed.domains.len()
        );
        Ok(())
    }
}
