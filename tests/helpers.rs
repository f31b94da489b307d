// Shared test helpers: log capture and a recording parser.
//
// Included by the integration test files with `mod helpers;`.

use std::sync::{Arc, Mutex, OnceLock};
use std::thread::ThreadId;

use crawlerbox::{ParseError, ReportParser};
use log::{Level, LevelFilter, Log, Metadata, Record};

/// One log record emitted by this crate.
#[derive(Debug, Clone)]
#[allow(dead_code)] // Not every test file reads every field
pub struct CapturedLog {
    pub thread: ThreadId,
    pub level: Level,
    pub target: String,
    pub message: String,
}

struct CaptureLogger {
    records: Mutex<Vec<CapturedLog>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target().starts_with("crawlerbox")
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut records) = self.records.lock() {
            records.push(CapturedLog {
                thread: std::thread::current().id(),
                level: record.level(),
                target: record.target().to_string(),
                message: record.args().to_string(),
            });
        }
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<CaptureLogger> = OnceLock::new();

/// Installs the capturing logger once per test binary.
pub fn init_log_capture() {
    let logger = LOGGER.get_or_init(|| CaptureLogger {
        records: Mutex::new(Vec::new()),
    });
    if log::set_logger(logger).is_ok() {
        log::set_max_level(LevelFilter::Trace);
    }
}

/// Records logged from the current thread.
///
/// `#[tokio::test]` runs on a current-thread runtime, so this isolates the records
/// of one test from the others running in parallel.
pub fn logs_for_current_thread() -> Vec<CapturedLog> {
    let me = std::thread::current().id();
    LOGGER
        .get()
        .and_then(|logger| logger.records.lock().ok().map(|r| r.clone()))
        .unwrap_or_default()
        .into_iter()
        .filter(|record| record.thread == me)
        .collect()
}

/// Parser that records `(id, raw)` pairs and optionally fails on one id.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct RecordingParser {
    pub calls: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    pub fail_on: Option<String>,
}

#[allow(dead_code)]
impl RecordingParser {
    pub fn calls(&self) -> Vec<(String, Vec<u8>)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl ReportParser for RecordingParser {
    fn parse(&self, id: &str, raw: &[u8]) -> Result<(), ParseError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((id.to_string(), raw.to_vec()));
        }
        if self.fail_on.as_deref() == Some(id) {
            return Err(ParseError::Rejected(format!("refusing {id}")));
        }
        Ok(())
    }
}
