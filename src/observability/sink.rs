use std::sync::Mutex;
use tracing::{error, info, warn};

use super::record::{LogRecord, Severity};

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to serialize log record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("log sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for request log records
pub trait LogSink: Send + Sync {
    fn emit(&self, record: &LogRecord) -> Result<(), SinkError>;
}

/// Emits each record as a `tracing` event at the record's severity
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, record: &LogRecord) -> Result<(), SinkError> {
        let payload = serde_json::to_string(&record.payload())?;
        let request_id = record.request_id();
        let method = record.method();
        let path = record.path();
        let status = record.status_code();
        let elapsed = record.elapsed_seconds();

        match record.severity() {
            Severity::Info => info!(
                target: "lawyer_office_api::requests",
                request_id, method, path, status, elapsed, payload = %payload,
                "{}", record.message()
            ),
            Severity::Warning => warn!(
                target: "lawyer_office_api::requests",
                request_id, method, path, status, elapsed, payload = %payload,
                "{}", record.message()
            ),
            Severity::Error => error!(
                target: "lawyer_office_api::requests",
                request_id, method, path, status, elapsed, payload = %payload,
                "{}", record.message()
            ),
        }

        Ok(())
    }
}

/// Keeps every record in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for MemorySink {
    fn emit(&self, record: &LogRecord) -> Result<(), SinkError> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record.clone());
        Ok(())
    }
}
