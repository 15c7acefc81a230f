use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Log level chosen for a request/response cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Info => "Response sent",
            Self::Warning => "Client error response",
            Self::Error => "Server error response",
        }
    }
}

/// 4xx is a warning, 5xx and above an error, everything else info
pub fn severity_for_status(status: u16) -> Severity {
    match status {
        400..=499 => Severity::Warning,
        500.. => Severity::Error,
        _ => Severity::Info,
    }
}

/// Request body as captured for logging
///
/// Bodies that are not valid UTF-8 JSON are kept as a lossy string under a
/// distinct tag so consumers never confuse them with parsed values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CapturedBody {
    Json(Value),
    Raw(String),
}

impl CapturedBody {
    /// Best-effort decode; `None` for an empty body
    pub fn capture(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }

        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => Some(Self::Json(value)),
            Err(_) => Some(Self::Raw(String::from_utf8_lossy(bytes).into_owned())),
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

/// Request metadata captured on entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestLog {
    pub request_id: String,
    pub received_at: DateTime<Utc>,
    pub method: String,
    pub path: String,
    pub query_params: BTreeMap<String, Vec<String>>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<CapturedBody>,
    pub user: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Full record for a non-exempt path
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseLogRecord {
    pub request: RequestLog,
    pub status_code: u16,
    pub elapsed_seconds: f64,
    pub response: Option<Value>,
}

/// Timing-only record for exempt paths
#[derive(Debug, Clone, PartialEq)]
pub struct TimingRecord {
    pub request_id: String,
    pub method: String,
    pub path: String,
    pub status_code: u16,
    pub elapsed_seconds: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogRecord {
    Full(ResponseLogRecord),
    Timing(TimingRecord),
}

impl LogRecord {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Full(record) => record.status_code,
            Self::Timing(record) => record.status_code,
        }
    }

    pub fn elapsed_seconds(&self) -> f64 {
        match self {
            Self::Full(record) => record.elapsed_seconds,
            Self::Timing(record) => record.elapsed_seconds,
        }
    }

    pub fn request_id(&self) -> &str {
        match self {
            Self::Full(record) => &record.request.request_id,
            Self::Timing(record) => &record.request_id,
        }
    }

    pub fn method(&self) -> &str {
        match self {
            Self::Full(record) => &record.request.method,
            Self::Timing(record) => &record.method,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Full(record) => &record.request.path,
            Self::Timing(record) => &record.path,
        }
    }

    pub fn severity(&self) -> Severity {
        severity_for_status(self.status_code())
    }

    pub fn message(&self) -> &'static str {
        self.severity().message()
    }

    pub fn is_timing_only(&self) -> bool {
        matches!(self, Self::Timing(_))
    }

    /// Nested `request` / `response` payload handed to structured sinks
    pub fn payload(&self) -> Value {
        match self {
            Self::Full(record) => json!({
                "request": record.request,
                "response": {
                    "status_code": record.status_code,
                    "response_time_seconds": round4(record.elapsed_seconds),
                    "body": record.response,
                },
            }),
            Self::Timing(record) => json!({
                "request": {
                    "request_id": record.request_id,
                    "method": record.method,
                    "path": record.path,
                },
                "response": {
                    "status_code": record.status_code,
                    "response_time_seconds": round4(record.elapsed_seconds),
                },
            }),
        }
    }
}

fn round4(seconds: f64) -> f64 {
    (seconds * 10_000.0).round() / 10_000.0
}
