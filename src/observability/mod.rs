//! Request observability for the office API
//!
//! One log record is produced per request/response cycle by the
//! request-logging middleware and handed to a [`LogSink`].
//!
//! ## Architecture
//!
//! ```text
//! middleware (capture + timing)
//!     ↓
//! LogRecord (Full | Timing)
//!     ↓
//! LogSink (tracing events, memory buffer, ...)
//! ```
//!
//! Sinks are injected rather than looked up globally so tests can observe
//! exactly what was logged.

pub mod clock;
pub mod record;
pub mod sink;

pub use clock::{elapsed_seconds, Clock, MonotonicClock};
pub use record::{
    severity_for_status, CapturedBody, LogRecord, RequestLog, ResponseLogRecord, Severity,
    TimingRecord,
};
pub use sink::{LogSink, MemorySink, SinkError, TracingSink};
