//! Request/response logging middleware.
//!
//! For every request outside the exempt prefixes this captures method, path,
//! query parameters, headers, the decoded body, the caller and the client IP,
//! runs the rest of the stack, then emits exactly one [`LogRecord`] whose
//! severity follows the response status. Exempt paths (admin UI, static
//! assets) get a timing-only record.
//!
//! Logging never changes the response: malformed bodies are captured raw,
//! sink errors and panics are swallowed, and a panicking handler still gets
//! its cycle logged (as a 500).

use std::{
    collections::{btree_map::Entry, BTreeMap},
    net::SocketAddr,
    panic::AssertUnwindSafe,
    sync::Arc,
};

use arc_swap::ArcSwap;
use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, Request, State},
    http::{
        header::{CONTENT_LENGTH, USER_AGENT},
        request::Parts,
        HeaderMap,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use futures::{FutureExt, StreamExt};
use tracing::{debug, error};

use crate::{
    auth::Identity,
    config::{Config, RequestLoggingConfig},
    envelope::ResponsePayload,
    error::AppError,
    logging::sanitize_header_value,
    metrics,
    observability::{
        elapsed_seconds, CapturedBody, Clock, LogRecord, LogSink, MonotonicClock, RequestLog,
        ResponseLogRecord, TimingRecord, TracingSink,
    },
    utils::generate_unique_id,
};

pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// State shared by every invocation of [`request_logging_middleware`]
#[derive(Clone)]
pub struct RequestLogging {
    config: Arc<ArcSwap<Config>>,
    sink: Arc<dyn LogSink>,
    clock: Arc<dyn Clock>,
}

impl RequestLogging {
    pub fn new(config: Arc<ArcSwap<Config>>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            config,
            sink,
            clock: Arc::new(MonotonicClock::new()),
        }
    }

    /// Logging through `tracing` events
    pub fn with_tracing(config: Arc<ArcSwap<Config>>) -> Self {
        Self::new(config, Arc::new(TracingSink))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Hand a record to the sink; failures stop here
    fn emit(&self, record: LogRecord) {
        metrics::record_request(record.method(), record.status_code(), record.elapsed_seconds());

        let sink = &self.sink;
        match std::panic::catch_unwind(AssertUnwindSafe(|| sink.emit(&record))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, request_id = record.request_id(), "Log sink rejected record"),
            Err(_) => debug!(request_id = record.request_id(), "Log sink panicked"),
        }
    }
}

pub async fn request_logging_middleware(
    State(logging): State<RequestLogging>,
    req: Request,
    next: Next,
) -> Response {
    let started = logging.clock.now();
    let config = logging.config.load_full();
    let settings = &config.request_logging;

    if !settings.enabled {
        return next.run(req).await;
    }

    let request_id = generate_unique_id("req");
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    if is_exempt(&path, &settings.exempt_prefixes) {
        let response = run_guarded(next, req).await;
        logging.emit(LogRecord::Timing(TimingRecord {
            request_id,
            method,
            path,
            status_code: response.status().as_u16(),
            elapsed_seconds: elapsed_seconds(started, logging.clock.now()),
        }));
        return response;
    }

    let (parts, body) = req.into_parts();
    let mut request_log = capture_request(&parts, request_id, method, path, settings);

    let response = match read_body(&parts.headers, body, settings.max_body_bytes).await {
        Ok(bytes) => {
            request_log.body = CapturedBody::capture(&bytes);
            run_guarded(next, Request::from_parts(parts, Body::from(bytes))).await
        }
        Err(err) => err.into_response(),
    };

    if let Some(identity) = response.extensions().get::<Identity>() {
        request_log.user = identity.to_string();
    }

    logging.emit(LogRecord::Full(ResponseLogRecord {
        request: request_log,
        status_code: response.status().as_u16(),
        elapsed_seconds: elapsed_seconds(started, logging.clock.now()),
        response: response
            .extensions()
            .get::<ResponsePayload>()
            .map(|payload| payload.0.clone()),
    }));

    response
}

/// Run the inner stack; a panic becomes a 500 so the cycle is still logged
async fn run_guarded(next: Next, req: Request) -> Response {
    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => response,
        Err(_) => {
            error!("Handler panicked, responding with 500");
            AppError::InternalError("Internal server error".to_string()).into_response()
        }
    }
}

async fn read_body(headers: &HeaderMap, body: Body, limit: usize) -> Result<Bytes, AppError> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    if let Some(len) = declared {
        if len > limit {
            return Err(AppError::PayloadTooLarge(format!(
                "Request body of {} bytes exceeds the {} byte limit",
                len, limit
            )));
        }
    }

    let mut stream = body.into_data_stream();
    let mut buffered: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|e| AppError::BadRequest(format!("Failed to read request body: {}", e)))?;

        if buffered.len() + chunk.len() > limit {
            return Err(AppError::PayloadTooLarge(format!(
                "Request body exceeds the {} byte limit",
                limit
            )));
        }
        buffered.extend_from_slice(&chunk);
    }

    Ok(Bytes::from(buffered))
}

fn capture_request(
    parts: &Parts,
    request_id: String,
    method: String,
    path: String,
    settings: &RequestLoggingConfig,
) -> RequestLog {
    let remote_addr = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    RequestLog {
        request_id,
        received_at: Utc::now(),
        method,
        path,
        query_params: parse_query(parts.uri.query()),
        headers: flatten_headers(&parts.headers, &settings.redact_headers),
        body: None,
        // Identity runs inside this layer; the response carries the real caller
        user: Identity::anonymous().to_string(),
        ip: resolve_client_ip(&parts.headers, remote_addr.as_deref()),
        user_agent: parts
            .headers
            .get(USER_AGENT)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned()),
    }
}

pub fn is_exempt(path: &str, exempt_prefixes: &[String]) -> bool {
    exempt_prefixes
        .iter()
        .any(|prefix| path.starts_with(prefix.as_str()))
}

/// First `X-Forwarded-For` entry if there is one, else the peer address
pub fn resolve_client_ip(headers: &HeaderMap, remote_addr: Option<&str>) -> Option<String> {
    headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .or_else(|| remote_addr.map(str::to_string))
}

/// Every value of a repeated key is kept, in order
pub fn parse_query(query: Option<&str>) -> BTreeMap<String, Vec<String>> {
    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    if let Some(query) = query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
    }
    params
}

/// Lower-cased header names; repeated headers joined with `, `
pub fn flatten_headers(headers: &HeaderMap, redact: &[String]) -> BTreeMap<String, String> {
    let mut flat: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        let value = sanitize_header_value(name.as_str(), &value, redact);
        match flat.entry(name.as_str().to_string()) {
            Entry::Occupied(mut existing) => {
                let joined = existing.get_mut();
                joined.push_str(", ");
                joined.push_str(&value);
            }
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
        }
    }
    flat
}
