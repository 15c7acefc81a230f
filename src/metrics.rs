use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder
///
/// Fails if a recorder is already installed (e.g. a second server in the
/// same process).
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    init_metric_descriptions();

    Ok(handle)
}

/// Initialize metric descriptions (can be called multiple times safely)
fn init_metric_descriptions() {
    describe_counter!(
        "http_requests_total",
        "Total number of HTTP requests handled"
    );
    describe_histogram!(
        "http_request_duration_seconds",
        "Request duration in seconds"
    );
    describe_gauge!(
        "office_api_info",
        "Service version and build information"
    );

    gauge!("office_api_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}

/// Record one completed request
pub fn record_request(method: &str, status: u16, elapsed_seconds: f64) {
    let status = status.to_string();

    counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "status" => status.clone(),
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status,
    )
    .record(elapsed_seconds);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_metrics() {
        init_metric_descriptions();

        // No recorder installed: calls must be no-ops rather than panics
        record_request("GET", 200, 0.05);
        record_request("POST", 403, 0.01);
    }
}
