use anyhow::Result;
use arc_swap::ArcSwap;
use axum::{http::HeaderValue, middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    sync::Arc,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    auth,
    config::{Config, CorsConfig},
    handlers,
    metrics,
    middleware::{request_logging_middleware, RequestLogging},
    signals::setup_signal_handlers,
};

/// Start the office API server
///
/// Installs the Prometheus recorder, wires signal handling (shutdown and
/// config reload from `config_path`), then serves until a shutdown signal
/// arrives.
pub async fn start_server(config: Config, config_path: PathBuf) -> Result<()> {
    let metrics_handle = if config.metrics.enabled {
        info!("Initializing Prometheus metrics...");
        Some(Arc::new(metrics::init_metrics()?))
    } else {
        None
    };

    let config_swap = Arc::new(ArcSwap::from_pointee(config.clone()));

    let (shutdown_tx, signal_handle) = setup_signal_handlers(config_swap.clone(), config_path);
    let mut shutdown_rx = shutdown_tx.subscribe();

    let logging = RequestLogging::with_tracing(config_swap.clone());
    let app = create_router(Router::new(), config_swap, logging, metrics_handle);

    let addr = SocketAddr::from((config.server.host.parse::<IpAddr>()?, config.server.port));

    info!("Starting office API on {}", addr);
    info!(
        "Configuration: {} users ({} enabled), request logging {}",
        config.users.len(),
        config.users.iter().filter(|u| u.enabled).count(),
        if config.request_logging.enabled { "on" } else { "off" }
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = shutdown_rx.recv().await;
        info!("Shutdown signal received, draining connections...");
    })
    .await?;

    signal_handle.await?;
    info!("Server stopped gracefully");

    Ok(())
}

/// Wrap `resources` with the public endpoints and the middleware stack
///
/// Layers, outermost first: trace, CORS, request logging, identity. Resource
/// routers merged in through `resources` are observed and identified like
/// the built-in endpoints.
pub fn create_router(
    resources: Router,
    config: Arc<ArcSwap<Config>>,
    logging: RequestLogging,
    metrics_handle: Option<Arc<PrometheusHandle>>,
) -> Router {
    let snapshot = config.load_full();

    let mut app = Router::new()
        .route("/api/v1/health/", get(handlers::health::health_check))
        .route("/api/v1/ready/", get(handlers::health::readiness_check))
        .merge(resources);

    if let Some(handle) = metrics_handle {
        let metrics_routes = Router::new()
            .route(
                &snapshot.metrics.endpoint,
                get(handlers::metrics_handler::metrics),
            )
            .with_state(handle);
        app = app.merge(metrics_routes);
    }

    app.fallback(handlers::fallback::not_found)
        .layer(middleware::from_fn_with_state(
            config,
            auth::identity_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            logging,
            request_logging_middleware,
        ))
        .layer(cors_layer(&snapshot.cors))
        .layer(TraceLayer::new_for_http())
}

/// Allowed origins from config; an empty list disables cross-origin access
fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    if cors.allowed_origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
