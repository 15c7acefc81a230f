use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub users: Vec<UserConfig>,
    #[serde(default)]
    pub request_logging: RequestLoggingConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

/// A statically provisioned API user, resolved from a bearer token
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    pub id: u64,
    pub username: String,
    pub token: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Request/response logging middleware settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RequestLoggingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Path prefixes that only get timing logs (no body, no metadata)
    #[serde(default = "default_exempt_prefixes")]
    pub exempt_prefixes: Vec<String>,

    /// Largest request body that will be buffered for capture
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Header names whose values are masked in log records
    #[serde(default = "default_redact_headers")]
    pub redact_headers: Vec<String>,
}

impl Default for RequestLoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            exempt_prefixes: default_exempt_prefixes(),
            max_body_bytes: default_max_body_bytes(),
            redact_headers: default_redact_headers(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CorsConfig {
    /// Allowed origins; empty means CORS headers are not emitted
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_metrics_endpoint")]
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_metrics_endpoint(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_exempt_prefixes() -> Vec<String> {
    vec!["/admin/".to_string(), "/static/".to_string()]
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_redact_headers() -> Vec<String> {
    vec![
        "authorization".to_string(),
        "cookie".to_string(),
        "x-api-key".to_string(),
    ]
}

fn default_metrics_endpoint() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                log_level: default_log_level(),
                log_format: default_log_format(),
            },
            users: Vec::new(),
            request_logging: RequestLoggingConfig::default(),
            cors: CorsConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Load configuration from the given file, with `OFFICE_API__*` environment overrides
pub fn load_config_from(path: &Path) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(config::Environment::with_prefix("OFFICE_API").separator("__"))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if !matches!(cfg.server.log_format.as_str(), "json" | "pretty") {
        anyhow::bail!(
            "Invalid log_format '{}': expected 'json' or 'pretty'",
            cfg.server.log_format
        );
    }

    for user in &cfg.users {
        if user.username.is_empty() {
            anyhow::bail!("User {} has an empty username", user.id);
        }
        if user.token.is_empty() {
            anyhow::bail!("User '{}' has an empty token", user.username);
        }
    }

    for (idx, user) in cfg.users.iter().enumerate() {
        if cfg.users[..idx].iter().any(|u| u.id == user.id) {
            anyhow::bail!("Duplicate user id: {}", user.id);
        }
        if cfg.users[..idx].iter().any(|u| u.token == user.token) {
            anyhow::bail!("User '{}' reuses another user's token", user.username);
        }
    }

    for prefix in &cfg.request_logging.exempt_prefixes {
        if !prefix.starts_with('/') {
            anyhow::bail!("Exempt prefix '{}' must start with '/'", prefix);
        }
    }

    if !cfg.metrics.endpoint.starts_with('/') {
        anyhow::bail!("Metrics endpoint '{}' must start with '/'", cfg.metrics.endpoint);
    }

    Ok(())
}
