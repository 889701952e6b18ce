use anyhow::Context;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Prefix of environment variables read by `Config::load`,
/// e.g. `SHORTLY_SERVER__PORT=9000` or `SHORTLY_BASE_URL=https://sho.rt`
pub const ENV_PREFIX: &str = "SHORTLY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    /// Public origin used to build `shortLink` values
    pub base_url: String,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
    pub redirect_status: RedirectMode,
    pub shortener: ShortenerConfig,
    pub geo: GeoConfig,
    pub remote_log: RemoteLogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// HTTP status used for redirects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectMode {
    /// 302
    #[default]
    Found,
    /// 303
    SeeOther,
    /// 307
    Temporary,
    /// 308
    Permanent,
}

impl RedirectMode {
    pub fn status_code(self) -> StatusCode {
        match self {
            RedirectMode::Found => StatusCode::FOUND,
            RedirectMode::SeeOther => StatusCode::SEE_OTHER,
            RedirectMode::Temporary => StatusCode::TEMPORARY_REDIRECT,
            RedirectMode::Permanent => StatusCode::PERMANENT_REDIRECT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortenerConfig {
    /// Lifetime of a link when the request names none
    pub default_validity_minutes: i64,
    /// Random draws before giving up on a free code
    pub max_generation_attempts: usize,
    /// How often expired records are swept; 0 disables the sweeper
    pub sweep_interval_secs: u64,
    /// How long an expired record is kept before the sweeper drops it
    pub expiry_grace_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    pub enabled: bool,
    /// Lookup URL; `{ip}` is replaced by the client address
    pub api_url: String,
    pub timeout_ms: u64,
    pub cache_ttl_secs: u64,
    pub cache_capacity: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteLogConfig {
    /// Log collector URL; remote delivery is off when unset
    pub endpoint: Option<String>,
    /// Sent as `Authorization: Bearer <token>`
    pub token: Option<String>,
    pub stack: String,
    pub timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            base_url: "http://localhost:8000".to_string(),
            log_level: "info".to_string(),
            redirect_status: RedirectMode::default(),
            shortener: ShortenerConfig::default(),
            geo: GeoConfig::default(),
            remote_log: RemoteLogConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self {
            default_validity_minutes: 30,
            max_generation_attempts: crate::registry::DEFAULT_MAX_GENERATION_ATTEMPTS,
            sweep_interval_secs: 300,
            expiry_grace_secs: 3600,
        }
    }
}

impl ShortenerConfig {
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }

    pub fn expiry_grace(&self) -> Duration {
        Duration::from_secs(self.expiry_grace_secs)
    }
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: "https://ipapi.co/{ip}/json/".to_string(),
            timeout_ms: 3000,
            cache_ttl_secs: 900,
            cache_capacity: 10_000,
        }
    }
}

impl GeoConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for RemoteLogConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            token: None,
            stack: "backend".to_string(),
            timeout_ms: 2000,
        }
    }
}

impl RemoteLogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    /// Load configuration: `.env`, then the optional file at `path`,
    /// then `SHORTLY_*` environment variables.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: Config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.shortener.default_validity_minutes <= 0 {
            anyhow::bail!("shortener.default_validity_minutes must be positive");
        }
        if !self.geo.api_url.contains(crate::analytics::geo::IP_PLACEHOLDER) {
            tracing::warn!(
                "geo.api_url '{}' has no {{ip}} placeholder; every lookup will hit the same URL",
                self.geo.api_url
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.shortener.default_validity_minutes, 30);
        assert_eq!(config.redirect_status.status_code(), StatusCode::FOUND);
        assert!(config.remote_log.endpoint.is_none());
        assert_eq!(config.shortener.sweep_interval(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("shortly-config-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
base_url = "https://sho.rt"
redirect_status = "permanent"

[server]
port = 9090

[shortener]
default_validity_minutes = 60
sweep_interval_secs = 0

[remote_log]
endpoint = "http://logs.internal/api/logs"
"#
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.base_url, "https://sho.rt");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.redirect_status, RedirectMode::Permanent);
        assert_eq!(config.shortener.default_validity_minutes, 60);
        assert_eq!(config.shortener.sweep_interval(), None);
        assert_eq!(
            config.remote_log.endpoint.as_deref(),
            Some("http://logs.internal/api/logs")
        );
        assert_eq!(config.remote_log.stack, "backend");
    }

    #[test]
    fn test_non_positive_default_validity_rejected() {
        let mut config = Config::default();
        config.shortener.default_validity_minutes = 0;
        assert!(config.validate().is_err());
    }
}
