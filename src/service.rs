//! Create, redirect and stats operations over the registry

use axum::http::HeaderValue;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::analytics::{ClickRecorder, ClientAddress, GeoResolver};
use crate::clock::Clock;
use crate::config::Config;
use crate::error::{ServiceError, ServiceResult};
use crate::logging::{LogLevel, Package, RemoteLogger};
use crate::models::{CreateUrlRequest, StatsResponse};
use crate::registry::Registry;

pub const EXISTING_URL_MESSAGE: &str = "Short URL already exists for this URL";

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub base_url: String,
    pub default_validity_minutes: i64,
}

impl ServiceSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_validity_minutes: config.shortener.default_validity_minutes,
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Result of a create request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortened {
    pub code: String,
    pub short_link: String,
    pub expires_at: DateTime<Utc>,
    pub is_existing: bool,
}

pub struct ShortenerService {
    registry: Arc<Registry>,
    recorder: ClickRecorder,
    clock: Arc<dyn Clock>,
    logger: RemoteLogger,
    settings: ServiceSettings,
}

impl ShortenerService {
    pub fn new(
        registry: Arc<Registry>,
        geo: Arc<dyn GeoResolver>,
        clock: Arc<dyn Clock>,
        logger: RemoteLogger,
        settings: ServiceSettings,
    ) -> Self {
        let recorder = ClickRecorder::new(
            Arc::clone(&registry),
            geo,
            Arc::clone(&clock),
            logger.clone(),
        );

        Self {
            registry,
            recorder,
            clock,
            logger,
            settings,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn short_link(&self, code: &str) -> String {
        format!("{}/r/{}", self.settings.base_url, code)
    }

    /// Shorten `request.url`, or hand back the code it already has
    pub async fn shorten(&self, request: CreateUrlRequest) -> ServiceResult<Shortened> {
        let url = match request.url {
            Some(url) if !url.is_empty() => url,
            _ => {
                self.logger
                    .log(LogLevel::Error, Package::Service, "URL is required");
                return Err(ServiceError::Validation("URL is required".to_string()));
            }
        };

        if HeaderValue::from_str(&url).is_err() {
            self.logger.log(
                LogLevel::Error,
                Package::Service,
                "Rejected URL that cannot be used as a redirect target",
            );
            return Err(ServiceError::Validation(
                "URL contains characters that are not allowed".to_string(),
            ));
        }

        let validity = request
            .validity
            .unwrap_or(self.settings.default_validity_minutes);
        if validity <= 0 {
            self.logger.log(
                LogLevel::Error,
                Package::Service,
                format!("Rejected non-positive validity {validity}"),
            );
            return Err(ServiceError::Validation(
                "Validity must be a positive number of minutes".to_string(),
            ));
        }

        let created = self
            .registry
            .create(&url, validity, request.shortcode.as_deref(), self.clock.now())
            .await
            .map_err(|err| {
                self.logger
                    .log(LogLevel::Warn, Package::Service, err.to_string());
                ServiceError::from(err)
            })?;

        if created.is_existing {
            self.logger.log(
                LogLevel::Info,
                Package::Service,
                format!("Returning existing short URL with code: {}", created.code),
            );
        } else {
            self.logger.log(
                LogLevel::Info,
                Package::Service,
                format!("Created short URL with code: {}", created.code),
            );
        }

        Ok(Shortened {
            short_link: self.short_link(&created.code),
            code: created.code,
            expires_at: created.expires_at,
            is_existing: created.is_existing,
        })
    }

    /// Resolve `code` for a redirect and record the click.
    /// Returns the `Location` value; nothing is recorded on failure.
    pub async fn follow(
        &self,
        code: &str,
        referrer: Option<String>,
        address: &ClientAddress,
    ) -> ServiceResult<HeaderValue> {
        let Some(target) = self.registry.target(code).await else {
            self.logger.log(
                LogLevel::Warn,
                Package::Handler,
                format!("Shortcode '{code}' not found"),
            );
            return Err(ServiceError::NotFound(code.to_string()));
        };

        if target.is_expired(self.clock.now()) {
            self.logger.log(
                LogLevel::Warn,
                Package::Handler,
                format!("Shortcode '{code}' expired"),
            );
            return Err(ServiceError::Expired(code.to_string()));
        }

        let location = HeaderValue::from_str(&target.url).map_err(|err| {
            ServiceError::Internal(anyhow::anyhow!(
                "stored URL for '{code}' is not a valid Location header: {err}"
            ))
        })?;

        self.recorder.record_click(code, referrer, address).await;

        self.logger.log(
            LogLevel::Info,
            Package::Handler,
            format!("Redirecting shortcode '{code}' to original URL"),
        );

        Ok(location)
    }

    /// Click statistics for `code`; served for expired links too
    pub async fn stats(&self, code: &str) -> ServiceResult<StatsResponse> {
        let Some(record) = self.registry.lookup(code).await else {
            self.logger.log(
                LogLevel::Warn,
                Package::Service,
                format!("Stats requested for unknown shortcode '{code}'"),
            );
            return Err(ServiceError::NotFound(code.to_string()));
        };

        self.logger.log(
            LogLevel::Info,
            Package::Service,
            format!("Stats returned for shortcode '{code}'"),
        );

        Ok(StatsResponse::from_record(
            code.to_string(),
            record,
            self.clock.now(),
        ))
    }

    /// Drop records that expired more than `grace` ago
    pub async fn sweep_expired(&self, grace: chrono::Duration) -> usize {
        let removed = self.registry.sweep_expired(self.clock.now(), grace).await;
        if removed > 0 {
            self.logger.log(
                LogLevel::Info,
                Package::Service,
                format!("Swept {removed} expired short URLs"),
            );
        }
        removed
    }
}
