//! IP geolocation through a third-party HTTP API
//!
//! The default endpoint is ipapi.co, which answers
//! `{"city": .., "region": .., "country_name": ..}` on success and
//! `{"error": true, "reason": ..}` for reserved or unknown addresses.

use anyhow::Context;
use async_trait::async_trait;
use moka::future::Cache;
use serde::Deserialize;
use std::net::IpAddr;
use thiserror::Error;
use tracing::trace;

use crate::analytics::models::GeoLocation;
use crate::config::GeoConfig;

/// Placeholder in `GeoConfig::api_url` replaced by the looked-up address
pub const IP_PLACEHOLDER: &str = "{ip}";

#[derive(Debug, Error)]
pub enum GeoLookupError {
    #[error("geo lookup is disabled")]
    Disabled,
    #[error("'{0}' is not a valid IP address")]
    InvalidAddress(String),
    #[error("{0} is not a publicly routable address")]
    NotRoutable(IpAddr),
    #[error("geo request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("geo service rejected {ip}: {reason}")]
    Rejected { ip: String, reason: String },
    #[error("geo service returned no location for {0}")]
    Empty(String),
}

/// Resolves an IP address to a rough location
#[async_trait]
pub trait GeoResolver: Send + Sync {
    async fn resolve(&self, ip: &str) -> Result<GeoLocation, GeoLookupError>;

    fn name(&self) -> &'static str;
}

/// Resolver used when geo lookups are switched off
pub struct DisabledGeoResolver;

#[async_trait]
impl GeoResolver for DisabledGeoResolver {
    async fn resolve(&self, _ip: &str) -> Result<GeoLocation, GeoLookupError> {
        Err(GeoLookupError::Disabled)
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

#[derive(Debug, Deserialize)]
struct GeoApiResponse {
    #[serde(default)]
    error: bool,
    reason: Option<String>,
    city: Option<String>,
    region: Option<String>,
    country_name: Option<String>,
}

/// HTTP geo resolver with a bounded cache of successful answers
pub struct HttpGeoResolver {
    client: reqwest::Client,
    api_url: String,
    cache: Cache<String, GeoLocation>,
}

impl HttpGeoResolver {
    pub fn new(config: &GeoConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build geo lookup HTTP client")?;

        let cache = Cache::builder()
            .max_capacity(config.cache_capacity)
            .time_to_live(config.cache_ttl())
            .build();

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            cache,
        })
    }

    fn url_for(&self, ip: &str) -> String {
        self.api_url.replace(IP_PLACEHOLDER, ip)
    }

    async fn fetch(&self, ip: &str) -> Result<GeoLocation, GeoLookupError> {
        let body: GeoApiResponse = self
            .client
            .get(self.url_for(ip))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if body.error {
            return Err(GeoLookupError::Rejected {
                ip: ip.to_string(),
                reason: body.reason.unwrap_or_else(|| "unknown".to_string()),
            });
        }

        let location = GeoLocation {
            city: non_empty(body.city),
            region: non_empty(body.region),
            country: non_empty(body.country_name),
        };

        if location.is_empty() {
            return Err(GeoLookupError::Empty(ip.to_string()));
        }

        Ok(location)
    }
}

#[async_trait]
impl GeoResolver for HttpGeoResolver {
    async fn resolve(&self, ip: &str) -> Result<GeoLocation, GeoLookupError> {
        let addr: IpAddr = ip
            .parse()
            .map_err(|_| GeoLookupError::InvalidAddress(ip.to_string()))?;

        // The public API can only answer "reserved" for these
        if !is_publicly_routable(&addr) {
            return Err(GeoLookupError::NotRoutable(addr));
        }

        if let Some(cached) = self.cache.get(ip).await {
            trace!(ip, "geo cache hit");
            return Ok(cached);
        }

        let location = self.fetch(ip).await?;
        self.cache.insert(ip.to_string(), location.clone()).await;
        Ok(location)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// False for loopback, private, link-local, unspecified and broadcast ranges
pub fn is_publicly_routable(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast())
        }
        IpAddr::V6(v6) => {
            !(v6.is_loopback()
                || v6.is_unspecified()
                // fc00::/7 unique local
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                // fe80::/10 link local
                || (v6.segments()[0] & 0xffc0) == 0xfe80)
        }
    }
}
