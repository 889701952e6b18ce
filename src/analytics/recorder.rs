use std::sync::Arc;
use tracing::debug;

use crate::analytics::geo::GeoResolver;
use crate::analytics::ip_extractor::ClientAddress;
use crate::analytics::models::{ClickEvent, GeoLocation};
use crate::clock::Clock;
use crate::logging::{LogLevel, Package, RemoteLogger};
use crate::registry::Registry;

/// Appends click events to registry records.
///
/// The geo lookup runs before the registry lock is taken, so a slow or
/// failing resolver only delays the click it belongs to.
pub struct ClickRecorder {
    registry: Arc<Registry>,
    geo: Arc<dyn GeoResolver>,
    clock: Arc<dyn Clock>,
    logger: RemoteLogger,
}

impl ClickRecorder {
    pub fn new(
        registry: Arc<Registry>,
        geo: Arc<dyn GeoResolver>,
        clock: Arc<dyn Clock>,
        logger: RemoteLogger,
    ) -> Self {
        Self {
            registry,
            geo,
            clock,
            logger,
        }
    }

    /// Record one click on `code`. Never fails: resolver errors leave `geo`
    /// absent and a record swept mid-lookup drops the click.
    pub async fn record_click(&self, code: &str, referrer: Option<String>, address: &ClientAddress) {
        let timestamp = self.clock.now();
        let geo = match address.normalized_ip() {
            Some(ip) => self.lookup_geo(&ip).await,
            None => {
                self.logger.log(
                    LogLevel::Warn,
                    Package::Service,
                    format!("No client address for click on shortcode '{code}'"),
                );
                None
            }
        };

        let event = ClickEvent {
            timestamp,
            referrer,
            geo,
        };

        if !self.registry.append_click(code, event).await {
            debug!(short_code = %code, "record removed before click could be stored");
        }
    }

    async fn lookup_geo(&self, ip: &str) -> Option<GeoLocation> {
        match self.geo.resolve(ip).await {
            Ok(location) => Some(location),
            Err(err) => {
                self.logger.log(
                    LogLevel::Warn,
                    Package::Service,
                    format!("Failed to get geo info for IP {ip}: {err}"),
                );
                None
            }
        }
    }
}
