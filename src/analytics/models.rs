//! Data models for click analytics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::iso_millis;

/// Approximate location of a visitor, as reported by the geo resolver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub city: Option<String>,

    /// Region, state or province
    pub region: Option<String>,

    /// Country name
    pub country: Option<String>,
}

impl GeoLocation {
    pub fn is_empty(&self) -> bool {
        self.city.is_none() && self.region.is_none() && self.country.is_none()
    }
}

/// One successful redirect
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClickEvent {
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,

    /// Value of the `Referer` header, if any
    pub referrer: Option<String>,

    /// Absent when the lookup failed or no client address was known
    pub geo: Option<GeoLocation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_event_serializes_absent_fields_as_null() {
        let event = ClickEvent {
            timestamp: DateTime::from_timestamp_millis(1_700_000_000_123).unwrap(),
            referrer: None,
            geo: None,
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["timestamp"], "2023-11-14T22:13:20.123Z");
        assert!(json["referrer"].is_null());
        assert!(json["geo"].is_null());
    }

    #[test]
    fn test_geo_location_empty() {
        assert!(GeoLocation::default().is_empty());
        let geo = GeoLocation {
            country: Some("India".to_string()),
            ..Default::default()
        };
        assert!(!geo.is_empty());
    }
}
