use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

use super::iso_millis;
use crate::analytics::ClickEvent;

/// A shortened URL and its click history
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlRecord {
    pub url: String,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub expires_at: DateTime<Utc>,
    pub clicks: Vec<ClickEvent>,
}

impl UrlRecord {
    pub fn new(url: String, created_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            url,
            created_at,
            expires_at,
            clicks: Vec::new(),
        }
    }

    /// A record stays active up to and including its expiry instant
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateUrlRequest {
    pub url: Option<String>,
    /// Requested lifetime in minutes. Accepts `10` or `"10"`.
    #[serde(default, deserialize_with = "minutes")]
    pub validity: Option<i64>,
    #[serde(alias = "customCode")]
    pub shortcode: Option<String>,
}

/// Whole minutes given as a JSON integer or a numeric string
fn minutes<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Minutes {
        Number(i64),
        Text(String),
    }

    match Option::<Minutes>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Minutes::Number(n)) => Ok(Some(n)),
        Some(Minutes::Text(text)) => text.trim().parse().map(Some).map_err(|_| {
            de::Error::custom(format!("validity must be a whole number of minutes, got '{text}'"))
        }),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUrlResponse {
    pub short_link: String,
    #[serde(with = "iso_millis")]
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub short_code: String,
    pub url: String,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub expires_at: DateTime<Utc>,
    pub expired: bool,
    pub total_clicks: usize,
    pub clicks: Vec<ClickEvent>,
}

impl StatsResponse {
    pub fn from_record(short_code: String, record: UrlRecord, now: DateTime<Utc>) -> Self {
        Self {
            short_code,
            expired: record.is_expired(now),
            total_clicks: record.clicks.len(),
            url: record.url,
            created_at: record.created_at,
            expires_at: record.expires_at,
            clicks: record.clicks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record_at(created: DateTime<Utc>, minutes: i64) -> UrlRecord {
        UrlRecord::new(
            "https://example.com".to_string(),
            created,
            created + Duration::minutes(minutes),
        )
    }

    #[test]
    fn test_expiry_boundary() {
        let created = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let record = record_at(created, 1);

        assert!(!record.is_expired(record.expires_at - Duration::seconds(1)));
        assert!(!record.is_expired(record.expires_at));
        assert!(record.is_expired(record.expires_at + Duration::seconds(1)));
    }

    #[test]
    fn test_create_request_accepts_custom_code_alias() {
        let req: CreateUrlRequest =
            serde_json::from_str(r#"{"url": "https://example.com", "customCode": "abc123"}"#)
                .unwrap();
        assert_eq!(req.shortcode.as_deref(), Some("abc123"));
        assert_eq!(req.validity, None);
    }

    #[test]
    fn test_validity_accepts_numeric_string() {
        let req: CreateUrlRequest =
            serde_json::from_str(r#"{"url": "https://example.com", "validity": " 10 "}"#).unwrap();
        assert_eq!(req.validity, Some(10));

        let req: CreateUrlRequest =
            serde_json::from_str(r#"{"url": "https://example.com", "validity": 15}"#).unwrap();
        assert_eq!(req.validity, Some(15));

        let req: CreateUrlRequest =
            serde_json::from_str(r#"{"url": "https://example.com", "validity": null}"#).unwrap();
        assert_eq!(req.validity, None);
    }

    #[test]
    fn test_validity_rejects_non_numeric() {
        for body in [
            r#"{"url": "https://example.com", "validity": "ten"}"#,
            r#"{"url": "https://example.com", "validity": 1.5}"#,
            r#"{"url": "https://example.com", "validity": true}"#,
        ] {
            assert!(serde_json::from_str::<CreateUrlRequest>(body).is_err(), "{body}");
        }
    }

    #[test]
    fn test_stats_response_shape() {
        let created = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let stats = StatsResponse::from_record("abc123".to_string(), record_at(created, 30), created);
        let json = serde_json::to_value(&stats).unwrap();

        assert_eq!(json["shortCode"], "abc123");
        assert_eq!(json["createdAt"], "2023-11-14T22:13:20.000Z");
        assert_eq!(json["expiresAt"], "2023-11-14T22:43:20.000Z");
        assert_eq!(json["expired"], false);
        assert_eq!(json["totalClicks"], 0);
        assert!(json["clicks"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_create_response_omits_empty_message() {
        let created = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let resp = CreateUrlResponse {
            short_link: "http://localhost:8000/r/abc123".to_string(),
            expires_at: created,
            message: None,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["shortLink"], "http://localhost:8000/r/abc123");
        assert!(json.get("message").is_none());
    }
}
