pub mod url;

pub use url::{CreateUrlRequest, CreateUrlResponse, StatsResponse, UrlRecord};

/// Serializes timestamps as ISO-8601 UTC with millisecond precision,
/// e.g. `2025-01-01T00:00:00.000Z`
pub(crate) mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::Serializer;

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}
