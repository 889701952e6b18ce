//! Click analytics
//!
//! Every redirect appends a `ClickEvent` to its record. The visitor address is
//! normalized by `ip_extractor` and resolved to a rough location by a
//! `GeoResolver`. Resolver failures never fail the redirect.

pub mod geo;
pub mod ip_extractor;
pub mod models;
pub mod recorder;

pub use geo::{DisabledGeoResolver, GeoLookupError, GeoResolver, HttpGeoResolver};
pub use ip_extractor::{normalize_ip, ClientAddress};
pub use models::{ClickEvent, GeoLocation};
pub use recorder::ClickRecorder;
