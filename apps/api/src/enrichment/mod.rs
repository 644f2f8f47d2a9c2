//! Enrichment collaborators consulted after extraction: geocoding and optional
//! gender inference. Both are rate-limited outbound services.

pub mod gate;
pub mod gender;
pub mod geocode;

pub use gate::OutboundGate;
pub use gender::{GenderClassifier, GenderizeClient};
pub use geocode::{GeoPoint, GeoResolver, Geocoder, NominatimGeocoder};
