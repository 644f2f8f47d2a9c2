//! Geocoding: location string → (latitude, longitude, country).
//!
//! `GeoResolver` never fails. Empty or unresolvable locations and service
//! errors resolve to [`GeoPoint::fallback`], a fixed central-India point.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::gate::OutboundGate;

pub const FALLBACK_LATITUDE: f64 = 20.5937;
pub const FALLBACK_LONGITUDE: f64 = 78.9629;
pub const FALLBACK_COUNTRY: &str = "India";

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoder HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("geocoder response could not be parsed: {0}")]
    Parse(String),
}

/// A successful lookup. `country` is absent when the service omits it.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoHit {
    pub latitude: f64,
    pub longitude: f64,
    pub country: Option<String>,
}

/// Resolved coordinates attached to a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
    /// True when the default point was substituted.
    pub fallback: bool,
}

impl GeoPoint {
    pub fn fallback() -> Self {
        Self {
            latitude: FALLBACK_LATITUDE,
            longitude: FALLBACK_LONGITUDE,
            country: FALLBACK_COUNTRY.to_string(),
            fallback: true,
        }
    }

    fn from_hit(hit: GeoHit) -> Self {
        Self {
            latitude: hit.latitude,
            longitude: hit.longitude,
            country: hit
                .country
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_COUNTRY.to_string()),
            fallback: false,
        }
    }
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` means the service found nothing for `location`.
    async fn lookup(&self, location: &str) -> Result<Option<GeoHit>, GeocodeError>;
}

/// Nominatim-compatible search client.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    country: Option<String>,
}

impl NominatimGeocoder {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn lookup(&self, location: &str) -> Result<Option<GeoHit>, GeocodeError> {
        let places: Vec<NominatimPlace> = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", location),
                ("format", "json"),
                ("addressdetails", "1"),
                ("limit", "1"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        places.into_iter().next().map(parse_place).transpose()
    }
}

fn parse_place(place: NominatimPlace) -> Result<GeoHit, GeocodeError> {
    let latitude = place
        .lat
        .parse::<f64>()
        .map_err(|e| GeocodeError::Parse(format!("lat '{}': {e}", place.lat)))?;
    let longitude = place
        .lon
        .parse::<f64>()
        .map_err(|e| GeocodeError::Parse(format!("lon '{}': {e}", place.lon)))?;
    Ok(GeoHit {
        latitude,
        longitude,
        country: place.address.and_then(|a| a.country),
    })
}

/// Cached, paced, total geocoding over any [`Geocoder`].
pub struct GeoResolver {
    geocoder: Arc<dyn Geocoder>,
    gate: Arc<OutboundGate>,
    cache: DashMap<String, GeoPoint>,
}

impl GeoResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>, gate: Arc<OutboundGate>) -> Self {
        Self {
            geocoder,
            gate,
            cache: DashMap::new(),
        }
    }

    /// Resolves `location`, consulting the cache first.
    pub async fn resolve(&self, location: Option<&str>) -> GeoPoint {
        let key = match location.map(cache_key) {
            Some(key) if !key.is_empty() => key,
            _ => return GeoPoint::fallback(),
        };
        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }

        let point = {
            let _permit = self.gate.acquire().await;
            match self.geocoder.lookup(&key).await {
                Ok(Some(hit)) => GeoPoint::from_hit(hit),
                Ok(None) => {
                    debug!("no geocoding result for '{key}'");
                    GeoPoint::fallback()
                }
                Err(e) => {
                    warn!("geocoding '{key}' failed: {e}");
                    GeoPoint::fallback()
                }
            }
        };
        self.cache.insert(key, point.clone());
        point
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

/// Lowercased, trimmed, single-spaced form of a location.
pub fn cache_key(location: &str) -> String {
    location
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeGeocoder {
        calls: AtomicUsize,
        result: fn(&str) -> Result<Option<GeoHit>, GeocodeError>,
    }

    impl FakeGeocoder {
        fn new(result: fn(&str) -> Result<Option<GeoHit>, GeocodeError>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                result,
            })
        }
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn lookup(&self, location: &str) -> Result<Option<GeoHit>, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)(location)
        }
    }

    fn resolver(geocoder: Arc<FakeGeocoder>) -> GeoResolver {
        GeoResolver::new(geocoder, Arc::new(OutboundGate::new(2, Duration::ZERO)))
    }

    fn berlin(_: &str) -> Result<Option<GeoHit>, GeocodeError> {
        Ok(Some(GeoHit {
            latitude: 52.52,
            longitude: 13.405,
            country: Some("Deutschland".to_string()),
        }))
    }

    #[tokio::test]
    async fn test_empty_location_uses_fallback_without_lookup() {
        let geocoder = FakeGeocoder::new(berlin);
        let resolver = resolver(geocoder.clone());
        assert_eq!(resolver.resolve(None).await, GeoPoint::fallback());
        assert_eq!(resolver.resolve(Some("   ")).await, GeoPoint::fallback());
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unresolvable_and_failing_lookups_fall_back() {
        let none = resolver(FakeGeocoder::new(|_| Ok(None)));
        let point = none.resolve(Some("Atlantis")).await;
        assert!(point.fallback);
        assert_eq!(point.country, "India");

        let failing = resolver(FakeGeocoder::new(|_| Err(GeocodeError::Parse("boom".into()))));
        assert_eq!(failing.resolve(Some("Berlin")).await, GeoPoint::fallback());
    }

    #[tokio::test]
    async fn test_cache_is_keyed_by_normalized_location() {
        let geocoder = FakeGeocoder::new(berlin);
        let resolver = resolver(geocoder.clone());
        let first = resolver.resolve(Some("Berlin,  Germany")).await;
        let second = resolver.resolve(Some("  berlin, GERMANY ")).await;
        assert_eq!(first, second);
        assert!(!first.fallback);
        assert_eq!(first.country, "Deutschland");
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.cached_len(), 1);
    }

    #[tokio::test]
    async fn test_missing_country_defaults() {
        let resolver = resolver(FakeGeocoder::new(|_| {
            Ok(Some(GeoHit {
                latitude: 1.0,
                longitude: 2.0,
                country: None,
            }))
        }));
        let point = resolver.resolve(Some("Somewhere")).await;
        assert_eq!(point.country, "India");
        assert!(!point.fallback);
    }

    #[test]
    fn test_parse_place() {
        let places: Vec<NominatimPlace> = serde_json::from_str(
            r#"[{"lat": "52.5", "lon": "13.4", "address": {"country": "Germany"}}]"#,
        )
        .unwrap();
        let hit = parse_place(places.into_iter().next().unwrap()).unwrap();
        assert_eq!(hit.country.as_deref(), Some("Germany"));
        assert!((hit.latitude - 52.5).abs() < f64::EPSILON);

        let bad = NominatimPlace {
            lat: "north".into(),
            lon: "1".into(),
            address: None,
        };
        assert!(matches!(parse_place(bad), Err(GeocodeError::Parse(_))));
    }
}
