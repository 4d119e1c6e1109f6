//! "Find nearby lounges": current position → place name → chat question.
//!
//! Failures never reach the conversation; the caller reports them as a
//! transient notification instead.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::GeoError;

pub const REVERSE_GEOCODE_URL: &str = "https://api.bigdatacloud.net/data/reverse-geocode-client";
pub const IP_LOCATE_URL: &str = "https://ipapi.co/json/";

/// Used when the geocoder knows neither city nor locality.
pub const UNKNOWN_PLACE: &str = "your location";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Source of the user's current position.
#[async_trait]
pub trait Locator: Send + Sync {
    async fn locate(&self) -> Result<Coordinates, GeoError>;
}

/// Position taken from configuration.
pub struct FixedLocator(pub Coordinates);

#[async_trait]
impl Locator for FixedLocator {
    async fn locate(&self) -> Result<Coordinates, GeoError> {
        Ok(self.0)
    }
}

#[derive(Deserialize)]
struct IpLocation {
    latitude: Option<f64>,
    longitude: Option<f64>,
    reason: Option<String>,
}

/// Approximate position from the public IP address.
pub struct IpLocator {
    client: Client,
    url: String,
}

impl IpLocator {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            url: IP_LOCATE_URL.to_string(),
        }
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }
}

impl Default for IpLocator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Locator for IpLocator {
    async fn locate(&self) -> Result<Coordinates, GeoError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| GeoError::Position(e.to_string()))?;

        let location: IpLocation = response
            .json()
            .await
            .map_err(|e| GeoError::Position(e.to_string()))?;

        match (location.latitude, location.longitude) {
            (Some(latitude), Some(longitude)) => Ok(Coordinates { latitude, longitude }),
            _ => Err(GeoError::Position(
                location
                    .reason
                    .unwrap_or_else(|| "position unavailable".to_string()),
            )),
        }
    }
}

#[derive(Deserialize)]
struct ReverseGeocodeResponse {
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    locality: Option<String>,
}

#[derive(Clone)]
pub struct ReverseGeocoder {
    client: Client,
    url: String,
}

impl ReverseGeocoder {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            url: REVERSE_GEOCODE_URL.to_string(),
        }
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    /// Human-readable name for a position: city, else locality, else a placeholder.
    pub async fn place_name(&self, coords: Coordinates) -> Result<String, GeoError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("latitude", coords.latitude.to_string()),
                ("longitude", coords.longitude.to_string()),
                ("localityLanguage", "en".to_string()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| GeoError::ReverseGeocode(e.to_string()))?;

        let data: ReverseGeocodeResponse = response
            .json()
            .await
            .map_err(|e| GeoError::ReverseGeocode(e.to_string()))?;

        let place = [data.city, data.locality]
            .into_iter()
            .flatten()
            .find(|name| !name.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_PLACE.to_string());

        Ok(place)
    }
}

impl Default for ReverseGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

/// A ready-to-send question about lounges near the user.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyQuery {
    pub place: String,
    pub coordinates: Coordinates,
    pub question: String,
}

pub fn nearby_query(place: &str, coords: Coordinates) -> String {
    format!(
        "What airport lounges are available near {} (coordinates: {:.2}, {:.2})?",
        place, coords.latitude, coords.longitude
    )
}

pub struct GeoShortcut {
    locator: Box<dyn Locator>,
    geocoder: ReverseGeocoder,
}

impl GeoShortcut {
    pub fn new(locator: Box<dyn Locator>, geocoder: ReverseGeocoder) -> Self {
        Self { locator, geocoder }
    }

    pub async fn resolve(&self) -> Result<NearbyQuery, GeoError> {
        let coordinates = self.locator.locate().await?;
        tracing::debug!(?coordinates, "resolved position");

        let place = self.geocoder.place_name(coordinates).await?;
        tracing::info!(%place, "searching for lounges near current location");

        Ok(NearbyQuery {
            question: nearby_query(&place, coordinates),
            place,
            coordinates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const JFK: Coordinates = Coordinates {
        latitude: 40.641_311,
        longitude: -73.778_139,
    };

    struct DeniedLocator;

    #[async_trait]
    impl Locator for DeniedLocator {
        async fn locate(&self) -> Result<Coordinates, GeoError> {
            Err(GeoError::Position("User denied Geolocation".to_string()))
        }
    }

    async fn geocoder_returning(body: serde_json::Value) -> (MockServer, ReverseGeocoder) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/reverse-geocode-client"))
            .and(query_param("localityLanguage", "en"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        let geocoder = ReverseGeocoder::new()
            .with_url(&format!("{}/data/reverse-geocode-client", server.uri()));
        (server, geocoder)
    }

    #[test]
    fn test_nearby_query_rounds_coordinates() {
        assert_eq!(
            nearby_query("New York", JFK),
            "What airport lounges are available near New York (coordinates: 40.64, -73.78)?"
        );
    }

    #[tokio::test]
    async fn test_place_prefers_city() {
        let (_server, geocoder) =
            geocoder_returning(serde_json::json!({ "city": "New York", "locality": "Queens" })).await;
        assert_eq!(geocoder.place_name(JFK).await.unwrap(), "New York");
    }

    #[tokio::test]
    async fn test_place_falls_back_to_locality() {
        let (_server, geocoder) =
            geocoder_returning(serde_json::json!({ "city": "", "locality": "Jamaica" })).await;
        assert_eq!(geocoder.place_name(JFK).await.unwrap(), "Jamaica");
    }

    #[tokio::test]
    async fn test_place_skips_null_city() {
        let (_server, geocoder) =
            geocoder_returning(serde_json::json!({ "city": null, "locality": "Jamaica" })).await;
        assert_eq!(geocoder.place_name(JFK).await.unwrap(), "Jamaica");
    }

    #[tokio::test]
    async fn test_place_defaults_when_names_are_null() {
        let (_server, geocoder) =
            geocoder_returning(serde_json::json!({ "city": null, "locality": null })).await;
        assert_eq!(geocoder.place_name(JFK).await.unwrap(), UNKNOWN_PLACE);
    }

    #[tokio::test]
    async fn test_place_defaults_when_unknown() {
        let (_server, geocoder) = geocoder_returning(serde_json::json!({ "countryName": "" })).await;
        assert_eq!(geocoder.place_name(JFK).await.unwrap(), UNKNOWN_PLACE);
    }

    #[tokio::test]
    async fn test_geocoder_sends_coordinates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("latitude", "40.641311"))
            .and(query_param("longitude", "-73.778139"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "city": "New York" })))
            .expect(1)
            .mount(&server)
            .await;

        let geocoder = ReverseGeocoder::new().with_url(&server.uri());
        assert_eq!(geocoder.place_name(JFK).await.unwrap(), "New York");
    }

    #[tokio::test]
    async fn test_geocoder_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let geocoder = ReverseGeocoder::new().with_url(&server.uri());
        let err = geocoder.place_name(JFK).await.unwrap_err();
        assert!(matches!(err, GeoError::ReverseGeocode(_)));
    }

    #[tokio::test]
    async fn test_shortcut_builds_question() {
        let (_server, geocoder) =
            geocoder_returning(serde_json::json!({ "city": "New York" })).await;
        let shortcut = GeoShortcut::new(Box::new(FixedLocator(JFK)), geocoder);

        let nearby = shortcut.resolve().await.unwrap();
        assert_eq!(nearby.place, "New York");
        assert_eq!(nearby.coordinates, JFK);
        assert_eq!(nearby.question, nearby_query("New York", JFK));
    }

    #[tokio::test]
    async fn test_shortcut_stops_when_position_denied() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "city": "X" })))
            .expect(0)
            .mount(&server)
            .await;

        let shortcut = GeoShortcut::new(
            Box::new(DeniedLocator),
            ReverseGeocoder::new().with_url(&server.uri()),
        );
        let err = shortcut.resolve().await.unwrap_err();
        assert!(matches!(err, GeoError::Position(_)));
        assert!(err.to_string().contains("User denied Geolocation"));
    }

    #[tokio::test]
    async fn test_ip_locator_parses_position() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "city": "Dubai", "latitude": 25.2532, "longitude": 55.3657
            })))
            .mount(&server)
            .await;

        let locator = IpLocator::new().with_url(&format!("{}/json/", server.uri()));
        let coords = locator.locate().await.unwrap();
        assert_eq!(coords, Coordinates { latitude: 25.2532, longitude: 55.3657 });
    }

    #[tokio::test]
    async fn test_ip_locator_reports_reason() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": true, "reason": "RateLimited"
            })))
            .mount(&server)
            .await;

        let locator = IpLocator::new().with_url(&server.uri());
        let err = locator.locate().await.unwrap_err();
        assert!(matches!(err, GeoError::Position(ref r) if r == "RateLimited"));
    }
}
