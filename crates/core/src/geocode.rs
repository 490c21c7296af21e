//! Open-Meteo geocoding client
//!
//! Resolves a free-text place name to coordinates and a canonical name.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{check_status, Result};
use crate::types::{Language, Location};

const GEOCODE_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";

/// Resolves place names; `Ok(None)` means the service knows no such place
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn locate(&self, place: &str, lang: Language) -> Result<Option<Location>>;
}

#[derive(Deserialize, Debug)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize, Debug)]
struct GeocodeResult {
    name: String,
    latitude: f64,
    longitude: f64,
}

impl GeocodeResponse {
    fn into_first(self) -> Option<Location> {
        self.results.into_iter().next().map(|r| Location {
            latitude: r.latitude,
            longitude: r.longitude,
            name: r.name,
        })
    }
}

/// Open-Meteo geocoding API client
pub struct OpenMeteoGeocoder {
    client: Client,
}

impl OpenMeteoGeocoder {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Geocoder for OpenMeteoGeocoder {
    async fn locate(&self, place: &str, lang: Language) -> Result<Option<Location>> {
        let response = self
            .client
            .get(GEOCODE_URL)
            .query(&[
                ("name", place),
                ("count", "1"),
                ("language", lang.code()),
                ("format", "json"),
            ])
            .send()
            .await?;

        let resp: GeocodeResponse = check_status("geocoding API", response).await?.json().await?;
        let location = resp.into_first();

        tracing::debug!(place, found = location.is_some(), "geocoded place");
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_result() {
        let resp: GeocodeResponse = serde_json::from_str(
            r#"{"results":[
                {"id":683506,"name":"București","latitude":44.43225,"longitude":26.10626,"country":"România"},
                {"id":1,"name":"Other","latitude":0.0,"longitude":0.0}
            ],"generationtime_ms":0.9}"#,
        )
        .unwrap();
        let location = resp.into_first().unwrap();
        assert_eq!(location.name, "București");
        assert!((location.latitude - 44.43225).abs() < 1e-6);
        assert!((location.longitude - 26.10626).abs() < 1e-6);
    }

    #[test]
    fn test_no_results_field() {
        let resp: GeocodeResponse = serde_json::from_str(r#"{"generationtime_ms":0.5}"#).unwrap();
        assert!(resp.into_first().is_none());
    }

    /// Hits the live API. Run with: cargo test test_live_geocode -- --ignored
    #[tokio::test]
    #[ignore]
    async fn test_live_geocode() {
        let geocoder = OpenMeteoGeocoder::new(Client::new());
        let location = geocoder.locate("Paris", Language::En).await.unwrap().unwrap();
        assert_eq!(location.name, "Paris");
    }
}
