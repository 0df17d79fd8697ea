use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::model::Position;

pub const LOOKUP_LIMIT: usize = 1;

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("Location not found")]
    NotFound,

    #[error("Search error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Search error: unexpected response ({0})")]
    InvalidResponse(#[from] serde_json::Error),
}

/// A search result with a usable coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub display_name: String,
    pub position: Position,
    pub address: Option<BTreeMap<String, String>>,
}

/// Free-text place search.
///
/// Implementors provide [`Geocoder::search`], the single-result and
/// suggestion variants are built on top of it.
#[async_trait::async_trait]
pub trait Geocoder: Send + Sync {
    async fn search(
        &self,
        query: &str,
        limit: usize,
        address_details: bool,
    ) -> Result<Vec<Place>, GeocodeError>;

    async fn lookup(&self, query: &str) -> Result<Place, GeocodeError> {
        self.search(query, LOOKUP_LIMIT, false)
            .await?
            .into_iter()
            .next()
            .ok_or(GeocodeError::NotFound)
    }

    async fn suggest(&self, query: &str, limit: usize) -> Result<Vec<Place>, GeocodeError> {
        self.search(query, limit, true).await
    }
}

/// Client for an OpenStreetMap Nominatim compatible `/search` endpoint.
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    pub fn new(config: &Config) -> anyhow::Result<NominatimClient> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Unable to build HTTP client")?;

        Ok(NominatimClient {
            client,
            base_url: config.geocoder_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl Geocoder for NominatimClient {
    async fn search(
        &self,
        query: &str,
        limit: usize,
        address_details: bool,
    ) -> Result<Vec<Place>, GeocodeError> {
        let limit = limit.to_string();
        let mut request = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("format", "json"), ("q", query), ("limit", limit.as_str())]);

        if address_details {
            request = request.query(&[("addressdetails", "1")]);
        }

        debug!(query, limit = limit.as_str(), "Querying geocoder");
        let body = request.send().await?.error_for_status()?.text().await?;
        parse_results(&body)
    }
}

#[derive(Deserialize)]
struct SearchResult {
    display_name: String,
    lat: String,
    lon: String,
    #[serde(default)]
    address: Option<BTreeMap<String, Value>>,
}

fn parse_results(body: &str) -> Result<Vec<Place>, GeocodeError> {
    let results: Vec<SearchResult> = serde_json::from_str(body)?;
    let mut places: Vec<Place> = Vec::with_capacity(results.len());

    for result in results {
        let lat = result.lat.trim().parse::<f64>().ok();
        let lon = result.lon.trim().parse::<f64>().ok();

        let Some(position) = lat
            .zip(lon)
            .and_then(|(lat, lon)| Position::new(lat, lon).ok())
        else {
            debug!(name = %result.display_name, "Skipping result without usable coordinates");
            continue;
        };

        let address = result.address.map(|address| {
            address
                .into_iter()
                .filter_map(|(key, value)| value.as_str().map(|it| (key, it.to_string())))
                .collect()
        });

        places.push(Place {
            display_name: result.display_name,
            position,
            address,
        });
    }

    Ok(places)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Geocoder serving canned results and recording its calls.
    #[derive(Default)]
    pub struct FakeGeocoder {
        pub places: Vec<Place>,
        pub fail: bool,
        pub delay: Duration,
        pub calls: Mutex<Vec<(String, usize, bool)>>,
    }

    impl FakeGeocoder {
        pub fn with_places(places: Vec<Place>) -> FakeGeocoder {
            FakeGeocoder { places, ..Default::default() }
        }

        pub fn calls(&self) -> Vec<(String, usize, bool)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Geocoder for FakeGeocoder {
        async fn search(
            &self,
            query: &str,
            limit: usize,
            address_details: bool,
        ) -> Result<Vec<Place>, GeocodeError> {
            self.calls.lock().unwrap().push((query.to_string(), limit, address_details));

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            if self.fail {
                let error = serde_json::from_str::<Value>("<html>").unwrap_err();
                return Err(GeocodeError::InvalidResponse(error));
            }

            Ok(self.places.iter().take(limit).cloned().collect())
        }
    }

    pub fn place(name: &str, lat: f64, lon: f64) -> Place {
        Place {
            display_name: name.to_string(),
            position: Position::new(lat, lon).unwrap(),
            address: None,
        }
    }

    #[test]
    fn parses_nominatim_response() {
        let body = r#"[
            {
                "place_id": 1,
                "display_name": "Hoan Kiem Lake, Hanoi, Vietnam",
                "lat": "21.0287747",
                "lon": "105.8523645",
                "address": {"city": "Hanoi", "country": "Vietnam", "place_rank": 20}
            },
            {"display_name": "Nowhere", "lat": "", "lon": "10"},
            {"display_name": "Off the map", "lat": "95.0", "lon": "10"},
            {"display_name": "Hanoi", "lat": "21.0283334", "lon": "105.854041"}
        ]"#;

        let places = parse_results(body).unwrap();

        assert_eq!(places.len(), 2);
        assert_eq!(places[0].display_name, "Hoan Kiem Lake, Hanoi, Vietnam");
        assert_eq!(places[0].position, Position::new(21.0287747, 105.8523645).unwrap());

        let address = places[0].address.as_ref().unwrap();
        assert_eq!(address.get("city").map(String::as_str), Some("Hanoi"));
        assert!(!address.contains_key("place_rank"));
        assert_eq!(places[1].address, None);
    }

    #[test]
    fn empty_response_is_empty() {
        assert!(parse_results("[]").unwrap().is_empty());
    }

    #[test]
    fn non_json_response_is_an_error() {
        assert!(matches!(
            parse_results("<html>Too many requests</html>"),
            Err(GeocodeError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn lookup_takes_top_result() {
        let geocoder = FakeGeocoder::with_places(vec![
            place("Hue", 16.4637, 107.5909),
            place("Hue 2", 1.0, 1.0),
        ]);

        let found = geocoder.lookup("hue").await.unwrap();

        assert_eq!(found.display_name, "Hue");
        assert_eq!(geocoder.calls(), vec![("hue".to_string(), 1, false)]);
    }

    #[tokio::test]
    async fn lookup_without_results_is_not_found() {
        let geocoder = FakeGeocoder::default();
        let error = geocoder.lookup("atlantis").await.unwrap_err();

        assert!(matches!(error, GeocodeError::NotFound));
        assert_eq!(error.to_string(), "Location not found");
    }

    #[tokio::test]
    async fn suggest_requests_address_details() {
        let geocoder = FakeGeocoder::with_places(vec![place("A", 1.0, 1.0)]);
        geocoder.suggest("sapa", 5).await.unwrap();
        assert_eq!(geocoder.calls(), vec![("sapa".to_string(), 5, true)]);
    }

    #[tokio::test]
    async fn unreachable_service_is_transport_error() {
        let config = Config {
            geocoder_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 2,
            ..Config::default()
        };
        let client = NominatimClient::new(&config).unwrap();

        let error = client.lookup("hanoi").await.unwrap_err();

        assert!(matches!(error, GeocodeError::Transport(_)));
        assert!(error.to_string().starts_with("Search error"));
    }
}
