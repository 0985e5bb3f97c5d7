//! Country name → latitude/longitude via the Nominatim search API.

use log::info;
use reqwest::blocking::{Client, Request};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::metadata::MetadataTable;

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

pub trait Geocoder {
    fn locate(&self, country: &str) -> Result<GeoPoint>;
}

/// Blocking client; one request per call, no retry.
pub struct NominatimClient {
    client: Client,
    base_url: String,
}

impl NominatimClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_NOMINATIM_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        // Nominatim's usage policy requires an identifying agent.
        let client = Client::builder()
            .user_agent(concat!("phyloworld/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// `GET {base}/search?country=<name>&format=json&polygon=0`, with the
    /// name lower-cased and form-encoded.
    pub fn search_request(&self, country: &str) -> Result<Request> {
        let url = format!("{}/search", self.base_url);
        let query = country.trim().to_lowercase();
        let request = self
            .client
            .get(&url)
            .query(&[
                ("country", query.as_str()),
                ("format", "json"),
                ("polygon", "0"),
            ])
            .build()?;
        Ok(request)
    }
}

impl Geocoder for NominatimClient {
    fn locate(&self, country: &str) -> Result<GeoPoint> {
        let request = self.search_request(country)?;
        let body = self
            .client
            .execute(request)?
            .error_for_status()?
            .text()?;
        parse_search_response(&body, country)
    }
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: Coordinate,
    lon: Coordinate,
}

/// Nominatim returns coordinates as strings; accept numbers too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    fn value(&self, country: &str) -> Result<f64> {
        match self {
            Coordinate::Number(value) => Ok(*value),
            Coordinate::Text(text) => text.trim().parse().map_err(|_| {
                Error::lookup(format!("invalid coordinate '{text}' returned for {country}"))
            }),
        }
    }
}

/// First hit of a search response; an empty result list is a lookup error.
pub fn parse_search_response(body: &str, country: &str) -> Result<GeoPoint> {
    let hits: Vec<SearchHit> = serde_json::from_str(body)?;
    let first = hits
        .first()
        .ok_or_else(|| Error::lookup(format!("coordinates not found for {country}")))?;
    Ok(GeoPoint {
        latitude: first.lat.value(country)?,
        longitude: first.lon.value(country)?,
    })
}

/// Copy of `metadata` with every row's coordinates set from its category,
/// looked up once per distinct category in first-seen order.
pub fn merge_coordinates(metadata: &MetadataTable, geocoder: &dyn Geocoder) -> Result<MetadataTable> {
    let mut merged = metadata.clone();
    for country in metadata.categories() {
        info!("Getting coordinates for {country}");
        let point = geocoder.locate(&country)?;
        merged.set_category_coordinates(&country, point.latitude, point.longitude);
    }
    Ok(merged)
}
