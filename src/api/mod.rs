//! Data access for the Digitraffic rail API.
//!
//! Every request goes through a [`Transport`], which turns a path relative to
//! the API root into a decoded JSON document. [`HttpTransport`] is the real
//! implementation; tests drive [`Api`] with canned documents instead.

mod models;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use geojson::FeatureCollection;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;

pub use self::models::{
    Journey, LatLon, Locomotive, Station, StationNameLookup, TrainComposition, TrainPosition,
    Wagon,
};
use self::models::{CompositionResponse, TrainLocationProperties};
use crate::config::Config;
use crate::error::{Error, Result};

// --- Endpoints ---
pub const TRAIN_LOCATIONS_PATH: &str = "/train-locations.geojson/latest";
pub const UPDATE_TIMES_PATH: &str = "/update-times";
pub const STATIONS_PATH: &str = "/metadata/stations";

const USER_HEADER: &str = "Digitraffic-User";

pub fn composition_path(departure_date: NaiveDate, train_number: u32) -> String {
    format!("/compositions/{}/{}", departure_date.format("%Y-%m-%d"), train_number)
}

/// Outbound GET returning a JSON document.
pub trait Transport: Send + Sync + 'static {
    fn get_json(&self, path: &str) -> impl Future<Output = Result<Value>> + Send;
}

/// `reqwest` backed transport. Every request carries the `Digitraffic-User`
/// header and asks for a gzip encoded body.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, user: &str, timeout: Duration) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        // from_bytes accepts non-ASCII application names such as "Junahenkilö"
        let user = HeaderValue::from_bytes(user.as_bytes())
            .map_err(|e| anyhow::anyhow!("invalid {USER_HEADER} header value {user:?}: {e}"))?;
        headers.insert(USER_HEADER, user);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .gzip(true)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(&config.base_url, &config.user, config.timeout)
    }
}

impl Transport for HttpTransport {
    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("GET {url}");

        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| Error::Transport { url: url.clone(), source })?;

        if !res.status().is_success() {
            return Err(Error::Status { url, status: res.status().as_u16() });
        }

        res.json::<Value>().await.map_err(|source| Error::Transport { url, source })
    }
}

/// Typed operations over a [`Transport`].
#[derive(Debug)]
pub struct Api<T> {
    transport: Arc<T>,
}

impl<T> Clone for Api<T> {
    fn clone(&self) -> Self {
        Self { transport: Arc::clone(&self.transport) }
    }
}

impl<T: Transport> Api<T> {
    pub fn new(transport: T) -> Self {
        Self { transport: Arc::new(transport) }
    }

    /// Latest position of every running train.
    ///
    /// Failures are logged and reported as an empty list, so "no trains" and
    /// "fetch failed" look the same to the caller.
    pub async fn fetch_running_trains(&self) -> Vec<TrainPosition> {
        match self.try_fetch_running_trains().await {
            Ok(trains) => {
                log::debug!("Fetched {} train positions", trains.len());
                trains
            }
            Err(e) => {
                log::error!("Error fetching running trains: {e}");
                Vec::new()
            }
        }
    }

    async fn try_fetch_running_trains(&self) -> Result<Vec<TrainPosition>> {
        let body = self.transport.get_json(TRAIN_LOCATIONS_PATH).await?;
        let collection: FeatureCollection =
            serde_json::from_value(body).map_err(|e| Error::decode("train locations", e))?;

        collection
            .features
            .into_iter()
            .map(|feature| {
                let location = match feature.geometry.as_ref().map(|g| &g.value) {
                    Some(geojson::Value::Point(position)) => LatLon::from_position(position),
                    _ => None,
                }
                .ok_or_else(|| Error::UnexpectedFormat("train feature without a point".into()))?;

                let properties = Value::Object(feature.properties.unwrap_or_default());
                let props: TrainLocationProperties = serde_json::from_value(properties)
                    .map_err(|e| Error::decode("train properties", e))?;

                Ok(TrainPosition {
                    train_number: props.train_number,
                    departure_date: props.departure_date,
                    timestamp: props.timestamp,
                    speed: props.speed,
                    accuracy: props.accuracy,
                    location,
                })
            })
            .collect()
    }

    /// Station metadata. Errors unless the payload is a JSON array.
    pub async fn fetch_stations(&self) -> Result<Vec<Station>> {
        let body = self.transport.get_json(STATIONS_PATH).await?;
        if !body.is_array() {
            return Err(Error::UnexpectedFormat("stations data is not an array".to_string()));
        }
        serde_json::from_value(body).map_err(|e| Error::decode("station list", e))
    }

    pub async fn fetch_station_name_lookup(&self) -> Result<StationNameLookup> {
        let stations = self.fetch_stations().await?;
        Ok(StationNameLookup::from_stations(&stations))
    }

    /// Composition of one train run. `None` when the API knows no journey
    /// sections for it.
    pub async fn fetch_composition(
        &self,
        train_number: u32,
        departure_date: NaiveDate,
        lookup: &StationNameLookup,
    ) -> Result<Option<TrainComposition>> {
        let path = composition_path(departure_date, train_number);
        let body = self.transport.get_json(&path).await?;
        if body.is_null() {
            return Ok(None);
        }

        let response: CompositionResponse =
            serde_json::from_value(body).map_err(|e| Error::decode("train composition", e))?;
        let composition = response.into_composition(train_number, departure_date, lookup);
        if composition.is_none() {
            log::warn!("No composition data available for train {train_number} on {departure_date}");
        }
        Ok(composition)
    }

    pub async fn fetch_update_times(&self) -> Result<Value> {
        self.transport.get_json(UPDATE_TIMES_PATH).await
    }
}
