use std::path::PathBuf;
use std::time::Duration;

use crate::api::LatLon;

// --- Configuration ---
pub const DEFAULT_BASE_URL: &str = "https://rata.digitraffic.fi/api/v1";
pub const DEFAULT_USER: &str = concat!("rata-map/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_REFRESH: Duration = Duration::from_secs(5);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_OUTPUT: &str = "rata-map.geojson";

/// Initial map view and tile source, written alongside the markers so a web
/// map can pick them up.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub center: LatLon,
    pub zoom: u8,
    pub tile_url: String,
    pub attribution: String,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: LatLon::new(61.12171, 28.49411),
            zoom: 7,
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    /// Value of the `Digitraffic-User` header.
    pub user: String,
    pub refresh_interval: Duration,
    pub timeout: Duration,
    pub output: PathBuf,
    pub view: MapView,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user: DEFAULT_USER.to_string(),
            refresh_interval: DEFAULT_REFRESH,
            timeout: DEFAULT_TIMEOUT,
            output: PathBuf::from(DEFAULT_OUTPUT),
            view: MapView::default(),
        }
    }
}
