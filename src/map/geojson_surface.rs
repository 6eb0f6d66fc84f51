use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use serde_json::json;

use super::{MapSurface, MarkerId, MarkerKind, Popup};
use crate::api::LatLon;
use crate::config::MapView;

struct PlacedMarker {
    kind: MarkerKind,
    at: LatLon,
    popup: Popup,
}

/// Map surface that keeps the marker layer as a GeoJSON FeatureCollection on
/// disk. Opened popups are also printed to stdout.
pub struct GeoJsonSurface {
    path: PathBuf,
    view: MapView,
    markers: BTreeMap<MarkerId, PlacedMarker>,
    open: Option<MarkerId>,
    next_id: u64,
}

impl GeoJsonSurface {
    pub fn new(path: impl Into<PathBuf>, view: MapView) -> Self {
        Self { path: path.into(), view, markers: BTreeMap::new(), open: None, next_id: 0 }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn to_feature_collection(&self) -> FeatureCollection {
        let features = self
            .markers
            .iter()
            .map(|(id, marker)| {
                let mut properties = JsonObject::new();
                properties.insert("kind".to_string(), json!(marker.kind));
                properties.insert("title".to_string(), json!(marker.popup.title));
                properties.insert("popup".to_string(), json!(marker.popup.to_html()));
                properties.insert("popupOpen".to_string(), json!(self.open == Some(*id)));
                properties.insert("marker-color".to_string(), json!(marker.kind.color()));

                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(geojson::Value::Point(vec![marker.at.lon, marker.at.lat]))),
                    id: Some(geojson::feature::Id::Number(id.0.into())),
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        let mut foreign = JsonObject::new();
        foreign.insert(
            "view".to_string(),
            json!({
                "center": [self.view.center.lat, self.view.center.lon],
                "zoom": self.view.zoom,
                "tiles": self.view.tile_url,
                "attribution": self.view.attribution,
            }),
        );

        FeatureCollection { bbox: None, features, foreign_members: Some(foreign) }
    }
}

impl MapSurface for GeoJsonSurface {
    fn add_marker(&mut self, kind: MarkerKind, at: LatLon, popup: Popup) -> MarkerId {
        self.next_id += 1;
        let id = MarkerId(self.next_id);
        self.markers.insert(id, PlacedMarker { kind, at, popup });
        id
    }

    fn bind_popup(&mut self, id: MarkerId, popup: Popup) {
        if let Some(marker) = self.markers.get_mut(&id) {
            marker.popup = popup;
        }
    }

    fn open_popup(&mut self, id: MarkerId) {
        if let Some(marker) = self.markers.get(&id) {
            self.open = Some(id);
            println!("{}", marker.popup);
        }
    }

    fn remove_markers(&mut self, kind: MarkerKind) {
        self.markers.retain(|_, marker| marker.kind != kind);
        if self.open.is_some_and(|id| !self.markers.contains_key(&id)) {
            self.open = None;
        }
    }

    fn flush(&mut self) -> Result<()> {
        let body = serde_json::to_string_pretty(&self.to_feature_collection())
            .context("Failed to serialize marker layer")?;

        // Write next to the target and rename so readers never see a partial file
        let tmp = self.path.with_extension("geojson.tmp");
        fs::write(&tmp, body).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path).with_context(|| format!("Failed to replace {}", self.path.display()))?;

        log::debug!("Wrote {} markers to {}", self.markers.len(), self.path.display());
        Ok(())
    }
}
