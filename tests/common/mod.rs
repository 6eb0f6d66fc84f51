#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rata_map::api::{LatLon, Transport};
use rata_map::map::{MapSurface, MarkerId, MarkerKind, Popup};
use rata_map::{Error, Result};
use serde_json::{Value, json};

enum Canned {
    Body(Value),
    Status(u16),
}

/// Transport serving canned documents by path and counting requests.
#[derive(Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<HashMap<String, Canned>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport with one station and one running train.
    #[must_use]
    pub fn helsinki() -> Self {
        let mock = Self::new();
        mock.respond("/metadata/stations", stations());
        mock.respond("/train-locations.geojson/latest", train_locations(&[(27, [24.94, 60.17])]));
        mock
    }

    pub fn respond(&self, path: &str, body: Value) {
        self.responses.lock().unwrap().insert(path.to_string(), Canned::Body(body));
    }

    pub fn fail(&self, path: &str, status: u16) {
        self.responses.lock().unwrap().insert(path.to_string(), Canned::Status(status));
    }

    pub fn calls(&self, path: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|p| *p == path).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Transport for MockTransport {
    async fn get_json(&self, path: &str) -> Result<Value> {
        self.calls.lock().unwrap().push(path.to_string());

        let url = format!("http://localhost{path}");
        match self.responses.lock().unwrap().get(path) {
            Some(Canned::Body(body)) => Ok(body.clone()),
            Some(Canned::Status(status)) => Err(Error::Status { url, status: *status }),
            None => Err(Error::Status { url, status: 404 }),
        }
    }
}

pub fn stations() -> Value {
    json!([
        { "stationShortCode": "HKI", "stationName": "Helsinki", "latitude": 60.17, "longitude": 24.94 }
    ])
}

/// Train location feature collection; positions are `[lon, lat]`.
pub fn train_locations(trains: &[(u32, [f64; 2])]) -> Value {
    let features: Vec<Value> = trains
        .iter()
        .map(|(number, position)| {
            json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": position },
                "properties": {
                    "trainNumber": number,
                    "departureDate": "2024-03-01",
                    "timestamp": "2024-03-01T08:15:30.000Z",
                    "speed": 120,
                    "accuracy": 5
                }
            })
        })
        .collect();
    json!({ "type": "FeatureCollection", "features": features })
}

pub fn composition(train_number: u32) -> Value {
    json!({
        "trainNumber": train_number,
        "departureDate": "2024-03-01",
        "trainType": "IC",
        "trainCategory": "Long-distance",
        "journeySections": [{
            "beginTimeTableRow": { "stationShortCode": "HKI", "scheduledTime": "2024-03-01T05:00:00.000Z" },
            "endTimeTableRow": { "stationShortCode": "TPE", "scheduledTime": "2024-03-01T06:30:00.000Z" },
            "locomotives": [{ "location": 1, "locomotiveType": "Sr2", "powerType": "Electric" }],
            "wagons": [{ "location": 1, "wagonType": "Edm", "salesNumber": 1, "length": 2740, "catering": true }],
            "totalLength": 190,
            "maximumSpeed": 200
        }]
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedMarker {
    pub id: MarkerId,
    pub kind: MarkerKind,
    pub at: LatLon,
    pub popup: Popup,
}

/// Surface that just remembers what it was told.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub markers: Vec<RecordedMarker>,
    pub opened: Vec<MarkerId>,
    pub flushes: usize,
    next_id: u64,
}

impl RecordingSurface {
    pub fn of_kind(&self, kind: MarkerKind) -> Vec<&RecordedMarker> {
        self.markers.iter().filter(|m| m.kind == kind).collect()
    }

    pub fn marker(&self, id: MarkerId) -> Option<&RecordedMarker> {
        self.markers.iter().find(|m| m.id == id)
    }
}

impl MapSurface for RecordingSurface {
    fn add_marker(&mut self, kind: MarkerKind, at: LatLon, popup: Popup) -> MarkerId {
        self.next_id += 1;
        let id = MarkerId(self.next_id);
        self.markers.push(RecordedMarker { id, kind, at, popup });
        id
    }

    fn bind_popup(&mut self, id: MarkerId, popup: Popup) {
        if let Some(marker) = self.markers.iter_mut().find(|m| m.id == id) {
            marker.popup = popup;
        }
    }

    fn open_popup(&mut self, id: MarkerId) {
        self.opened.push(id);
    }

    fn remove_markers(&mut self, kind: MarkerKind) {
        self.markers.retain(|m| m.kind != kind);
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}
