use std::collections::HashMap;
use std::sync::Arc;

use super::{MapSurface, MarkerId, MarkerKind, composition_popup, station_popup, train_popup};
use crate::api::{Api, Station, StationNameLookup, TrainComposition, TrainPosition, Transport};
use crate::error::Result;
use crate::state::{InspectionState, InspectionTicket, StateView, ViewState};

/// Renders stations and trains onto a [`MapSurface`] and reacts to marker
/// clicks and popup closes.
///
/// The presenter owns the inspection state. Clicking a train marker pauses
/// the periodic refresh until its popup is closed.
pub struct MapPresenter<S> {
    surface: S,
    state: InspectionState,
    lookup: Option<Arc<StationNameLookup>>,
    /// Train markers currently on the map, i.e. the ones with click handlers.
    trains: HashMap<MarkerId, TrainPosition>,
}

impl<S: MapSurface> MapPresenter<S> {
    pub fn new(surface: S) -> Self {
        Self { surface, state: InspectionState::new(), lookup: None, trains: HashMap::new() }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn view(&self) -> StateView {
        self.state.subscribe()
    }

    pub fn state(&self) -> ViewState {
        self.state.get()
    }

    pub fn is_inspecting(&self) -> bool {
        self.state.is_inspecting()
    }

    pub fn station_lookup(&self) -> Option<Arc<StationNameLookup>> {
        self.lookup.clone()
    }

    /// Marker currently showing `train_number`, if it is on the map.
    pub fn find_train(&self, train_number: u32) -> Option<MarkerId> {
        self.trains.iter().find(|(_, t)| t.train_number == train_number).map(|(id, _)| *id)
    }

    /// Trains on the map, ordered by train number.
    pub fn trains(&self) -> Vec<&TrainPosition> {
        let mut trains: Vec<_> = self.trains.values().collect();
        trains.sort_by_key(|t| t.train_number);
        trains
    }

    /// Fetch all stations once and place a marker for each one with
    /// coordinates. The station list also seeds the name lookup used by train
    /// popups. Errors are logged and leave the map untouched.
    pub async fn render_station_markers<T: Transport>(&mut self, api: &Api<T>) -> usize {
        match api.fetch_stations().await {
            Ok(stations) => {
                self.lookup = Some(Arc::new(StationNameLookup::from_stations(&stations)));
                self.place_stations(&stations)
            }
            Err(e) => {
                log::error!("Error adding station markers: {e}");
                0
            }
        }
    }

    pub fn place_stations(&mut self, stations: &[Station]) -> usize {
        let mut placed = 0;
        for station in stations {
            let Some(location) = station.location() else {
                log::warn!("Station {} has no latitude or longitude", station.short_code);
                continue;
            };
            self.surface.add_marker(MarkerKind::Station, location, station_popup(station));
            placed += 1;
        }
        log::info!("Added {placed} station markers");
        self.flush();
        placed
    }

    /// Fetch the latest train positions and redraw every train marker.
    pub async fn render_train_markers<T: Transport>(&mut self, api: &Api<T>) -> Result<usize> {
        self.ensure_lookup(api).await?;
        let trains = api.fetch_running_trains().await;
        Ok(self.redraw_trains(trains))
    }

    async fn ensure_lookup<T: Transport>(&mut self, api: &Api<T>) -> Result<Arc<StationNameLookup>> {
        if let Some(lookup) = &self.lookup {
            return Ok(Arc::clone(lookup));
        }
        let lookup = Arc::new(api.fetch_station_name_lookup().await?);
        self.lookup = Some(Arc::clone(&lookup));
        Ok(lookup)
    }

    /// Clear all train markers and place one per train.
    pub fn redraw_trains(&mut self, trains: Vec<TrainPosition>) -> usize {
        self.surface.remove_markers(MarkerKind::Train);
        self.trains.clear();

        if trains.is_empty() {
            log::warn!("No train data available");
        }

        for train in trains {
            let id = self.surface.add_marker(MarkerKind::Train, train.location, train_popup(&train));
            self.trains.insert(id, train);
        }

        log::debug!("Drew {} train markers", self.trains.len());
        self.flush();
        self.trains.len()
    }

    /// Click handler for a train marker. Pauses refresh immediately and
    /// returns the ticket for the composition fetch the caller should start.
    pub fn click(&mut self, id: MarkerId) -> Option<InspectionTicket> {
        let Some(train) = self.trains.get(&id) else {
            log::warn!("Click on unknown train marker {id}");
            return None;
        };
        log::info!("Train marker clicked: {}, {}", train.train_number, train.departure_date);

        let ticket = self.state.begin(id, train.train_number, train.departure_date);
        self.surface.open_popup(id);
        self.flush();
        Some(ticket)
    }

    /// Popup close handler. Re-enables the periodic refresh.
    pub fn close(&mut self) {
        if let ViewState::Inspecting { marker, train_number, .. } = self.state.get() {
            log::info!("Closed popup {marker} of train {train_number}");
        }
        self.state.end();
    }

    /// Show a fetched composition in the inspected marker's popup. Results
    /// for superseded tickets are dropped.
    pub fn apply_composition(
        &mut self, ticket: InspectionTicket, result: Result<Option<TrainComposition>>,
    ) -> bool {
        if !self.state.is_current(&ticket) {
            log::debug!(
                "Discarding composition of train {} (generation {} is stale)",
                ticket.train_number,
                ticket.generation
            );
            return false;
        }

        match result {
            Ok(Some(composition)) => {
                self.surface.bind_popup(ticket.marker, composition_popup(&composition));
                self.surface.open_popup(ticket.marker);
                self.flush();
                true
            }
            Ok(None) => {
                log::warn!("No composition data available for train {}", ticket.train_number);
                false
            }
            Err(e) => {
                log::warn!("Error fetching composition of train {}: {e}", ticket.train_number);
                false
            }
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.surface.flush() {
            log::error!("Failed to update map: {e:#}");
        }
    }
}
