//! Map presentation: marker surface capability and the presenter driving it.

mod geojson_surface;
mod popup;
mod presenter;

use std::fmt;

use serde::Serialize;

pub use self::geojson_surface::GeoJsonSurface;
pub use self::popup::{Popup, composition_popup, station_popup, train_popup};
pub use self::presenter::MapPresenter;
use crate::api::LatLon;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    Station,
    Train,
}

impl MarkerKind {
    /// simplestyle colour: blue stations, red trains.
    pub const fn color(self) -> &'static str {
        match self {
            Self::Station => "#1f6feb",
            Self::Train => "#d73a49",
        }
    }
}

/// What the presenter needs from a map renderer.
pub trait MapSurface {
    fn add_marker(&mut self, kind: MarkerKind, at: LatLon, popup: Popup) -> MarkerId;

    /// Replace the popup bound to `id`. Unknown ids are ignored.
    fn bind_popup(&mut self, id: MarkerId, popup: Popup);

    fn open_popup(&mut self, id: MarkerId);

    fn remove_markers(&mut self, kind: MarkerKind);

    /// Push pending changes to the renderer.
    fn flush(&mut self) -> anyhow::Result<()>;
}
