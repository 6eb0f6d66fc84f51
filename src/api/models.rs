use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

// --- Records handed to the presentation layer ---

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build from a GeoJSON position, which is ordered `[lon, lat]`.
    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [lon, lat, ..] => Some(Self::new(*lat, *lon)),
            _ => None,
        }
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lon)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainPosition {
    pub train_number: u32,
    pub departure_date: NaiveDate,
    pub timestamp: DateTime<Utc>,
    pub speed: f64,
    pub accuracy: Option<f64>,
    pub location: LatLon,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Station {
    #[serde(rename = "stationShortCode")]
    pub short_code: String,
    #[serde(rename = "stationName")]
    pub name: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Station {
    pub fn location(&self) -> Option<LatLon> {
        Some(LatLon::new(self.latitude?, self.longitude?))
    }
}

/// Station short code to human readable name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationNameLookup(HashMap<String, String>);

impl StationNameLookup {
    pub fn from_stations(stations: &[Station]) -> Self {
        Self(stations.iter().map(|s| (s.short_code.clone(), s.name.clone())).collect())
    }

    pub fn get(&self, short_code: &str) -> Option<&str> {
        self.0.get(short_code).map(String::as_str)
    }

    /// Name for `short_code`, or the code itself when the station is unknown.
    pub fn name_or_code<'a>(&'a self, short_code: &'a str) -> &'a str {
        self.get(short_code).unwrap_or(short_code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Journey {
    pub start_station: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_station: String,
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Locomotive {
    pub location: Option<u32>,
    pub kind: Option<String>,
    pub power_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wagon {
    pub location: Option<u32>,
    pub kind: Option<String>,
    pub sales_number: Option<u32>,
    pub length: Option<u32>,
    pub pet_friendly: bool,
    pub catering: bool,
    pub disabled_access: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainComposition {
    pub train_number: u32,
    pub departure_date: NaiveDate,
    pub train_type: String,
    pub train_category: String,
    pub journey: Journey,
    pub locomotives: Vec<Locomotive>,
    pub wagons: Vec<Wagon>,
    pub total_length: Option<u32>,
    pub maximum_speed: Option<u32>,
}

// --- Wire format ---

/// Treat an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TrainLocationProperties {
    pub train_number: u32,
    pub departure_date: NaiveDate,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub accuracy: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompositionResponse {
    #[serde(default)]
    pub train_number: Option<u32>,
    #[serde(default)]
    pub departure_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub train_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub train_category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub journey_sections: Vec<JourneySection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JourneySection {
    pub begin_time_table_row: TimeTableRow,
    pub end_time_table_row: TimeTableRow,
    #[serde(default, deserialize_with = "null_as_default")]
    pub locomotives: Vec<LocomotiveRecord>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub wagons: Vec<WagonRecord>,
    #[serde(default)]
    pub total_length: Option<u32>,
    #[serde(default)]
    pub maximum_speed: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TimeTableRow {
    pub station_short_code: String,
    #[serde(default)]
    pub scheduled_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LocomotiveRecord {
    #[serde(default)]
    pub location: Option<u32>,
    #[serde(default)]
    pub locomotive_type: Option<String>,
    #[serde(default)]
    pub power_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WagonRecord {
    #[serde(default)]
    pub location: Option<u32>,
    #[serde(default)]
    pub wagon_type: Option<String>,
    #[serde(default)]
    pub sales_number: Option<u32>,
    #[serde(default)]
    pub length: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pet: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub catering: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disabled: bool,
}

impl CompositionResponse {
    /// Flatten the first journey section. `None` when the train has no
    /// sections. Number and date fall back to the requested ones when absent.
    pub fn into_composition(
        self, train_number: u32, departure_date: NaiveDate, lookup: &StationNameLookup,
    ) -> Option<TrainComposition> {
        let journey = self.journey_sections.into_iter().next()?;

        let begin = &journey.begin_time_table_row;
        let end = &journey.end_time_table_row;

        Some(TrainComposition {
            train_number: self.train_number.unwrap_or(train_number),
            departure_date: self.departure_date.unwrap_or(departure_date),
            train_type: self.train_type,
            train_category: self.train_category,
            journey: Journey {
                start_station: lookup.name_or_code(&begin.station_short_code).to_string(),
                start_time: begin.scheduled_time,
                end_station: lookup.name_or_code(&end.station_short_code).to_string(),
                end_time: end.scheduled_time,
            },
            locomotives: journey
                .locomotives
                .into_iter()
                .map(|loco| Locomotive {
                    location: loco.location,
                    kind: loco.locomotive_type,
                    power_type: loco.power_type,
                })
                .collect(),
            wagons: journey
                .wagons
                .into_iter()
                .map(|wagon| Wagon {
                    location: wagon.location,
                    kind: wagon.wagon_type,
                    sales_number: wagon.sales_number,
                    length: wagon.length,
                    pet_friendly: wagon.pet,
                    catering: wagon.catering,
                    disabled_access: wagon.disabled,
                })
                .collect(),
            total_length: journey.total_length,
            maximum_speed: journey.maximum_speed,
        })
    }
}
