use std::fmt;

use chrono::{DateTime, Utc};

use crate::api::{Station, TrainComposition, TrainPosition, Wagon};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Popup {
    pub title: String,
    pub rows: Vec<(String, String)>,
}

impl Popup {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), rows: Vec::new() }
    }

    #[must_use]
    pub fn row(mut self, label: impl Into<String>, value: impl fmt::Display) -> Self {
        self.rows.push((label.into(), value.to_string()));
        self
    }

    pub fn value(&self, label: &str) -> Option<&str> {
        self.rows.iter().find(|(l, _)| l == label).map(|(_, v)| v.as_str())
    }

    /// `<b>Label:</b> value<br>` markup for web map popups.
    pub fn to_html(&self) -> String {
        let mut html = format!("<h4>{}</h4>", escape(&self.title));
        for (label, value) in &self.rows {
            html.push_str(&format!("<b>{}:</b> {}<br>", escape(label), escape(value)));
        }
        html
    }
}

impl fmt::Display for Popup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        for (label, value) in &self.rows {
            write!(f, "\n  {label}: {value}")?;
        }
        Ok(())
    }
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M UTC").to_string())
}

fn or_dash<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

pub fn station_popup(station: &Station) -> Popup {
    Popup::new(station.name.as_str())
        .row("Station Name", &station.name)
        .row("Station Code", &station.short_code)
}

pub fn train_popup(train: &TrainPosition) -> Popup {
    Popup::new(format!("Train {}", train.train_number))
        .row("Train Number", train.train_number)
        .row("Speed", format!("{} km/h", train.speed))
        .row("Timestamp", train.timestamp.to_rfc3339())
}

fn wagon_line(wagon: &Wagon) -> String {
    let mut line = format!(
        "{} sales #{}, length {}",
        wagon.kind.as_deref().unwrap_or("?"),
        or_dash(wagon.sales_number),
        or_dash(wagon.length)
    );
    let features: Vec<&str> = [
        (wagon.pet_friendly, "pets"),
        (wagon.catering, "catering"),
        (wagon.disabled_access, "accessible"),
    ]
    .into_iter()
    .filter_map(|(on, name)| on.then_some(name))
    .collect();
    if !features.is_empty() {
        line.push_str(&format!(" ({})", features.join(", ")));
    }
    line
}

/// Detailed popup shown once the composition of an inspected train arrives.
pub fn composition_popup(composition: &TrainComposition) -> Popup {
    let journey = &composition.journey;
    let mut popup = Popup::new(format!("{} {}", composition.train_type, composition.train_number).trim().to_string())
        .row("Train Number", composition.train_number)
        .row("Departure Date", composition.departure_date)
        .row("Type", &composition.train_type)
        .row("Category", &composition.train_category)
        .row("Start Station", format!("{} ({})", journey.start_station, format_time(journey.start_time)))
        .row("End Station", format!("{} ({})", journey.end_station, format_time(journey.end_time)));

    for loco in &composition.locomotives {
        popup = popup.row(
            format!("Locomotive {}", or_dash(loco.location)),
            format!("{} ({})", loco.kind.as_deref().unwrap_or("?"), loco.power_type.as_deref().unwrap_or("?")),
        );
    }

    popup = popup.row("Wagons", composition.wagons.len());
    for wagon in &composition.wagons {
        popup = popup.row(format!("Wagon {}", or_dash(wagon.location)), wagon_line(wagon));
    }

    popup
        .row("Maximum Speed", format!("{} km/h", or_dash(composition.maximum_speed)))
        .row("Total Length", format!("{} m", or_dash(composition.total_length)))
}
