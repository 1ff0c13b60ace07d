use chrono::TimeZone;
use std::fmt::Display;

use crate::core::quake::types::EarthquakeEvent;

const EMPTY_LIST_LINE: &str = "No earthquakes found.";

/// Display strings for one list row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuakeRow {
    pub magnitude: String,
    pub location_offset: String,
    pub location: String,
    pub date: String,
    pub time: String,
}

impl QuakeRow {
    fn from_event<Tz>(event: &EarthquakeEvent, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        Self {
            magnitude: event.magnitude_string(),
            location_offset: event.location_offset().unwrap_or_default().to_string(),
            location: event.location().to_string(),
            date: event.date_string_in(tz),
            time: event.time_string_in(tz),
        }
    }
}

/// The list shown on screen. Only [`QuakeList::replace`] changes it.
#[derive(Debug, Clone, Default)]
pub struct QuakeList {
    events: Vec<EarthquakeEvent>,
}

impl QuakeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the current contents and takes `events` in their given order.
    pub fn replace(&mut self, events: Vec<EarthquakeEvent>) {
        self.events = events;
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&EarthquakeEvent> {
        self.events.get(index)
    }

    pub fn detail_url(&self, index: usize) -> Option<&str> {
        self.get(index).map(EarthquakeEvent::detail_url)
    }

    pub fn events(&self) -> &[EarthquakeEvent] {
        &self.events
    }

    pub fn rows<Tz>(&self, tz: &Tz) -> Vec<QuakeRow>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        self.events
            .iter()
            .map(|event| QuakeRow::from_event(event, tz))
            .collect()
    }

    /// Text lines for a terminal, numbered from 1.
    pub fn render<Tz>(&self, tz: &Tz) -> Vec<String>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        if self.is_empty() {
            return vec![EMPTY_LIST_LINE.to_string()];
        }

        let rows = self.rows(tz);
        let number_width = rows.len().to_string().len();
        let offset_width = column_width(&rows, |row| &row.location_offset);
        let location_width = column_width(&rows, |row| &row.location);
        let date_width = column_width(&rows, |row| &row.date);

        rows.iter()
            .enumerate()
            .map(|(index, row)| {
                let line = format!(
                    "{number:>number_width$}  {magnitude:>4}  {offset:<offset_width$}{location:<location_width$}  {date:<date_width$}  {time}",
                    number = index + 1,
                    magnitude = row.magnitude,
                    offset = row.location_offset,
                    location = row.location,
                    date = row.date,
                    time = row.time,
                );
                line.trim_end().to_string()
            })
            .collect()
    }
}

fn column_width(rows: &[QuakeRow], field: impl Fn(&QuakeRow) -> &String) -> usize {
    rows.iter()
        .map(|row| field(row).chars().count())
        .max()
        .unwrap_or(0)
}
