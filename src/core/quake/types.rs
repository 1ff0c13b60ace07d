use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;
use std::fmt::Display;

/// Magnitudes must lie strictly inside this range to be accepted.
pub const RICHTER_SCALE_MIN: f64 = 0.0;
pub const RICHTER_SCALE_MAX: f64 = 12.0;

const OFFSET_SEPARATOR: &str = " of ";
const NEAR_PREFIX: &str = "Near the ";
const TIME_FORMAT: &str = "%-I:%M %p";
const DATE_FORMAT: &str = "%b %d, %Y";

/// One earthquake from the feed. Fields are fixed once constructed.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EarthquakeEvent {
    location: String,
    location_offset: Option<String>,
    magnitude: f64,
    occurred_at_millis: i64,
    detail_url: String,
}

impl EarthquakeEvent {
    /// Builds an event from the feed's raw `place` text.
    ///
    /// `place` is split on the first `" of "`: the head (with the separator
    /// re-attached) becomes the offset and the tail the location. Without a
    /// separator the location is prefixed with `"Near the "`. A magnitude
    /// outside `(0, 12)` is dropped and the default `0.0` kept.
    pub fn new(
        place: &str,
        magnitude: Option<f64>,
        occurred_at_millis: i64,
        detail_url: impl Into<String>,
    ) -> Self {
        let (location_offset, location) = split_place(place);
        Self {
            location,
            location_offset,
            magnitude: validated_magnitude(magnitude),
            occurred_at_millis,
            detail_url: detail_url.into(),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Distance/direction prefix such as `"15km NW of "`.
    pub fn location_offset(&self) -> Option<&str> {
        self.location_offset.as_deref()
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn occurred_at_millis(&self) -> i64 {
        self.occurred_at_millis
    }

    pub fn detail_url(&self) -> &str {
        &self.detail_url
    }

    pub fn magnitude_string(&self) -> String {
        format!("{:.1}", self.magnitude)
    }

    /// Time of day, e.g. `3:07 PM`.
    pub fn time_string_in<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        self.format_in(tz, TIME_FORMAT)
    }

    /// Calendar date, e.g. `Jan 15, 2010`.
    pub fn date_string_in<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        self.format_in(tz, DATE_FORMAT)
    }

    pub fn time_string(&self) -> String {
        self.time_string_in(&Local)
    }

    pub fn date_string(&self) -> String {
        self.date_string_in(&Local)
    }

    fn format_in<Tz>(&self, tz: &Tz, pattern: &str) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        DateTime::from_timestamp_millis(self.occurred_at_millis)
            .map(|utc| utc.with_timezone(tz).format(pattern).to_string())
            .unwrap_or_default()
    }
}

fn validated_magnitude(candidate: Option<f64>) -> f64 {
    match candidate {
        Some(value) if value > RICHTER_SCALE_MIN && value < RICHTER_SCALE_MAX => value,
        Some(value) => {
            tracing::debug!(magnitude = value, "magnitude out of range, keeping default");
            0.0
        }
        None => {
            tracing::debug!("magnitude missing, keeping default");
            0.0
        }
    }
}

fn split_place(place: &str) -> (Option<String>, String) {
    match place.split_once(OFFSET_SEPARATOR) {
        Some((offset, location)) if !location.trim().is_empty() => (
            Some(format!("{offset}{OFFSET_SEPARATOR}")),
            location.to_string(),
        ),
        _ => (None, format!("{NEAR_PREFIX}{place}")),
    }
}
