use serde::de::{DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use std::fmt;

use super::types::EarthquakeEvent;

#[derive(Debug, thiserror::Error)]
pub enum FeedParseError {
    #[error("feed payload is empty")]
    EmptyPayload,
    #[error("feed document has no \"features\" array")]
    MissingFeatures,
    #[error("json feed parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything recovered from one feed document.
///
/// `error` is set when parsing stopped before the end of the document; the
/// events read up to that point are still in `events`.
#[derive(Debug, Default)]
pub struct ParsedFeed {
    pub events: Vec<EarthquakeEvent>,
    pub skipped: usize,
    pub error: Option<FeedParseError>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    properties: RawProperties,
}

#[derive(Debug, Deserialize)]
struct RawProperties {
    mag: Option<f64>,
    place: String,
    time: i64,
    url: String,
}

#[derive(Debug, Default)]
struct Accumulator {
    events: Vec<EarthquakeEvent>,
    skipped: usize,
    saw_features: bool,
}

/// Parses a feed and returns the events it could read, logging any problem.
pub fn parse(raw: &str) -> Vec<EarthquakeEvent> {
    let parsed = parse_feed(raw);
    match &parsed.error {
        Some(FeedParseError::EmptyPayload) => {
            tracing::debug!("earthquake feed is empty");
        }
        Some(error) => {
            tracing::error!(
                %error,
                recovered = parsed.events.len(),
                "problem parsing the earthquake feed"
            );
        }
        None => {}
    }
    parsed.events
}

/// Streams a GeoJSON feature collection into earthquake events.
///
/// Malformed features are skipped and counted. A malformed document stops
/// the parse but keeps the events already read.
pub fn parse_feed(raw: &str) -> ParsedFeed {
    if raw.trim().is_empty() {
        return ParsedFeed {
            error: Some(FeedParseError::EmptyPayload),
            ..ParsedFeed::default()
        };
    }

    let mut accumulator = Accumulator::default();
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let result = DocumentSeed(&mut accumulator)
        .deserialize(&mut deserializer)
        .and_then(|()| deserializer.end());

    let error = match result {
        Err(error) => Some(FeedParseError::Json(error)),
        Ok(()) if !accumulator.saw_features => Some(FeedParseError::MissingFeatures),
        Ok(()) => None,
    };

    ParsedFeed {
        events: accumulator.events,
        skipped: accumulator.skipped,
        error,
    }
}

struct DocumentSeed<'a>(&'a mut Accumulator);

impl<'de> DeserializeSeed<'de> for DocumentSeed<'_> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for DocumentSeed<'_> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a GeoJSON feature collection")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let accumulator = self.0;
        while let Some(key) = map.next_key::<String>()? {
            if key == "features" {
                map.next_value_seed(FeaturesSeed(&mut *accumulator))?;
                accumulator.saw_features = true;
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(())
    }
}

struct FeaturesSeed<'a>(&'a mut Accumulator);

impl<'de> DeserializeSeed<'de> for FeaturesSeed<'_> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for FeaturesSeed<'_> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an array of features")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let accumulator = self.0;
        let mut index = 0_usize;
        // Each element is buffered first so a bad feature cannot poison the stream.
        while let Some(value) = seq.next_element::<serde_json::Value>()? {
            match serde_json::from_value::<RawFeature>(value) {
                Ok(feature) => accumulator.events.push(event_from_feature(feature)),
                Err(error) => {
                    tracing::warn!(index, %error, "skipping malformed earthquake feature");
                    accumulator.skipped += 1;
                }
            }
            index += 1;
        }
        Ok(())
    }
}

fn event_from_feature(feature: RawFeature) -> EarthquakeEvent {
    let properties = feature.properties;
    EarthquakeEvent::new(
        &properties.place,
        properties.mag,
        properties.time,
        properties.url,
    )
}
