use std::fmt;
use std::str::FromStr;

pub const USGS_QUERY_ENDPOINT: &str = "https://earthquake.usgs.gov/fdsnws/event/1/query";
// The parser only understands GeoJSON.
const FEED_FORMAT: &str = "geojson";

/// Sort orders accepted by the USGS event service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderBy {
    #[default]
    Time,
    TimeAsc,
    Magnitude,
    MagnitudeAsc,
}

impl OrderBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::TimeAsc => "time-asc",
            Self::Magnitude => "magnitude",
            Self::MagnitudeAsc => "magnitude-asc",
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown sort order: {0}")]
pub struct UnknownOrderBy(String);

impl FromStr for OrderBy {
    type Err = UnknownOrderBy;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "time" => Ok(Self::Time),
            "time-asc" => Ok(Self::TimeAsc),
            "magnitude" => Ok(Self::Magnitude),
            "magnitude-asc" => Ok(Self::MagnitudeAsc),
            other => Err(UnknownOrderBy(other.to_string())),
        }
    }
}

/// Parameters of a USGS event query.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedQuery {
    pub order_by: OrderBy,
    pub min_magnitude: f64,
    pub limit: u32,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            order_by: OrderBy::Time,
            min_magnitude: 5.0,
            limit: 10,
        }
    }
}

impl FeedQuery {
    pub fn to_url(&self) -> String {
        format!(
            "{USGS_QUERY_ENDPOINT}?format={FEED_FORMAT}&orderby={}&minmag={}&limit={}",
            self.order_by, self.min_magnitude, self.limit
        )
    }
}
