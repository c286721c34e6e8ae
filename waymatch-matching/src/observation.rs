//! Timestamped geographic fixes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use waymatch_common::{Error, Result};
use waymatch_geometry::Point;

/// One GPS fix: longitude/latitude and an RFC-3339 instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub point: Point,
    pub time: DateTime<Utc>,
}

impl Observation {
    pub fn new(longitude: f64, latitude: f64, time: DateTime<Utc>) -> Self {
        Self {
            point: Point::new(longitude, latitude),
            time,
        }
    }

    /// Parse the timestamp from its RFC-3339 form.
    pub fn parse(longitude: f64, latitude: f64, time: &str) -> Result<Self> {
        let time = DateTime::parse_from_rfc3339(time)
            .map_err(|e| Error::bad_argument(format!("bad timestamp '{time}': {e}")))?
            .with_timezone(&Utc);
        Ok(Self::new(longitude, latitude, time))
    }
}

/// Preconditions of every match call: at least one observation, timestamps
/// non-decreasing (equal instants are permitted), finite coordinates.
pub fn validate_observations(observations: &[Observation]) -> Result<()> {
    if observations.is_empty() {
        return Err(Error::NoObservations);
    }
    for o in observations {
        if !o.point.x.is_finite() || !o.point.y.is_finite() {
            return Err(Error::bad_argument(format!(
                "non-finite observation at {}",
                o.time.to_rfc3339()
            )));
        }
    }
    for pair in observations.windows(2) {
        if pair[1].time < pair[0].time {
            return Err(Error::bad_argument(format!(
                "timestamps must be non-decreasing: {} follows {}",
                pair[1].time.to_rfc3339(),
                pair[0].time.to_rfc3339()
            )));
        }
    }
    Ok(())
}

/// Pre-filter hook for observation smoothing. A Kalman smoother is the
/// intended implementor; the matcher itself only ever sees the output.
pub trait ObservationFilter {
    fn filter(&self, observations: Vec<Observation>) -> Vec<Observation>;
}

/// The default filter: observations pass through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityFilter;

impl ObservationFilter for IdentityFilter {
    fn filter(&self, observations: Vec<Observation>) -> Vec<Observation> {
        observations
    }
}
