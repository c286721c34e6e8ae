//! Text-format input parsing for the CLI and test fixtures.
//!
//! Networks are line-oriented: a label, whitespace, a WKT `LINESTRING`.
//! Observations are CSV with `lon`, `lat` and `time` columns, RFC-3339
//! times. File handling stays at the caller; this module parses from
//! memory and only ever surfaces `BadArgument`.

use waymatch_common::{Error, Result};
use waymatch_geometry::{wkt, TopologyCalculator};
use waymatch_graph::NearLineMergeGraph;

use crate::observation::Observation;

/// Parse a network file body. Empty lines and `#` comments are skipped;
/// `bidirectional` also adds every edge's reverse twin.
pub fn parse_network<C: TopologyCalculator>(
    text: &str,
    calculator: C,
    snap_threshold: f64,
    bidirectional: bool,
) -> Result<NearLineMergeGraph<C>> {
    let mut graph = NearLineMergeGraph::new(calculator, snap_threshold)?;
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((label, geometry)) = line.split_once(char::is_whitespace) else {
            return Err(Error::bad_argument(format!(
                "network line {}: want 'label LINESTRING (...)'",
                number + 1
            )));
        };
        let polyline = wkt::parse_polyline(geometry.trim())
            .map_err(|e| Error::bad_argument(format!("network line {}: {e}", number + 1)))?;
        if bidirectional {
            graph.add_bidirectional_edge(label, polyline)?;
        } else {
            graph.add_approximate_direct_edge(label, polyline)?;
        }
    }
    Ok(graph)
}

/// Parse an observation CSV body with `lon`, `lat`, `time` columns (any
/// order, case-insensitive).
pub fn parse_observations_csv(text: &str) -> Result<Vec<Observation>> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| Error::bad_argument(format!("observation CSV headers: {e}")))?
        .clone();
    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::bad_argument(format!("observation CSV misses a '{name}' column")))
    };
    let (lon, lat, time) = (column("lon")?, column("lat")?, column("time")?);

    let mut trace = Vec::new();
    for (number, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| Error::bad_argument(format!("observation row {}: {e}", number + 1)))?;
        let ordinate = |i: usize| -> Result<f64> {
            record
                .get(i)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .ok_or_else(|| {
                    Error::bad_argument(format!("observation row {}: bad number", number + 1))
                })
        };
        let stamp = record
            .get(time)
            .ok_or_else(|| Error::bad_argument(format!("observation row {}: no time", number + 1)))?;
        trace.push(Observation::parse(ordinate(lon)?, ordinate(lat)?, stamp.trim())?);
    }
    Ok(trace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use waymatch_geometry::EuclideanCalculator;

    #[test]
    fn test_parse_network() {
        let text = "\
# reference fixture
E0 LINESTRING (0 0, 10 0)
E1 LINESTRING (10 0, 10 5, 6 9)
";
        let graph = parse_network(text, EuclideanCalculator::default(), 0.1, false).unwrap();
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.node_count(), 3);
        let bidir = parse_network(text, EuclideanCalculator::default(), 0.1, true).unwrap();
        assert_eq!(bidir.edge_count(), 4);
        assert!(bidir.edge_by_label("E1-rev").is_some());
    }

    #[test]
    fn test_parse_network_rejects_malformed_lines() {
        let err = parse_network(
            "just-a-label",
            EuclideanCalculator::default(),
            0.1,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, Error::BadArgument(_)));
        assert!(parse_network(
            "E0 POINT (1 2)",
            EuclideanCalculator::default(),
            0.1,
            false
        )
        .is_err());
    }

    #[test]
    fn test_parse_observations() {
        let text = "\
lat,lon,time
45.66,12.16,2024-03-01T08:00:00Z
45.66,12.17,2024-03-01T08:01:00Z
";
        let trace = parse_observations_csv(text).unwrap();
        assert_eq!(trace.len(), 2);
        // columns resolve by header name, not position
        assert_eq!(trace[0].point.x, 12.16);
        assert_eq!(trace[0].point.y, 45.66);
    }

    #[test]
    fn test_parse_observations_errors() {
        assert!(parse_observations_csv("lon,lat\n1,2").is_err());
        assert!(parse_observations_csv("lon,lat,time\nx,2,2024-01-01T00:00:00Z").is_err());
        assert!(parse_observations_csv("lon,lat,time\n1,2,not-a-time").is_err());
    }
}
