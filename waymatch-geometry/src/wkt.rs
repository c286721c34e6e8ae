//! Minimal WKT surface: `POINT` parsing and `LINESTRING` parsing.
//!
//! Printing is the `Display` impl on [`Polyline`]; this module is the read
//! side used by the CLI and the test fixtures. Whitespace-tolerant, decimal
//! dot only.

use waymatch_common::{Error, Result};

use crate::point::Point;
use crate::polyline::Polyline;

/// Parse `POINT (x y)`.
pub fn parse_point(text: &str) -> Result<Point> {
    let body = keyword_body(text, "POINT")?;
    let ordinates = parse_ordinates(body)?;
    match ordinates.as_slice() {
        [x, y] => Ok(Point::new(*x, *y)),
        other => Err(Error::bad_argument(format!(
            "POINT wants 2 ordinates, got {}",
            other.len()
        ))),
    }
}

/// Parse `LINESTRING (x1 y1, x2 y2, …)` or `LINESTRING EMPTY`.
pub fn parse_polyline(text: &str) -> Result<Polyline> {
    let trimmed = text.trim();
    if trimmed
        .to_ascii_uppercase()
        .starts_with("LINESTRING EMPTY")
    {
        return Ok(Polyline::empty());
    }
    let body = keyword_body(text, "LINESTRING")?;
    let mut points = Vec::new();
    for pair in body.split(',') {
        let ordinates = parse_ordinates(pair)?;
        match ordinates.as_slice() {
            [x, y] => points.push(Point::new(*x, *y)),
            other => {
                return Err(Error::bad_argument(format!(
                    "LINESTRING vertex wants 2 ordinates, got {}",
                    other.len()
                )))
            }
        }
    }
    Ok(Polyline::new(points))
}

/// Strip `KEYWORD ( … )` and return the parenthesised body.
fn keyword_body<'a>(text: &'a str, keyword: &str) -> Result<&'a str> {
    let trimmed = text.trim();
    let upper = trimmed.to_ascii_uppercase();
    if !upper.starts_with(keyword) {
        return Err(Error::bad_argument(format!(
            "expected {keyword}, got {trimmed:.32}"
        )));
    }
    let rest = trimmed[keyword.len()..].trim_start();
    let Some(inner) = rest
        .strip_prefix('(')
        .and_then(|r| r.trim_end().strip_suffix(')'))
    else {
        return Err(Error::bad_argument(format!(
            "malformed {keyword} body: {rest:.32}"
        )));
    };
    Ok(inner)
}

fn parse_ordinates(text: &str) -> Result<Vec<f64>> {
    text.split_whitespace()
        .map(|tok| {
            tok.parse::<f64>()
                .map_err(|_| Error::bad_argument(format!("bad ordinate: {tok}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_point() {
        assert_eq!(
            parse_point("POINT (12.5 45.25)").unwrap(),
            Point::new(12.5, 45.25)
        );
        // whitespace-tolerant, case-insensitive keyword
        assert_eq!(
            parse_point("  point(  -1.5   2.0 ) ").unwrap(),
            Point::new(-1.5, 2.0)
        );
    }

    #[test]
    fn test_parse_point_rejects_garbage() {
        assert!(parse_point("POINT (1.0)").is_err());
        assert!(parse_point("POINT (1,0 2.0)").is_err());
        assert!(parse_point("LINESTRING (1 2)").is_err());
        assert!(parse_point("POINT 1 2").is_err());
    }

    #[test]
    fn test_parse_polyline_round_trip() {
        let text = "LINESTRING (12.5 45, 12.6 45.1, 12.7 45.05)";
        let line = parse_polyline(text).unwrap();
        assert_eq!(line.len(), 3);
        assert_eq!(line.to_string(), text);
    }

    #[test]
    fn test_parse_empty_linestring() {
        assert!(parse_polyline("LINESTRING EMPTY").unwrap().is_empty());
    }
}
