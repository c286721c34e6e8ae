//! Geometry factory.
//!
//! Binds a topology calculator to the value types it mints. There is no
//! global factory; callers construct one and pass it explicitly.

use crate::point::Point;
use crate::polyline::Polyline;
use crate::topology::TopologyCalculator;

#[derive(Debug, Clone)]
pub struct GeometryFactory<C> {
    calculator: C,
}

impl<C: TopologyCalculator> GeometryFactory<C> {
    pub fn new(calculator: C) -> Self {
        Self { calculator }
    }

    pub fn calculator(&self) -> &C {
        &self.calculator
    }

    pub fn point(&self, x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    pub fn polyline(&self, points: Vec<Point>) -> Polyline {
        Polyline::new(points)
    }

    pub fn distance(&self, p: &Point, q: &Point) -> f64 {
        self.calculator.distance(p, q)
    }

    pub fn polyline_length(&self, polyline: &Polyline) -> f64 {
        polyline.length(&self.calculator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::EuclideanCalculator;

    #[test]
    fn test_factory_mints_bound_values() {
        let factory = GeometryFactory::new(EuclideanCalculator::default());
        let a = factory.point(0.0, 0.0);
        let b = factory.point(3.0, 4.0);
        assert_eq!(factory.distance(&a, &b), 5.0);
        let line = factory.polyline(vec![a, a, b]);
        assert_eq!(line.len(), 2);
        assert_eq!(factory.polyline_length(&line), 5.0);
    }
}
