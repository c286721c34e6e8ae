//! Min/max axis-aligned bounding box.
//!
//! Distinct from [`Region`](crate::Region), which stores origin + size: the
//! Hilbert-packed tree wants four flat doubles per node, and min/max is the
//! layout it packs.

use serde::{Deserialize, Serialize};

use crate::point::Point;

/// Axis-aligned rectangle stored as per-axis min/max. The null envelope is
/// the expansion identity: `min = +inf`, `max = -inf` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Envelope {
    /// The null envelope; expanding it by anything yields that thing's bounds.
    pub const NULL: Envelope = Envelope {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };

    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn from_point(p: &Point) -> Self {
        Self::new(p.x, p.y, p.x, p.y)
    }

    pub fn from_points<'a, I: IntoIterator<Item = &'a Point>>(points: I) -> Self {
        let mut env = Self::NULL;
        for p in points {
            env.expand_to_include(p.x, p.y);
        }
        env
    }

    pub fn is_null(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn expand_to_include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn expand_to_include_envelope(&mut self, other: &Envelope) {
        if other.is_null() {
            return;
        }
        self.expand_to_include(other.min_x, other.min_y);
        self.expand_to_include(other.max_x, other.max_y);
    }

    pub fn intersects(&self, other: &Envelope) -> bool {
        !(self.is_null() || other.is_null())
            && self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        !self.is_null()
            && p.x >= self.min_x
            && p.x <= self.max_x
            && p.y >= self.min_y
            && p.y <= self.max_y
    }

    pub fn width(&self) -> f64 {
        if self.is_null() {
            0.0
        } else {
            self.max_x - self.min_x
        }
    }

    pub fn height(&self) -> f64 {
        if self.is_null() {
            0.0
        } else {
            self.max_y - self.min_y
        }
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::NULL
    }
}
