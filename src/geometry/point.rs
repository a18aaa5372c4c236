//! Two dimensional points over integer or real coordinates

use num_traits::AsPrimitive;
use std::fmt;

/// A 2D coordinate
///
/// Sites and pixels use unsigned integers, placement offsets use signed
/// integers (rotation can push them past the image origin) and anchors use
/// reals because merged fragments sit at the midpoint of two sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point<T> {
    /// Horizontal coordinate, growing rightwards
    pub x: T,
    /// Vertical coordinate, growing downwards
    pub y: T,
}

impl<T> Point<T> {
    /// Create a point
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T: AsPrimitive<f64>> Point<T> {
    /// Convert both coordinates to `f64`
    pub fn to_f64(self) -> Point<f64> {
        Point::new(self.x.as_(), self.y.as_())
    }

    /// Euclidean distance to another point
    pub fn distance(self, other: Self) -> f64 {
        let dx = other.x.as_() - self.x.as_();
        let dy = other.y.as_() - self.y.as_();
        dx.hypot(dy)
    }
}

impl<T: Ord> Point<T> {
    /// Componentwise minimum
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }

    /// Componentwise maximum
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }
}

impl Point<f64> {
    /// Point halfway between two points
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl<T: fmt::Display> fmt::Display for Point<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
