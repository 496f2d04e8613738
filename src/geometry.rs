//! Fundamental geometric types for truss modelling.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Absolute tolerance in millimetres under which two points are the same joint.
pub const COINCIDENCE_TOLERANCE: f64 = 1.0e-6;

/// Position in three dimensional space measured in millimetres.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Distance along the global X axis.
    pub x: f64,
    /// Distance along the global Y axis.
    pub y: f64,
    /// Distance along the global Z axis.
    pub z: f64,
}

impl Point {
    /// Create a [`Point`] with explicit coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Convert the point into an algebraic vector.
    #[must_use]
    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (other.to_vector() - self.to_vector()).norm()
    }

    /// Whether `other` describes the same location within [`COINCIDENCE_TOLERANCE`].
    ///
    /// # Examples
    /// ```
    /// use trussreuse::point;
    ///
    /// assert!(point(1.0, 0.0, 0.0).coincides(point(1.0 + 1.0e-9, 0.0, 0.0)));
    /// assert!(!point(1.0, 0.0, 0.0).coincides(point(1.1, 0.0, 0.0)));
    /// ```
    #[must_use]
    pub fn coincides(self, other: Point) -> bool {
        (self.x - other.x).abs() <= COINCIDENCE_TOLERANCE
            && (self.y - other.y).abs() <= COINCIDENCE_TOLERANCE
            && (self.z - other.z).abs() <= COINCIDENCE_TOLERANCE
    }

    /// Translate the point by a displacement.
    #[must_use]
    pub fn displaced(self, by: Displacement) -> Point {
        Point::from(self.to_vector() + by.to_vector())
    }
}

impl From<Vector3<f64>> for Point {
    fn from(value: Vector3<f64>) -> Self {
        Self::new(value.x, value.y, value.z)
    }
}

impl From<Point> for Vector3<f64> {
    fn from(value: Point) -> Self {
        value.to_vector()
    }
}

/// Translation vector describing joint displacement in millimetres.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Displacement {
    /// Displacement component along the global X axis.
    pub x: f64,
    /// Displacement component along the global Y axis.
    pub y: f64,
    /// Displacement component along the global Z axis.
    pub z: f64,
}

impl Displacement {
    /// Create a [`Displacement`] with explicit components.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Convert the displacement into an algebraic vector.
    #[must_use]
    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

impl From<Vector3<f64>> for Displacement {
    fn from(value: Vector3<f64>) -> Self {
        Self::new(value.x, value.y, value.z)
    }
}

/// Convenience helper for creating [`Point`] instances.
///
/// # Examples
/// ```
/// use trussreuse::point;
///
/// let origin = point(0.0, 0.0, 0.0);
/// assert_eq!(origin.x, 0.0);
/// ```
#[must_use]
pub const fn point(x: f64, y: f64, z: f64) -> Point {
    Point::new(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_to_vector_roundtrip() {
        let origin = Point::new(1.0, 2.0, 3.0);
        let vector: Vector3<f64> = origin.into();
        assert_eq!(vector, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(Point::from(vector), origin);
    }

    #[test]
    fn displaced_point_adds_components() {
        let moved = point(1_000.0, 0.0, 0.0).displaced(Displacement::new(0.5, 0.0, -0.25));
        assert_eq!(moved, point(1_000.5, 0.0, -0.25));
    }

    #[test]
    fn distance_is_symmetric() {
        let a = point(0.0, 0.0, 0.0);
        let b = point(300.0, 400.0, 0.0);
        assert!((a.distance(b) - 500.0).abs() < f64::EPSILON);
        assert!((b.distance(a) - 500.0).abs() < f64::EPSILON);
    }
}
