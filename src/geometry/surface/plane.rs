use crate::error::{GeometryError, Result};
use crate::math::{approx_eq, unit, vec_approx_eq, Point3, Vector3};

use super::{ImplicitSurface, Orientation, Quadric};

/// An infinite plane `n . x = d` with unit normal `n`.
///
/// The positive half-space is the side the normal points into.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    normal: Vector3,
    distance: f64,
}

impl Plane {
    /// Creates a plane from a normal and the signed distance along it.
    ///
    /// The normal is normalized and `distance` scaled to match, so
    /// `Plane::new(2 * n, 2 * d)` and `Plane::new(n, d)` are the same plane.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal is zero-length.
    pub fn new(normal: Vector3, distance: f64) -> Result<Self> {
        let len = normal.norm();
        let normal = unit(&normal).ok_or(GeometryError::ZeroVector)?;
        Ok(Self {
            normal,
            distance: distance / len,
        })
    }

    /// Creates the plane through `point` with the given normal.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal is zero-length.
    pub fn through(point: &Point3, normal: Vector3) -> Result<Self> {
        let normal = unit(&normal).ok_or(GeometryError::ZeroVector)?;
        Ok(Self {
            normal,
            distance: normal.dot(&point.coords),
        })
    }

    /// Returns the unit normal.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Returns the signed distance of the plane from the origin.
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Returns the same plane with the normal reversed.
    #[must_use]
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            distance: -self.distance,
        }
    }

    /// Compares two planes within `tol`, allowing a reversed normal.
    #[must_use]
    pub fn matches(&self, other: &Self, tol: f64) -> Option<Orientation> {
        if vec_approx_eq(&self.normal, &other.normal, tol)
            && approx_eq(self.distance, other.distance, tol)
        {
            Some(Orientation::Same)
        } else if vec_approx_eq(&self.normal, &-other.normal, tol)
            && approx_eq(self.distance, -other.distance, tol)
        {
            Some(Orientation::Flipped)
        } else {
            None
        }
    }
}

impl ImplicitSurface for Plane {
    fn value(&self, point: &Point3) -> f64 {
        self.normal.dot(&point.coords) - self.distance
    }

    fn to_quadric(&self) -> Quadric {
        Quadric::from_linear(&self.normal, -self.distance)
    }
}
