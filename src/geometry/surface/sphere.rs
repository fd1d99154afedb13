use crate::error::{GeometryError, Result};
use crate::math::{approx_eq, vec_approx_eq, Matrix3, Point3, TOLERANCE};

use super::{ImplicitSurface, Orientation, Quadric};

/// A sphere `|x - c|^2 = r^2`. The positive half-space is outside.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    center: Point3,
    radius: f64,
}

impl Sphere {
    /// Creates a new sphere.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is not positive.
    pub fn new(center: Point3, radius: f64) -> Result<Self> {
        if radius < TOLERANCE {
            return Err(GeometryError::Degenerate("sphere radius must be positive".into()).into());
        }
        Ok(Self { center, radius })
    }

    /// Returns the center of the sphere.
    #[must_use]
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    /// Returns the radius.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Compares two spheres within `tol`.
    #[must_use]
    pub fn matches(&self, other: &Self, tol: f64) -> Option<Orientation> {
        (vec_approx_eq(&self.center.coords, &other.center.coords, tol)
            && approx_eq(self.radius, other.radius, tol))
        .then_some(Orientation::Same)
    }
}

impl ImplicitSurface for Sphere {
    fn value(&self, point: &Point3) -> f64 {
        (point - self.center).norm_squared() - self.radius * self.radius
    }

    fn to_quadric(&self) -> Quadric {
        Quadric::from_centered(&Matrix3::identity(), &self.center, -self.radius * self.radius)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn inside_is_negative() {
        let s = Sphere::new(Point3::new(1.0, 0.0, 0.0), 2.0).unwrap();
        assert!(s.value(&Point3::new(1.5, 0.0, 0.0)) < 0.0);
        assert!(s.value(&Point3::new(4.0, 0.0, 0.0)) > 0.0);
    }

    #[test]
    fn tolerance_equality() {
        let a = Sphere::new(Point3::origin(), 10.0).unwrap();
        let b = Sphere::new(Point3::new(1e-8, 0.0, 0.0), 10.0 + 1e-8).unwrap();
        assert_eq!(a.matches(&b, 1e-6), Some(Orientation::Same));
        let c = Sphere::new(Point3::origin(), 10.1).unwrap();
        assert_eq!(a.matches(&c, 1e-6), None);
    }

    #[test]
    fn invalid_radius() {
        assert!(Sphere::new(Point3::origin(), 0.0).is_err());
    }
}
