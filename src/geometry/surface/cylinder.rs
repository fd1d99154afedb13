use crate::error::{GeometryError, Result};
use crate::math::{approx_eq, unit, vec_approx_eq, Matrix3, Point3, Vector3, TOLERANCE};

use super::{canonical_axis, same_axis, ImplicitSurface, Orientation, Quadric};

/// An infinite circular cylinder around an arbitrary axis line.
///
/// Stored canonically: the axis direction has its first significant
/// component positive and `origin` is the point of the axis line closest
/// to the world origin. The positive half-space is outside.
#[derive(Debug, Clone, PartialEq)]
pub struct Cylinder {
    origin: Point3,
    axis: Vector3,
    radius: f64,
}

impl Cylinder {
    /// Creates a cylinder of `radius` around the line through `point`
    /// along `axis`.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is non-positive or the axis is
    /// zero-length.
    pub fn new(point: Point3, axis: Vector3, radius: f64) -> Result<Self> {
        if radius < TOLERANCE {
            return Err(
                GeometryError::Degenerate("cylinder radius must be positive".into()).into(),
            );
        }
        let axis = canonical_axis(unit(&axis).ok_or(GeometryError::ZeroVector)?);
        let origin = point - axis * point.coords.dot(&axis);
        Ok(Self {
            origin,
            axis,
            radius,
        })
    }

    /// Returns the point of the axis closest to the world origin.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the canonical unit axis.
    #[must_use]
    pub fn axis(&self) -> &Vector3 {
        &self.axis
    }

    /// Returns the radius.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Compares two cylinders within `tol`.
    #[must_use]
    pub fn matches(&self, other: &Self, tol: f64) -> Option<Orientation> {
        (same_axis(&self.axis, &other.axis, tol)
            && vec_approx_eq(&self.origin.coords, &other.origin.coords, tol)
            && approx_eq(self.radius, other.radius, tol))
        .then_some(Orientation::Same)
    }
}

impl ImplicitSurface for Cylinder {
    fn value(&self, point: &Point3) -> f64 {
        let d = point - self.origin;
        let h = d.dot(&self.axis);
        d.norm_squared() - h * h - self.radius * self.radius
    }

    fn to_quadric(&self) -> Quadric {
        let m = Matrix3::identity() - self.axis * self.axis.transpose();
        Quadric::from_centered(&m, &self.origin, -self.radius * self.radius)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn origin_is_projected_onto_axis() {
        let c = Cylinder::new(Point3::new(1.0, 2.0, 7.0), Vector3::z(), 3.0).unwrap();
        assert_relative_eq!(c.origin().z, 0.0);
        assert_relative_eq!(c.origin().x, 1.0);
    }

    #[test]
    fn reversed_axis_is_same_cylinder() {
        let a = Cylinder::new(Point3::origin(), Vector3::y(), 2.0).unwrap();
        let b = Cylinder::new(Point3::new(0.0, 9.0, 0.0), -Vector3::y(), 2.0).unwrap();
        assert_eq!(a.matches(&b, 1e-9), Some(Orientation::Same));
    }

    #[test]
    fn nearly_equal_axes_straddling_zero_match() {
        let a = Cylinder::new(Point3::origin(), Vector3::new(1.2e-6, -1.0, 0.0), 1.0).unwrap();
        let b = Cylinder::new(Point3::origin(), Vector3::new(0.8e-6, -1.0, 0.0), 1.0).unwrap();
        assert!(a.axis().x > 0.0);
        assert!(b.axis().y > 0.0);
        assert_eq!(a.matches(&b, 1e-6), Some(Orientation::Same));
    }

    #[test]
    fn inside_is_negative() {
        let c = Cylinder::new(Point3::origin(), Vector3::x(), 1.0).unwrap();
        assert!(c.value(&Point3::new(100.0, 0.5, 0.0)) < 0.0);
        assert!(c.value(&Point3::new(-3.0, 0.0, 1.5)) > 0.0);
    }

    #[test]
    fn quadric_agrees_with_direct_evaluation() {
        let c = Cylinder::new(Point3::new(1.0, -1.0, 0.0), Vector3::new(1.0, 1.0, 1.0), 0.7)
            .unwrap();
        let q = c.to_quadric();
        for p in [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, -2.0, 1.0),
            Point3::new(-1.5, 4.0, 2.5),
        ] {
            assert_relative_eq!(c.value(&p), q.value(&p), epsilon = 1e-9);
        }
    }

    #[test]
    fn zero_radius_rejected() {
        assert!(Cylinder::new(Point3::origin(), Vector3::z(), 0.0).is_err());
    }
}
