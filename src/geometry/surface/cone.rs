use crate::error::{GeometryError, Result};
use crate::math::{approx_eq, unit, vec_approx_eq, Matrix3, Point3, Vector3, TOLERANCE};

use super::{canonical_axis, same_axis, ImplicitSurface, Orientation, Quadric};

/// A two-sheet circular cone.
///
/// Points at axial distance `h` from the apex lie on the cone when their
/// radial distance is `t * h`, where `t_squared = tan^2(half_angle)`.
/// The positive half-space is outside both sheets.
#[derive(Debug, Clone, PartialEq)]
pub struct Cone {
    apex: Point3,
    axis: Vector3,
    t_squared: f64,
}

impl Cone {
    /// Creates a cone from its apex, axis and `tan^2` of the half-angle.
    ///
    /// # Errors
    ///
    /// Returns an error if `t_squared` is not positive or the axis is
    /// zero-length.
    pub fn new(apex: Point3, axis: Vector3, t_squared: f64) -> Result<Self> {
        if t_squared < TOLERANCE || !t_squared.is_finite() {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "t_squared",
                value: t_squared,
                min: TOLERANCE,
                max: f64::MAX,
            }
            .into());
        }
        let axis = canonical_axis(unit(&axis).ok_or(GeometryError::ZeroVector)?);
        Ok(Self {
            apex,
            axis,
            t_squared,
        })
    }

    /// Creates a cone from its half-angle in radians.
    ///
    /// # Errors
    ///
    /// Returns an error if the angle is outside `(0, pi/2)`.
    pub fn from_half_angle(apex: Point3, axis: Vector3, half_angle: f64) -> Result<Self> {
        let max = std::f64::consts::FRAC_PI_2;
        if half_angle <= 0.0 || half_angle >= max {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "half_angle",
                value: half_angle,
                min: 0.0,
                max,
            }
            .into());
        }
        Self::new(apex, axis, half_angle.tan().powi(2))
    }

    /// Returns the apex.
    #[must_use]
    pub fn apex(&self) -> &Point3 {
        &self.apex
    }

    /// Returns the canonical unit axis.
    #[must_use]
    pub fn axis(&self) -> &Vector3 {
        &self.axis
    }

    /// Returns `tan^2` of the half-angle.
    #[must_use]
    pub fn t_squared(&self) -> f64 {
        self.t_squared
    }

    /// Compares two cones within `tol`.
    #[must_use]
    pub fn matches(&self, other: &Self, tol: f64) -> Option<Orientation> {
        (same_axis(&self.axis, &other.axis, tol)
            && vec_approx_eq(&self.apex.coords, &other.apex.coords, tol)
            && approx_eq(self.t_squared, other.t_squared, tol))
        .then_some(Orientation::Same)
    }
}

impl ImplicitSurface for Cone {
    fn value(&self, point: &Point3) -> f64 {
        let d = point - self.apex;
        let h = d.dot(&self.axis);
        d.norm_squared() - (1.0 + self.t_squared) * h * h
    }

    fn to_quadric(&self) -> Quadric {
        let m = Matrix3::identity() - self.axis * self.axis.transpose() * (1.0 + self.t_squared);
        Quadric::from_centered(&m, &self.apex, 0.0)
    }
}
