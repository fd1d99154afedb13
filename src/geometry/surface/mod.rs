mod cone;
mod cylinder;
mod plane;
mod quadric;
mod sphere;

pub use cone::Cone;
pub use cylinder::Cylinder;
pub use plane::Plane;
pub use quadric::Quadric;
pub use sphere::Sphere;

use std::fmt;

use crate::math::{vec_approx_eq, Point3, Vector3, SURFACE_TOLERANCE, TOLERANCE};

/// Trait for surfaces given by an implicit function `f(x) = 0`.
///
/// The sign of `f` decides the half-space: `f > 0` is the positive side.
pub trait ImplicitSurface {
    /// Evaluates the implicit function at `point`.
    fn value(&self, point: &Point3) -> f64;

    /// Returns the equivalent general quadric.
    fn to_quadric(&self) -> Quadric;
}

/// How a matching surface is oriented relative to the one it was compared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Same surface, same positive side.
    Same,
    /// Same surface, positive and negative sides swapped.
    Flipped,
}

/// Geometric kind of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    Plane,
    Sphere,
    Cylinder,
    Cone,
    Quadric,
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Plane => "plane",
            Self::Sphere => "sphere",
            Self::Cylinder => "cylinder",
            Self::Cone => "cone",
            Self::Quadric => "quadric",
        };
        f.write_str(name)
    }
}

/// A geometric primitive held by the surface register.
#[derive(Debug, Clone, PartialEq)]
pub enum Surface {
    Plane(Plane),
    Sphere(Sphere),
    Cylinder(Cylinder),
    Cone(Cone),
    Quadric(Quadric),
}

impl Surface {
    /// Returns the geometric kind.
    #[must_use]
    pub fn kind(&self) -> SurfaceKind {
        match self {
            Self::Plane(_) => SurfaceKind::Plane,
            Self::Sphere(_) => SurfaceKind::Sphere,
            Self::Cylinder(_) => SurfaceKind::Cylinder,
            Self::Cone(_) => SurfaceKind::Cone,
            Self::Quadric(_) => SurfaceKind::Quadric,
        }
    }

    /// Compares two surfaces of the same kind within `tol`.
    ///
    /// Surfaces of different kinds never match.
    #[must_use]
    pub fn matches(&self, other: &Self, tol: f64) -> Option<Orientation> {
        match (self, other) {
            (Self::Plane(a), Self::Plane(b)) => a.matches(b, tol),
            (Self::Sphere(a), Self::Sphere(b)) => a.matches(b, tol),
            (Self::Cylinder(a), Self::Cylinder(b)) => a.matches(b, tol),
            (Self::Cone(a), Self::Cone(b)) => a.matches(b, tol),
            (Self::Quadric(a), Self::Quadric(b)) => a.matches(b, tol),
            _ => None,
        }
    }

    /// Returns `true` if `point` lies on the positive side.
    ///
    /// Points within [`TOLERANCE`] of the surface count as positive.
    #[must_use]
    pub fn is_positive_side(&self, point: &Point3) -> bool {
        self.value(point) > -TOLERANCE
    }
}

impl ImplicitSurface for Surface {
    fn value(&self, point: &Point3) -> f64 {
        match self {
            Self::Plane(s) => s.value(point),
            Self::Sphere(s) => s.value(point),
            Self::Cylinder(s) => s.value(point),
            Self::Cone(s) => s.value(point),
            Self::Quadric(s) => s.value(point),
        }
    }

    fn to_quadric(&self) -> Quadric {
        match self {
            Self::Plane(s) => s.to_quadric(),
            Self::Sphere(s) => s.to_quadric(),
            Self::Cylinder(s) => s.to_quadric(),
            Self::Cone(s) => s.to_quadric(),
            Self::Quadric(s) => s.clone(),
        }
    }
}

impl From<Plane> for Surface {
    fn from(s: Plane) -> Self {
        Self::Plane(s)
    }
}

impl From<Sphere> for Surface {
    fn from(s: Sphere) -> Self {
        Self::Sphere(s)
    }
}

impl From<Cylinder> for Surface {
    fn from(s: Cylinder) -> Self {
        Self::Cylinder(s)
    }
}

impl From<Cone> for Surface {
    fn from(s: Cone) -> Self {
        Self::Cone(s)
    }
}

impl From<Quadric> for Surface {
    fn from(s: Quadric) -> Self {
        Self::Quadric(s)
    }
}

/// Flips a unit axis so its first significant component is positive.
///
/// Cylinders and cones are symmetric under axis reversal, so this gives a
/// single representative per axis line. Components below
/// [`SURFACE_TOLERANCE`] do not count as significant.
fn canonical_axis(axis: Vector3) -> Vector3 {
    let lead = axis
        .iter()
        .copied()
        .find(|c| c.abs() > SURFACE_TOLERANCE)
        .unwrap_or(0.0);
    if lead < 0.0 {
        -axis
    } else {
        axis
    }
}

/// Returns `true` if two unit axes lie along the same line within `tol`.
fn same_axis(a: &Vector3, b: &Vector3, tol: f64) -> bool {
    vec_approx_eq(a, b, tol) || vec_approx_eq(a, &-b, tol)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn different_kinds_never_match() {
        let s: Surface = Sphere::new(Point3::origin(), 1.0).unwrap().into();
        let q: Surface = s.to_quadric().into();
        assert_eq!(s.matches(&q, 1e-6), None);
    }

    #[test]
    fn canonical_axis_flips_leading_negative() {
        let a = canonical_axis(Vector3::new(0.0, -1.0, 0.0));
        assert!(a.y > 0.0);
        let b = canonical_axis(Vector3::new(0.0, 0.6, -0.8));
        assert!(b.y > 0.0);
    }

    #[test]
    fn side_of_plane() {
        let s: Surface = Plane::new(Vector3::z(), 0.0).unwrap().into();
        assert!(s.is_positive_side(&Point3::new(0.0, 0.0, 1.0)));
        assert!(!s.is_positive_side(&Point3::new(0.0, 0.0, -1.0)));
    }
}
