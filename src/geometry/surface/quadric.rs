use crate::error::{GeometryError, Result};
use crate::math::{approx_eq, Matrix3, Point3, Vector3, TOLERANCE};

use super::{ImplicitSurface, Orientation};

/// A general quadric surface
/// `A x^2 + B y^2 + C z^2 + D xy + E yz + F zx + G x + H y + J z + K = 0`.
///
/// Coefficients are stored in that order. The positive half-space is where
/// the polynomial is positive.
#[derive(Debug, Clone, PartialEq)]
pub struct Quadric {
    coefficients: [f64; 10],
}

impl Quadric {
    /// Creates a quadric from its ten coefficients.
    ///
    /// # Errors
    ///
    /// Returns an error if every coefficient is (near) zero.
    pub fn new(coefficients: [f64; 10]) -> Result<Self> {
        if coefficients.iter().all(|c| c.abs() < TOLERANCE) {
            return Err(GeometryError::Degenerate("quadric has no non-zero coefficient".into()).into());
        }
        Ok(Self { coefficients })
    }

    /// Builds the quadric `(x - c)^T M (x - c) + k` for a symmetric `M`.
    #[must_use]
    pub fn from_centered(m: &Matrix3, center: &Point3, k: f64) -> Self {
        let c = center.coords;
        let linear = -2.0 * (m * c);
        Self {
            coefficients: [
                m[(0, 0)],
                m[(1, 1)],
                m[(2, 2)],
                2.0 * m[(0, 1)],
                2.0 * m[(1, 2)],
                2.0 * m[(0, 2)],
                linear.x,
                linear.y,
                linear.z,
                c.dot(&(m * c)) + k,
            ],
        }
    }

    /// Builds the degree-one quadric `g . x + k`.
    #[must_use]
    pub fn from_linear(g: &Vector3, k: f64) -> Self {
        Self {
            coefficients: [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, g.x, g.y, g.z, k],
        }
    }

    /// Returns the coefficients `A..K`.
    #[must_use]
    pub fn coefficients(&self) -> &[f64; 10] {
        &self.coefficients
    }

    /// Coefficients scaled so the largest magnitude is one, sign preserved.
    fn normalized(&self) -> [f64; 10] {
        let scale = self
            .coefficients
            .iter()
            .fold(0.0_f64, |acc, c| acc.max(c.abs()));
        self.coefficients.map(|c| c / scale)
    }

    /// Compares two quadrics up to a positive or negative overall scale.
    #[must_use]
    pub fn matches(&self, other: &Self, tol: f64) -> Option<Orientation> {
        let a = self.normalized();
        let b = other.normalized();
        if a.iter().zip(&b).all(|(x, y)| approx_eq(*x, *y, tol)) {
            Some(Orientation::Same)
        } else if a.iter().zip(&b).all(|(x, y)| approx_eq(*x, -*y, tol)) {
            Some(Orientation::Flipped)
        } else {
            None
        }
    }
}

impl ImplicitSurface for Quadric {
    fn value(&self, p: &Point3) -> f64 {
        let [a, b, c, d, e, f, g, h, j, k] = self.coefficients;
        let (x, y, z) = (p.x, p.y, p.z);
        a * x * x + b * y * y + c * z * z + d * x * y + e * y * z + f * z * x + g * x + h * y + j * z + k
    }

    fn to_quadric(&self) -> Quadric {
        self.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_sphere() -> Quadric {
        Quadric::new([1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -1.0]).unwrap()
    }

    #[test]
    fn evaluates_polynomial() {
        let q = unit_sphere();
        assert_relative_eq!(q.value(&Point3::new(2.0, 0.0, 0.0)), 3.0);
        assert_relative_eq!(q.value(&Point3::origin()), -1.0);
    }

    #[test]
    fn scale_invariant_match() {
        let a = unit_sphere();
        let b = Quadric::new([3.0, 3.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -3.0]).unwrap();
        let c = Quadric::new([-2.0, -2.0, -2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 2.0]).unwrap();
        assert_eq!(a.matches(&b, 1e-9), Some(Orientation::Same));
        assert_eq!(a.matches(&c, 1e-9), Some(Orientation::Flipped));
    }

    #[test]
    fn centered_form_expands() {
        let q = Quadric::from_centered(&Matrix3::identity(), &Point3::new(1.0, 0.0, 0.0), -4.0);
        assert_relative_eq!(q.value(&Point3::new(3.0, 0.0, 0.0)), 0.0);
        assert_relative_eq!(q.value(&Point3::new(1.0, 0.0, 0.0)), -4.0);
    }

    #[test]
    fn all_zero_rejected() {
        assert!(Quadric::new([0.0; 10]).is_err());
    }
}
