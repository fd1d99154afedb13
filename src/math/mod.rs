/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 3x3 matrix type, used for the quadratic part of a quadric.
pub type Matrix3 = nalgebra::Matrix3<f64>;

/// Tolerance below which a vector or radius is treated as degenerate.
pub const TOLERANCE: f64 = 1e-10;

/// Default tolerance for deciding two surfaces are geometrically equal.
pub const SURFACE_TOLERANCE: f64 = 1e-6;

/// Returns `true` if `a` and `b` differ by at most `tol`.
#[must_use]
pub fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

/// Returns `true` if every component of `a` and `b` differs by at most `tol`.
#[must_use]
pub fn vec_approx_eq(a: &Vector3, b: &Vector3, tol: f64) -> bool {
    (a - b).amax() <= tol
}

/// Normalizes `v`, or returns `None` if it is too short to carry a direction.
#[must_use]
pub fn unit(v: &Vector3) -> Option<Vector3> {
    let len = v.norm();
    (len >= TOLERANCE).then(|| v / len)
}
