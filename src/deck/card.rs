//! Conversion between surfaces and MCNP-style surface cards.

use crate::geometry::{Cone, Cylinder, ImplicitSurface, Plane, Quadric, Sphere, Surface};
use crate::math::{Point3, Vector3, TOLERANCE};

const AXES: [char; 3] = ['x', 'y', 'z'];

/// Mnemonic and parameters of one surface card.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SurfaceCard {
    pub(crate) mnemonic: String,
    pub(crate) params: Vec<f64>,
}

impl SurfaceCard {
    fn new(mnemonic: impl Into<String>, params: Vec<f64>) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            params,
        }
    }
}

/// Index of the world axis `v` points along, if it is one of `+x`, `+y`, `+z`.
fn axis_index(v: &Vector3) -> Option<usize> {
    (0..3).find(|&i| {
        (v[i] - 1.0).abs() <= TOLERANCE && (0..3).all(|j| j == i || v[j].abs() <= TOLERANCE)
    })
}

/// The two coordinates of `p` across axis `i`.
fn across(p: &Point3, i: usize) -> [f64; 2] {
    match i {
        0 => [p.y, p.z],
        1 => [p.x, p.z],
        _ => [p.x, p.y],
    }
}

/// The point with coordinate `along` on axis `i` and `rest` on the others.
fn place(i: usize, along: f64, rest: [f64; 2]) -> Point3 {
    match i {
        0 => Point3::new(along, rest[0], rest[1]),
        1 => Point3::new(rest[0], along, rest[1]),
        _ => Point3::new(rest[0], rest[1], along),
    }
}

fn is_zero(values: &[f64]) -> bool {
    values.iter().all(|v| v.abs() <= TOLERANCE)
}

/// Picks the most specific card that reproduces `surface` with the same
/// positive side, falling back to `gq`.
pub(crate) fn to_card(surface: &Surface) -> SurfaceCard {
    match surface {
        Surface::Plane(p) => match axis_index(p.normal()) {
            Some(i) => SurfaceCard::new(format!("p{}", AXES[i]), vec![p.distance()]),
            None => {
                let n = p.normal();
                SurfaceCard::new("p", vec![n.x, n.y, n.z, p.distance()])
            }
        },
        Surface::Sphere(s) => {
            let c = s.center();
            if is_zero(c.coords.as_slice()) {
                SurfaceCard::new("so", vec![s.radius()])
            } else {
                SurfaceCard::new("s", vec![c.x, c.y, c.z, s.radius()])
            }
        }
        Surface::Cylinder(c) => match axis_index(c.axis()) {
            Some(i) => {
                let [u, v] = across(c.origin(), i);
                if is_zero(&[u, v]) {
                    SurfaceCard::new(format!("c{}", AXES[i]), vec![c.radius()])
                } else {
                    SurfaceCard::new(format!("c/{}", AXES[i]), vec![u, v, c.radius()])
                }
            }
            None => quadric_card(&c.to_quadric()),
        },
        Surface::Cone(k) => match axis_index(k.axis()) {
            Some(i) => {
                let apex = k.apex();
                let [u, v] = across(apex, i);
                if is_zero(&[u, v]) {
                    SurfaceCard::new(format!("k{}", AXES[i]), vec![apex[i], k.t_squared()])
                } else {
                    SurfaceCard::new(
                        format!("k/{}", AXES[i]),
                        vec![apex.x, apex.y, apex.z, k.t_squared()],
                    )
                }
            }
            None => quadric_card(&k.to_quadric()),
        },
        Surface::Quadric(q) => quadric_card(q),
    }
}

fn quadric_card(q: &Quadric) -> SurfaceCard {
    SurfaceCard::new("gq", q.coefficients().to_vec())
}

fn expect_params(mnemonic: &str, params: &[f64], count: usize) -> Result<(), String> {
    if params.len() == count {
        Ok(())
    } else {
        Err(format!(
            "`{mnemonic}` takes {count} parameter(s), found {}",
            params.len()
        ))
    }
}

/// Splits a trailing `x`, `y` or `z` off a mnemonic.
fn split_axis(mnemonic: &str) -> (&str, Option<usize>) {
    let Some(last) = mnemonic.chars().last() else {
        return (mnemonic, None);
    };
    match AXES.iter().position(|&a| a == last) {
        Some(i) => (&mnemonic[..mnemonic.len() - 1], Some(i)),
        None => (mnemonic, None),
    }
}

/// Builds the surface described by a card.
///
/// Errors are returned as a reason string for the caller to attach a line
/// number to.
pub(crate) fn from_card(mnemonic: &str, params: &[f64]) -> Result<Surface, String> {
    let mnemonic = mnemonic.to_ascii_lowercase();
    let (stem, axis) = split_axis(&mnemonic);
    let count = match (stem, axis) {
        ("p" | "c", Some(_)) | ("so", None) => 1,
        ("k", Some(_)) => 2,
        ("c/", Some(_)) => 3,
        ("p" | "s", None) | ("k/", Some(_)) => 4,
        ("gq", None) => 10,
        _ => return Err(format!("unknown surface mnemonic `{mnemonic}`")),
    };
    expect_params(&mnemonic, params, count)?;

    let p = params;
    let surface: crate::error::Result<Surface> = match (stem, axis) {
        ("p", Some(i)) => Plane::new(Vector3::ith(i, 1.0), p[0]).map(Into::into),
        ("p", None) => Plane::new(Vector3::new(p[0], p[1], p[2]), p[3]).map(Into::into),
        ("so", _) => Sphere::new(Point3::origin(), p[0]).map(Into::into),
        ("s", _) => Sphere::new(Point3::new(p[0], p[1], p[2]), p[3]).map(Into::into),
        ("c", Some(i)) => Cylinder::new(Point3::origin(), Vector3::ith(i, 1.0), p[0]).map(Into::into),
        ("c/", Some(i)) => {
            Cylinder::new(place(i, 0.0, [p[0], p[1]]), Vector3::ith(i, 1.0), p[2]).map(Into::into)
        }
        ("k", Some(i)) => {
            Cone::new(place(i, p[0], [0.0, 0.0]), Vector3::ith(i, 1.0), p[1]).map(Into::into)
        }
        ("k/", Some(i)) => {
            Cone::new(Point3::new(p[0], p[1], p[2]), Vector3::ith(i, 1.0), p[3]).map(Into::into)
        }
        _ => {
            let mut coefficients = [0.0; 10];
            coefficients.copy_from_slice(p);
            Quadric::new(coefficients).map(Into::into)
        }
    };
    surface.map_err(|e| e.to_string())
}

/// Formats a number for a card. Negative zero prints as `0`.
pub(crate) fn number(value: f64) -> String {
    // Adding zero turns -0.0 into 0.0.
    (value + 0.0).to_string()
}

/// Formats a cell density, always with a decimal point.
pub(crate) fn density(value: f64) -> String {
    let text = number(value);
    if text.contains('.') || !value.is_finite() {
        text
    } else {
        format!("{text}.0")
    }
}
