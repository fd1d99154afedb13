pub mod surface;

pub use surface::{
    Cone, Cylinder, ImplicitSurface, Orientation, Plane, Quadric, Sphere, Surface, SurfaceKind,
};
