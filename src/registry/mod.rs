//! Registers that own every surface and cell of a build.

mod cell;
mod handle;
mod object;
mod renumbering;
mod surface;

pub use cell::{CellData, CellState};
pub use handle::{CellId, SignedSurf, SurfId};
pub use object::{CellRange, ObjectRegister};
pub use renumbering::Renumbering;
pub use surface::SurfaceRegister;
