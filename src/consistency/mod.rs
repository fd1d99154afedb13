//! Global passes over the finished cell set.
//!
//! Run them in this order: [`InsertObjects`] (any number of times),
//! [`RemoveComplements`], [`RemoveDeadSurfaces`], then renumbering and
//! [`ValidateObjectSurfaceMap`]. Every pass validates before it mutates, so
//! a failed pass leaves the model unchanged.

mod complement;
mod dead_surface;
mod hooks;
mod insert;
mod renumber;
mod validate;

pub use complement::RemoveComplements;
pub use dead_surface::RemoveDeadSurfaces;
pub use hooks::{ReferenceSet, SubstitutionHook};
pub use insert::InsertObjects;
pub use renumber::{RenumberCells, RenumberSurfaces};
pub use validate::ValidateObjectSurfaceMap;
