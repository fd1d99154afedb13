use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::registry::{CellId, Renumbering, SignedSurf, SurfId};

/// A collaborator that keeps cell or surface numbers outside the registers.
///
/// Hooks registered with [`Model::register_hook`](crate::Model::register_hook)
/// receive every renumbering pass, so their numbers never go stale. The
/// whole mapping arrives at once: applying it pair by pair would break on
/// swaps and chains.
pub trait SubstitutionHook {
    /// Applies a cell renumbering.
    fn substitute_cells(&mut self, renumbering: &Renumbering<CellId>) {
        let _ = renumbering;
    }

    /// Applies a surface renumbering.
    fn substitute_surfaces(&mut self, renumbering: &Renumbering<SurfId>) {
        let _ = renumbering;
    }
}

impl<T: SubstitutionHook> SubstitutionHook for Rc<RefCell<T>> {
    fn substitute_cells(&mut self, renumbering: &Renumbering<CellId>) {
        self.borrow_mut().substitute_cells(renumbering);
    }

    fn substitute_surfaces(&mut self, renumbering: &Renumbering<SurfId>) {
        self.borrow_mut().substitute_surfaces(renumbering);
    }
}

/// Named cell and surface references held by a physics card, tally or
/// similar collaborator.
///
/// Share it with the model as `Rc<RefCell<ReferenceSet>>` so both sides see
/// renumbered values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSet {
    cells: BTreeMap<String, CellId>,
    surfaces: BTreeMap<String, SignedSurf>,
}

impl ReferenceSet {
    /// Creates an empty reference set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a cell under `name`.
    pub fn set_cell(&mut self, name: &str, cell: CellId) {
        self.cells.insert(name.to_owned(), cell);
    }

    /// Records a surface reference under `name`.
    pub fn set_surface(&mut self, name: &str, surface: SignedSurf) {
        self.surfaces.insert(name.to_owned(), surface);
    }

    /// Returns the cell recorded under `name`.
    #[must_use]
    pub fn cell(&self, name: &str) -> Option<CellId> {
        self.cells.get(name).copied()
    }

    /// Returns the surface reference recorded under `name`.
    #[must_use]
    pub fn surface(&self, name: &str) -> Option<SignedSurf> {
        self.surfaces.get(name).copied()
    }
}

impl SubstitutionHook for ReferenceSet {
    fn substitute_cells(&mut self, renumbering: &Renumbering<CellId>) {
        for cell in self.cells.values_mut() {
            *cell = renumbering.get(*cell);
        }
    }

    fn substitute_surfaces(&mut self, renumbering: &Renumbering<SurfId>) {
        for surface in self.surfaces.values_mut() {
            *surface = surface.with_id(renumbering.get(surface.id()));
        }
    }
}
