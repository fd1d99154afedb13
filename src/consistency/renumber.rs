use tracing::info;

use crate::error::{RegistryError, Result};
use crate::model::Model;
use crate::registry::{CellId, Renumbering, SurfId};

fn zip_lists<K: Copy>(old: &[K], new: &[K]) -> std::result::Result<Vec<(K, K)>, RegistryError> {
    if old.len() != new.len() {
        return Err(RegistryError::NonBijective(format!(
            "{} old numbers but {} new numbers",
            old.len(),
            new.len()
        )));
    }
    Ok(old.iter().copied().zip(new.iter().copied()).collect())
}

/// Moves cells to new numbers.
///
/// Every `#N` placeholder, component block and registered
/// [`SubstitutionHook`](super::SubstitutionHook) follows the move.
#[derive(Debug, Clone)]
pub struct RenumberCells {
    pairs: Vec<(CellId, CellId)>,
}

impl RenumberCells {
    /// Creates the pass from `(old, new)` pairs.
    #[must_use]
    pub fn new(pairs: impl IntoIterator<Item = (CellId, CellId)>) -> Self {
        Self {
            pairs: pairs.into_iter().collect(),
        }
    }

    /// Creates the pass from two parallel lists.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NonBijective`] if the lists differ in length.
    pub fn from_lists(old: &[CellId], new: &[CellId]) -> Result<Self> {
        Ok(Self::new(zip_lists(old, new)?))
    }

    /// Creates a pass that packs every cell into consecutive numbers from
    /// the configured first cell, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns an error if the numbers would not fit.
    pub fn compact(model: &Model) -> Result<Self> {
        let first = CellId::new(model.config().first_cell).ok_or(RegistryError::NumberSpaceExhausted)?;
        let pairs = model
            .objects()
            .ids()
            .into_iter()
            .zip(0u32..)
            .map(|(old, offset)| {
                first
                    .offset(offset)
                    .map(|new| (old, new))
                    .ok_or(RegistryError::NumberSpaceExhausted)
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { pairs })
    }

    /// Executes the pass and returns the applied mapping.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NonBijective`] without touching the model if
    /// the mapping is not a bijection on the current cells.
    pub fn execute(&self, model: &mut Model) -> Result<Renumbering<CellId>> {
        let renumbering = Renumbering::new(self.pairs.iter().copied(), &model.objects().ids())?;
        if renumbering.is_identity() {
            return Ok(renumbering);
        }
        model.objects_mut().renumber(&renumbering);
        for hook in model.hooks_mut() {
            hook.substitute_cells(&renumbering);
        }
        info!(moved = renumbering.len(), "renumbered cells");
        Ok(renumbering)
    }
}

/// Moves surfaces to new numbers, rewriting every region leaf and keeping
/// each leaf's sense.
#[derive(Debug, Clone)]
pub struct RenumberSurfaces {
    pairs: Vec<(SurfId, SurfId)>,
}

impl RenumberSurfaces {
    /// Creates the pass from `(old, new)` pairs.
    #[must_use]
    pub fn new(pairs: impl IntoIterator<Item = (SurfId, SurfId)>) -> Self {
        Self {
            pairs: pairs.into_iter().collect(),
        }
    }

    /// Creates the pass from two parallel lists.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NonBijective`] if the lists differ in length.
    pub fn from_lists(old: &[SurfId], new: &[SurfId]) -> Result<Self> {
        Ok(Self::new(zip_lists(old, new)?))
    }

    /// Creates a pass that packs every surface into consecutive numbers
    /// from the configured first surface, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns an error if the numbers would not fit.
    pub fn compact(model: &Model) -> Result<Self> {
        let first = model.config().first_surface;
        let pairs = model
            .surfaces()
            .ids()
            .into_iter()
            .zip(0u32..)
            .map(|(old, offset)| {
                first
                    .checked_add(offset)
                    .and_then(SurfId::new)
                    .map(|new| (old, new))
                    .ok_or(RegistryError::NumberSpaceExhausted)
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { pairs })
    }

    /// Executes the pass and returns the applied mapping.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NonBijective`] without touching the model if
    /// the mapping is not a bijection on the held surfaces.
    pub fn execute(&self, model: &mut Model) -> Result<Renumbering<SurfId>> {
        let renumbering = Renumbering::new(self.pairs.iter().copied(), &model.surfaces().ids())?;
        if renumbering.is_identity() {
            return Ok(renumbering);
        }

        let (surfaces, objects) = model.parts_mut();
        let mut regions = Vec::with_capacity(objects.len());
        for (id, cell) in objects.iter() {
            let mut region = cell.region().clone();
            region.map_surfaces(&|s| s.with_id(renumbering.get(s.id())))?;
            regions.push((id, region));
        }
        for ((_, cell), (_, region)) in objects.iter_mut().zip(regions) {
            *cell.region_mut() = region;
        }
        surfaces.renumber(&renumbering);

        for hook in model.hooks_mut() {
            hook.substitute_surfaces(&renumbering);
        }
        info!(moved = renumbering.len(), "renumbered surfaces");
        Ok(renumbering)
    }
}
