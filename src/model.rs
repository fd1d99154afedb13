//! The process-scoped state of one build.

use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::consistency::SubstitutionHook;
use crate::error::{ConsistencyError, ExpressionError, RegistryError, Result};
use crate::geometry::Surface;
use crate::math::Point3;
use crate::registry::{
    CellData, CellId, CellRange, CellState, ObjectRegister, SignedSurf, SurfId, SurfaceRegister,
};
use crate::rule::HeadRule;

/// Owner of the surface and object registers for one build.
///
/// Component builders mutate the registers only through these methods and
/// the passes in [`crate::consistency`]. The model is passed explicitly
/// through the build pipeline; call [`Model::reset`] between independent
/// runs.
pub struct Model {
    config: EngineConfig,
    surfaces: SurfaceRegister,
    objects: ObjectRegister,
    hooks: Vec<Box<dyn SubstitutionHook>>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("config", &self.config)
            .field("surfaces", &self.surfaces.len())
            .field("cells", &self.objects.len())
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl Model {
    /// Creates an empty model.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            surfaces: SurfaceRegister::new(config.first_surface, config.tolerance),
            objects: ObjectRegister::new(config.first_cell),
            hooks: Vec::new(),
            config,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the surface register.
    #[must_use]
    pub fn surfaces(&self) -> &SurfaceRegister {
        &self.surfaces
    }

    /// Returns the object register.
    #[must_use]
    pub fn objects(&self) -> &ObjectRegister {
        &self.objects
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut SurfaceRegister, &mut ObjectRegister) {
        (&mut self.surfaces, &mut self.objects)
    }

    pub(crate) fn objects_mut(&mut self) -> &mut ObjectRegister {
        &mut self.objects
    }

    pub(crate) fn hooks_mut(&mut self) -> &mut [Box<dyn SubstitutionHook>] {
        &mut self.hooks
    }

    /// Interns a surface, reusing the number of an equal one.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface number space is exhausted.
    pub fn intern_surface(&mut self, surface: impl Into<Surface>) -> Result<SignedSurf> {
        Ok(self.surfaces.intern(surface.into())?)
    }

    /// Interns a surface under a requested number.
    ///
    /// See [`SurfaceRegister::intern_numbered`].
    ///
    /// # Errors
    ///
    /// Returns an error if `requested` already names a different surface.
    pub fn intern_surface_numbered(
        &mut self,
        requested: SurfId,
        surface: impl Into<Surface>,
    ) -> Result<SignedSurf> {
        Ok(self.surfaces.intern_numbered(requested, surface.into())?)
    }

    /// Reserves a block of cell numbers for a component.
    ///
    /// # Errors
    ///
    /// Returns an error if the component already owns a block.
    pub fn allocate_cell_range(&mut self, name: &str, count: u32) -> Result<CellRange> {
        let range = self.objects.allocate_cell_range(name, count)?;
        debug!(component = name, first = %range.first(), count, "allocated cell range");
        Ok(range)
    }

    /// Adds a cell, resolving surface aliases in its region.
    ///
    /// A cell already stored under `id` is overwritten and returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the region fails to re-simplify.
    pub fn add_cell(&mut self, id: CellId, mut cell: CellData) -> Result<Option<CellData>> {
        let surfaces = &self.surfaces;
        cell.region_mut().map_surfaces(&|s| surfaces.resolve(s))?;
        Ok(self.objects.add_cell(id, cell))
    }

    /// Marks that the component owning `id` has interned its surfaces.
    ///
    /// # Errors
    ///
    /// Returns an error if the cell is unknown or not unpopulated.
    pub fn mark_surfaces_built(&mut self, id: CellId) -> Result<()> {
        self.advance(id, CellState::SurfacesBuilt)
    }

    /// Sets the region of a cell that was added without one.
    ///
    /// # Errors
    ///
    /// Returns [`ExpressionError::DegenerateRegion`] if `region` is empty,
    /// or an error if the cell is unknown or already composed.
    pub fn set_region(&mut self, id: CellId, mut region: HeadRule) -> Result<()> {
        if region.is_empty() {
            return Err(ExpressionError::DegenerateRegion(format!("cell {id} has an empty region")).into());
        }
        let surfaces = &self.surfaces;
        region.map_surfaces(&|s| surfaces.resolve(s))?;
        self.advance(id, CellState::RegionComposed)?;
        if let Some(cell) = self.objects.cell_mut(id) {
            *cell.region_mut() = region;
        }
        Ok(())
    }

    /// Moves a cell to `next`, enforcing the lifecycle.
    pub(crate) fn advance(&mut self, id: CellId, next: CellState) -> Result<()> {
        let cell = self
            .objects
            .cell_mut(id)
            .ok_or(RegistryError::UnknownCell(id))?;
        let from = cell.state();
        if !from.can_advance_to(next) {
            return Err(RegistryError::InvalidTransition {
                cell: id,
                from,
                to: next,
            }
            .into());
        }
        cell.set_state(next);
        Ok(())
    }

    /// Returns the cell stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if no such cell exists.
    pub fn cell(&self, id: CellId) -> Result<&CellData> {
        Ok(self
            .objects
            .cell(id)
            .ok_or(RegistryError::UnknownCell(id))?)
    }

    /// Returns the region of a cell as a token string.
    ///
    /// # Errors
    ///
    /// Returns an error if no such cell exists.
    pub fn cell_region_string(&self, id: CellId) -> Result<String> {
        Ok(self.cell(id)?.region().as_str().to_owned())
    }

    /// Tests whether `point` lies in cell `id`.
    ///
    /// Returns `Ok(None)` if the region still references an unknown
    /// surface or an unresolved `#N` placeholder.
    ///
    /// # Errors
    ///
    /// Returns an error if no such cell exists.
    pub fn cell_contains(&self, id: CellId, point: &Point3) -> Result<Option<bool>> {
        let cell = self.cell(id)?;
        Ok(cell.region().contains(point, &|s| self.surfaces.get(s)))
    }

    /// Deletes a surface no cell references.
    ///
    /// # Errors
    ///
    /// Returns [`ConsistencyError::SurfaceStillReferenced`] if a live cell
    /// still references it, or [`RegistryError::UnknownSurface`] if it is
    /// not held. The surface is kept in both cases.
    pub fn remove_surface(&mut self, id: SurfId) -> Result<Surface> {
        if let Some((cell, _)) = self
            .objects
            .iter()
            .find(|(_, c)| c.region().has_surface(id))
        {
            return Err(ConsistencyError::SurfaceStillReferenced { surface: id, cell }.into());
        }
        Ok(self
            .surfaces
            .remove(id)
            .ok_or(RegistryError::UnknownSurface(id))?)
    }

    /// Registers a collaborator that must follow renumbering.
    pub fn register_hook(&mut self, hook: Box<dyn SubstitutionHook>) {
        self.hooks.push(hook);
    }

    /// Clears every register and hook, returning to the pre-build state.
    pub fn reset(&mut self) {
        info!(
            surfaces = self.surfaces.len(),
            cells = self.objects.len(),
            "resetting model"
        );
        self.surfaces.reset();
        self.objects.reset();
        self.hooks.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::HalfspaceError;
    use crate::geometry::{Plane, Sphere};
    use crate::math::Vector3;

    fn id(n: u32) -> CellId {
        CellId::new(n).unwrap()
    }

    #[test]
    fn aliases_resolve_on_add() {
        let mut model = Model::default();
        let p = Plane::new(Vector3::x(), 1.0).unwrap();
        model.intern_surface_numbered(SurfId::new(5).unwrap(), p.clone()).unwrap();
        model
            .intern_surface_numbered(SurfId::new(9).unwrap(), p.flipped())
            .unwrap();
        let region = HeadRule::parse("-9 5").unwrap();
        model.add_cell(id(1), CellData::void(region)).unwrap();
        assert_eq!(model.cell_region_string(id(1)).unwrap(), "5");
    }

    #[test]
    fn surface_in_use_cannot_be_removed() {
        let mut model = Model::default();
        let s = model
            .intern_surface(Sphere::new(Point3::origin(), 1.0).unwrap())
            .unwrap();
        model
            .add_cell(id(1), CellData::void(HeadRule::parse(&format!("{}", s.flipped())).unwrap()))
            .unwrap();
        let err = model.remove_surface(s.id()).unwrap_err();
        assert!(matches!(
            err,
            HalfspaceError::Consistency(ConsistencyError::SurfaceStillReferenced { .. })
        ));
        assert!(err.is_fatal());
        assert!(model.surfaces().contains(s.id()));
    }

    #[test]
    fn region_set_once() {
        let mut model = Model::default();
        model.add_cell(id(3), CellData::new(1, 0.1)).unwrap();
        model.mark_surfaces_built(id(3)).unwrap();
        model.set_region(id(3), HeadRule::parse("1").unwrap()).unwrap();
        assert_eq!(model.cell(id(3)).unwrap().state(), CellState::RegionComposed);
        assert!(model.set_region(id(3), HeadRule::parse("2").unwrap()).is_err());
    }

    #[test]
    fn empty_region_is_rejected() {
        let mut model = Model::default();
        model.add_cell(id(4), CellData::new(2, 1.0)).unwrap();
        model.mark_surfaces_built(id(4)).unwrap();
        let err = model.set_region(id(4), HeadRule::new()).unwrap_err();
        assert!(matches!(
            err,
            HalfspaceError::Expression(ExpressionError::DegenerateRegion(_))
        ));
        assert_eq!(model.cell(id(4)).unwrap().state(), CellState::SurfacesBuilt);
        model.set_region(id(4), HeadRule::parse("-1").unwrap()).unwrap();
        assert_eq!(model.cell(id(4)).unwrap().region().as_str(), "-1");
    }

    #[test]
    fn cell_contains_evaluates_the_region() {
        let mut model = Model::default();
        let s = model
            .intern_surface(Sphere::new(Point3::origin(), 2.0).unwrap())
            .unwrap();
        model
            .add_cell(id(1), CellData::void(HeadRule::from_rule(crate::Rule::surface(s.flipped())).unwrap()))
            .unwrap();
        assert_eq!(model.cell_contains(id(1), &Point3::origin()).unwrap(), Some(true));
        assert_eq!(
            model.cell_contains(id(1), &Point3::new(3.0, 0.0, 0.0)).unwrap(),
            Some(false)
        );
    }

    #[test]
    fn reset_clears_state() {
        let mut model = Model::default();
        model.allocate_cell_range("target", 2).unwrap();
        model.intern_surface(Plane::new(Vector3::z(), 0.0).unwrap()).unwrap();
        model.reset();
        assert!(model.surfaces().is_empty());
        assert!(model.objects().cell_range("target").is_none());
    }
}
