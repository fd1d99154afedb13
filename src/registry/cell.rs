use crate::rule::HeadRule;

/// Build lifecycle of a cell.
///
/// Only [`CellState::Inserted`] may be re-entered; every other transition
/// happens once per build cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CellState {
    /// Number reserved, nothing else known.
    Unpopulated,
    /// The owning component has interned its surfaces.
    SurfacesBuilt,
    /// The region is composed.
    RegionComposed,
    /// Other cells have been subtracted from the region.
    Inserted,
    /// Every `#N` placeholder has been substituted.
    ComplementsResolved,
    /// Renumbered and written.
    Finalized,
}

impl CellState {
    /// Returns `true` if a cell may move from `self` to `next`.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        use CellState::{
            ComplementsResolved, Finalized, Inserted, RegionComposed, SurfacesBuilt, Unpopulated,
        };
        matches!(
            (self, next),
            (Unpopulated, SurfacesBuilt | RegionComposed)
                | (SurfacesBuilt, RegionComposed)
                | (RegionComposed | Inserted, Inserted | ComplementsResolved)
                | (ComplementsResolved, Finalized)
        )
    }

    /// Returns `true` once the region may still be edited by the build.
    #[must_use]
    pub fn is_editable(self) -> bool {
        self < Self::ComplementsResolved
    }
}

/// Data associated with a cell.
///
/// The cell number is the key under which the object register stores it.
#[derive(Debug, Clone)]
pub struct CellData {
    material: u32,
    density: f64,
    temperature: f64,
    region: HeadRule,
    state: CellState,
}

impl CellData {
    /// Creates an unpopulated cell. Material `0` is void.
    #[must_use]
    pub fn new(material: u32, density: f64) -> Self {
        Self {
            material,
            density,
            temperature: 0.0,
            region: HeadRule::new(),
            state: CellState::Unpopulated,
        }
    }

    /// Creates a void cell with the given region.
    #[must_use]
    pub fn void(region: HeadRule) -> Self {
        Self::new(0, 0.0).with_region(region)
    }

    /// Sets the region. A non-empty region marks the cell composed.
    #[must_use]
    pub fn with_region(mut self, region: HeadRule) -> Self {
        if !region.is_empty() {
            self.state = CellState::RegionComposed;
        }
        self.region = region;
        self
    }

    /// Sets the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Returns the material number.
    #[must_use]
    pub fn material(&self) -> u32 {
        self.material
    }

    /// Returns `true` for material `0`.
    #[must_use]
    pub fn is_void(&self) -> bool {
        self.material == 0
    }

    /// Returns the density.
    #[must_use]
    pub fn density(&self) -> f64 {
        self.density
    }

    /// Returns the temperature.
    #[must_use]
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Returns the region.
    #[must_use]
    pub fn region(&self) -> &HeadRule {
        &self.region
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> CellState {
        self.state
    }

    pub(crate) fn region_mut(&mut self) -> &mut HeadRule {
        &mut self.region
    }

    pub(crate) fn set_state(&mut self, state: CellState) {
        self.state = state;
    }
}
