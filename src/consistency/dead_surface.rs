use std::collections::BTreeSet;

use tracing::info;

use crate::error::{ConsistencyError, Result};
use crate::model::Model;
use crate::registry::SurfId;

/// Deletes every surface no live cell references.
///
/// Must run after complement resolution: a surface reachable only through
/// a `#N` placeholder would otherwise look dead.
#[derive(Debug, Default)]
pub struct RemoveDeadSurfaces;

impl RemoveDeadSurfaces {
    /// Creates the pass.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the pass, returning the removed surface numbers.
    ///
    /// # Errors
    ///
    /// Returns [`ConsistencyError::UnresolvedComplement`] if any cell still
    /// holds a placeholder.
    pub fn execute(&self, model: &mut Model) -> Result<Vec<SurfId>> {
        let (surfaces, objects) = model.parts_mut();
        let mut live = BTreeSet::new();
        for (id, cell) in objects.iter() {
            if let Some(target) = cell.region().cell_complements().into_iter().next() {
                return Err(ConsistencyError::UnresolvedComplement { cell: id, target }.into());
            }
            live.extend(cell.region().surfaces());
        }

        let dead: Vec<SurfId> = surfaces
            .ids()
            .into_iter()
            .filter(|id| !live.contains(id))
            .collect();
        for id in &dead {
            surfaces.remove(*id);
        }
        info!(removed = dead.len(), kept = surfaces.len(), "removed dead surfaces");
        Ok(dead)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::HalfspaceError;
    use crate::geometry::Plane;
    use crate::math::Vector3;
    use crate::registry::{CellData, CellId};
    use crate::rule::HeadRule;

    fn planes(model: &mut Model, n: u32) {
        for i in 1..=n {
            model
                .intern_surface(Plane::new(Vector3::z(), f64::from(i)).unwrap())
                .unwrap();
        }
    }

    fn add(model: &mut Model, n: u32, text: &str) {
        model
            .add_cell(CellId::new(n).unwrap(), CellData::void(HeadRule::parse(text).unwrap()))
            .unwrap();
    }

    #[test]
    fn unreferenced_surfaces_are_removed() {
        let mut model = Model::default();
        planes(&mut model, 4);
        add(&mut model, 1, "1 -3");
        let removed = model_ids(&RemoveDeadSurfaces::new().execute(&mut model).unwrap());
        assert_eq!(removed, vec![2, 4]);
        assert!(model.surfaces().contains(SurfId::new(1).unwrap()));
        assert!(model.surfaces().contains(SurfId::new(3).unwrap()));
    }

    #[test]
    fn refuses_to_run_before_resolution() {
        let mut model = Model::default();
        planes(&mut model, 2);
        add(&mut model, 1, "1");
        add(&mut model, 2, "-1 #3");
        add(&mut model, 3, "2");
        let err = RemoveDeadSurfaces::new().execute(&mut model).unwrap_err();
        assert!(matches!(
            err,
            HalfspaceError::Consistency(ConsistencyError::UnresolvedComplement { .. })
        ));
        assert_eq!(model.surfaces().len(), 2);
    }

    fn model_ids(ids: &[SurfId]) -> Vec<u32> {
        ids.iter().map(|id| id.get()).collect()
    }
}
