use tracing::warn;

use crate::error::{ConsistencyError, DanglingReference, Result};
use crate::model::Model;

/// Checks that every surface leaf of every cell names a held surface, and
/// every `#N` placeholder names a live cell.
///
/// Reports problems; never repairs them.
#[derive(Debug, Default)]
pub struct ValidateObjectSurfaceMap;

impl ValidateObjectSurfaceMap {
    /// Creates the check.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the check.
    ///
    /// # Errors
    ///
    /// Returns [`ConsistencyError::DanglingSurfaceReference`] listing every
    /// dangling leaf, or [`ConsistencyError::UnresolvedComplement`] for a
    /// placeholder whose cell does not exist.
    pub fn execute(&self, model: &Model) -> Result<()> {
        let surfaces = model.surfaces();
        let objects = model.objects();
        let mut references = Vec::new();
        for (cell, data) in objects.iter() {
            for surface in data.region().signed_surfaces() {
                if !surfaces.contains(surface.id()) {
                    references.push(DanglingReference { cell, surface });
                }
            }
            if let Some(target) = data
                .region()
                .cell_complements()
                .into_iter()
                .find(|t| !objects.contains(*t))
            {
                return Err(ConsistencyError::UnresolvedComplement { cell, target }.into());
            }
        }
        if references.is_empty() {
            Ok(())
        } else {
            warn!(count = references.len(), "dangling surface references");
            Err(ConsistencyError::DanglingSurfaceReference { references }.into())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::HalfspaceError;
    use crate::geometry::Sphere;
    use crate::math::Point3;
    use crate::registry::{CellData, CellId};
    use crate::rule::HeadRule;

    fn add(model: &mut Model, n: u32, text: &str) {
        model
            .add_cell(CellId::new(n).unwrap(), CellData::void(HeadRule::parse(text).unwrap()))
            .unwrap();
    }

    #[test]
    fn clean_model_passes() {
        let mut model = Model::default();
        let s = model.intern_surface(Sphere::new(Point3::origin(), 1.0).unwrap()).unwrap();
        add(&mut model, 1, &s.flipped().to_string());
        add(&mut model, 2, &format!("{s} #1"));
        ValidateObjectSurfaceMap::new().execute(&model).unwrap();
    }

    #[test]
    fn every_dangling_leaf_is_listed() {
        let mut model = Model::default();
        model.intern_surface(Sphere::new(Point3::origin(), 1.0).unwrap()).unwrap();
        add(&mut model, 1, "-1 5");
        add(&mut model, 2, "1 -6 : 5");
        let err = ValidateObjectSurfaceMap::new().execute(&model).unwrap_err();
        assert!(err.is_fatal());
        let HalfspaceError::Consistency(ConsistencyError::DanglingSurfaceReference { references }) =
            err
        else {
            panic!("expected dangling references, got {err:?}");
        };
        let found: Vec<(u32, i32)> = references
            .iter()
            .map(|r| (r.cell.get(), r.surface.get()))
            .collect();
        assert_eq!(found, vec![(1, 5), (2, -6), (2, 5)]);
    }

    #[test]
    fn placeholder_to_missing_cell_is_reported() {
        let mut model = Model::default();
        model.intern_surface(Sphere::new(Point3::origin(), 1.0).unwrap()).unwrap();
        add(&mut model, 1, "-1 #9");
        assert!(ValidateObjectSurfaceMap::new().execute(&model).is_err());
    }
}
