use tracing::debug;

use crate::error::{ExpressionError, RegistryError, Result};
use crate::model::Model;
use crate::registry::{CellId, CellState};
use crate::rule::{simplify, Rule};

/// Subtracts the regions of other cells from a target cell.
///
/// The target's region becomes `A (#B) (#C) ...`. Repeating an insertion
/// adds nothing new, and insertion order does not change the region.
pub struct InsertObjects {
    target: CellId,
    inserted: Vec<CellId>,
    by_reference: bool,
}

impl InsertObjects {
    /// Creates an insertion of `inserted` into `target`.
    #[must_use]
    pub fn new(target: CellId, inserted: impl IntoIterator<Item = CellId>) -> Self {
        Self {
            target,
            inserted: inserted.into_iter().collect(),
            by_reference: false,
        }
    }

    /// Inserts `#N` placeholders instead of copying each region.
    ///
    /// The placeholders are substituted by
    /// [`RemoveComplements`](super::RemoveComplements), which also picks up
    /// later edits to the inserted cells.
    #[must_use]
    pub fn by_reference(mut self) -> Self {
        self.by_reference = true;
        self
    }

    /// Executes the insertion.
    ///
    /// # Errors
    ///
    /// Returns an error if any cell is unknown or has an empty region, the
    /// target is inserted into itself, or the target is past the insertion
    /// stage.
    pub fn execute(&self, model: &mut Model) -> Result<()> {
        let objects = model.objects();
        let target = objects
            .cell(self.target)
            .ok_or(RegistryError::UnknownCell(self.target))?;
        if !target.state().can_advance_to(CellState::Inserted) {
            return Err(RegistryError::InvalidTransition {
                cell: self.target,
                from: target.state(),
                to: CellState::Inserted,
            }
            .into());
        }
        let base = target.region().rule().cloned().ok_or_else(|| {
            ExpressionError::DegenerateRegion(format!("cell {} has no region", self.target))
        })?;

        let mut terms = vec![base];
        for &other in &self.inserted {
            if other == self.target {
                return Err(RegistryError::SelfInsertion(other).into());
            }
            let cell = objects
                .cell(other)
                .ok_or(RegistryError::UnknownCell(other))?;
            let rule = cell.region().rule().ok_or_else(|| {
                ExpressionError::DegenerateRegion(format!("cell {other} has no region"))
            })?;
            terms.push(if self.by_reference {
                Rule::CellComplement(other)
            } else {
                Rule::Complement(Box::new(rule.clone()))
            });
        }
        let rule = simplify(Rule::Intersection(terms))?;

        debug!(
            target = %self.target,
            inserted = self.inserted.len(),
            by_reference = self.by_reference,
            "inserted cells"
        );
        if let Some(cell) = model.objects_mut().cell_mut(self.target) {
            cell.region_mut().replace(rule);
        }
        model.advance(self.target, CellState::Inserted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::HalfspaceError;
    use crate::registry::CellData;
    use crate::rule::HeadRule;

    fn id(n: u32) -> CellId {
        CellId::new(n).unwrap()
    }

    fn model_with(cells: &[(u32, &str)]) -> Model {
        let mut model = Model::default();
        for (n, text) in cells {
            model
                .add_cell(id(*n), CellData::void(HeadRule::parse(text).unwrap()))
                .unwrap();
        }
        model
    }

    #[test]
    fn single_surface_cell_becomes_opposite_leaf() {
        let mut model = model_with(&[(1, "1 -2 3 -4 5 -6"), (2, "-102")]);
        InsertObjects::new(id(1), [id(2)]).execute(&mut model).unwrap();
        assert_eq!(
            model.cell_region_string(id(1)).unwrap(),
            "1 -2 3 -4 5 -6 102"
        );
        assert_eq!(model.cell(id(1)).unwrap().state(), CellState::Inserted);
    }

    #[test]
    fn repeated_insertion_is_idempotent() {
        let mut model = model_with(&[(1, "1 -2"), (2, "3 -4"), (3, "-7 : 8")]);
        InsertObjects::new(id(1), [id(2), id(3)]).execute(&mut model).unwrap();
        let once = model.cell_region_string(id(1)).unwrap();
        InsertObjects::new(id(1), [id(3), id(2)]).execute(&mut model).unwrap();
        assert_eq!(model.cell_region_string(id(1)).unwrap(), once);
        assert_eq!(once, "1 -2 (-3 : 4) 7 -8");
    }

    #[test]
    fn by_reference_inserts_placeholders() {
        let mut model = model_with(&[(1, "1 -2"), (2, "3 -4")]);
        InsertObjects::new(id(1), [id(2)])
            .by_reference()
            .execute(&mut model)
            .unwrap();
        assert_eq!(model.cell_region_string(id(1)).unwrap(), "1 -2 #2");
    }

    #[test]
    fn self_insertion_rejected() {
        let mut model = model_with(&[(1, "1")]);
        let err = InsertObjects::new(id(1), [id(1)]).execute(&mut model).unwrap_err();
        assert!(matches!(
            err,
            HalfspaceError::Registry(RegistryError::SelfInsertion(_))
        ));
    }

    #[test]
    fn unknown_and_empty_cells_rejected() {
        let mut model = model_with(&[(1, "1")]);
        assert!(InsertObjects::new(id(1), [id(9)]).execute(&mut model).is_err());
        model.add_cell(id(2), CellData::new(0, 0.0)).unwrap();
        let err = InsertObjects::new(id(1), [id(2)]).execute(&mut model).unwrap_err();
        assert!(matches!(
            err,
            HalfspaceError::Expression(ExpressionError::DegenerateRegion(_))
        ));
        assert_eq!(model.cell_region_string(id(1)).unwrap(), "1");
    }
}
