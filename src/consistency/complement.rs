use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::error::{ConsistencyError, ExpressionError, HalfspaceError, RegistryError, Result};
use crate::model::Model;
use crate::registry::{CellId, CellState, ObjectRegister};
use crate::rule::{simplify, Rule};

/// Substitutes every `#N` placeholder with the complement of cell `N`'s
/// region, recursively.
///
/// A placeholder chain that revisits a cell is a
/// [`ConsistencyError::CircularComplement`]. Nothing is modified unless
/// every cell resolves.
#[derive(Debug, Default)]
pub struct RemoveComplements;

impl RemoveComplements {
    /// Creates the pass.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the pass, returning the number of rewritten cells.
    ///
    /// Cells already resolved are left alone, so the pass may be rerun
    /// after adding cells.
    ///
    /// # Errors
    ///
    /// Returns an error on a cycle, on a placeholder naming a missing cell,
    /// or if a cell still has no region.
    pub fn execute(&self, model: &mut Model) -> Result<usize> {
        let objects = model.objects();
        let pending: Vec<CellId> = objects
            .iter()
            .filter(|(_, c)| c.state().is_editable())
            .map(|(id, _)| id)
            .collect();

        for &id in &pending {
            let state = objects.cell(id).map(|c| c.state());
            if let Some(from) = state.filter(|s| !s.can_advance_to(CellState::ComplementsResolved)) {
                return Err(RegistryError::InvalidTransition {
                    cell: id,
                    from,
                    to: CellState::ComplementsResolved,
                }
                .into());
            }
        }

        let mut memo = BTreeMap::new();
        let mut rewritten = Vec::new();
        for &id in &pending {
            let has_placeholders = objects
                .cell(id)
                .is_some_and(|c| !c.region().cell_complements().is_empty());
            if has_placeholders {
                let mut stack = Vec::new();
                let rule = resolve(objects, id, &mut memo, &mut stack)?;
                rewritten.push((id, rule));
            }
        }

        let count = rewritten.len();
        let objects = model.objects_mut();
        for (id, rule) in rewritten {
            debug!(cell = %id, "resolved complement placeholders");
            if let Some(cell) = objects.cell_mut(id) {
                cell.region_mut().replace(rule);
            }
        }
        for &id in &pending {
            model.advance(id, CellState::ComplementsResolved)?;
        }
        info!(cells = count, "complements resolved");
        Ok(count)
    }
}

fn resolve(
    objects: &ObjectRegister,
    id: CellId,
    memo: &mut BTreeMap<CellId, Rule>,
    stack: &mut Vec<CellId>,
) -> Result<Rule> {
    if let Some(rule) = memo.get(&id) {
        return Ok(rule.clone());
    }
    if let Some(pos) = stack.iter().position(|c| *c == id) {
        let mut chain = stack[pos..].to_vec();
        chain.push(id);
        return Err(ConsistencyError::CircularComplement { chain }.into());
    }
    let Some(cell) = objects.cell(id) else {
        let referrer = stack.last().copied().unwrap_or(id);
        return Err(ConsistencyError::UnresolvedComplement {
            cell: referrer,
            target: id,
        }
        .into());
    };
    let rule = cell.region().rule().ok_or_else(|| {
        ExpressionError::DegenerateRegion(format!("cell {id} has no region"))
    })?;

    stack.push(id);
    let expanded = rule.try_expand_cells(&mut |n| -> std::result::Result<Rule, HalfspaceError> {
        let inner = resolve(objects, n, memo, stack)?;
        Ok(Rule::Complement(Box::new(inner)))
    });
    stack.pop();

    let rule = simplify(expanded?)?;
    memo.insert(id, rule.clone());
    Ok(rule)
}
