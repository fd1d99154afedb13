use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::error::RegistryError;

use super::{CellData, CellId, Renumbering};

/// A contiguous block of cell numbers owned by one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    first: CellId,
    count: u32,
}

impl CellRange {
    /// Returns the first cell number.
    #[must_use]
    pub fn first(&self) -> CellId {
        self.first
    }

    /// Returns the number of cells in the block.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Returns the `index`-th cell of the block.
    #[must_use]
    pub fn get(&self, index: u32) -> Option<CellId> {
        if index < self.count {
            self.first.offset(index)
        } else {
            None
        }
    }

    /// Returns `true` if `cell` lies in the block.
    #[must_use]
    pub fn contains(&self, cell: CellId) -> bool {
        cell >= self.first && cell.get() - self.first.get() < self.count
    }

    /// Iterates over the block's numbers.
    pub fn iter(&self) -> impl Iterator<Item = CellId> + '_ {
        (0..self.count).filter_map(|i| self.first.offset(i))
    }
}

/// Owner of every cell, and of the component name to number-block map.
///
/// Components only ever hold cell numbers; the register holds the cells.
#[derive(Debug, Clone)]
pub struct ObjectRegister {
    cells: BTreeMap<CellId, CellData>,
    ranges: BTreeMap<String, CellRange>,
    /// Allocated number -> current number, for cells moved by renumbering.
    moved: BTreeMap<CellId, CellId>,
    overwritten: Vec<CellId>,
    first: u32,
    next: u32,
}

impl ObjectRegister {
    /// Creates an empty register that allocates from `first`.
    #[must_use]
    pub fn new(first: u32) -> Self {
        let first = first.max(1);
        Self {
            cells: BTreeMap::new(),
            ranges: BTreeMap::new(),
            moved: BTreeMap::new(),
            overwritten: Vec::new(),
            first,
            next: first,
        }
    }

    /// Reserves `count` consecutive cell numbers for component `name`.
    ///
    /// Blocks never overlap each other or cells added explicitly.
    ///
    /// # Errors
    ///
    /// Returns an error if the name already owns a block, `count` is zero,
    /// or the number space is exhausted.
    pub fn allocate_cell_range(
        &mut self,
        name: &str,
        count: u32,
    ) -> Result<CellRange, RegistryError> {
        if self.ranges.contains_key(name) {
            return Err(RegistryError::DuplicateComponent(name.to_owned()));
        }
        if count == 0 {
            return Err(RegistryError::NonBijective(format!(
                "component `{name}` asked for an empty cell range"
            )));
        }
        let mut start = self.next;
        loop {
            let first = CellId::new(start).ok_or(RegistryError::NumberSpaceExhausted)?;
            let end = start
                .checked_add(count)
                .ok_or(RegistryError::NumberSpaceExhausted)?;
            let taken = self
                .cells
                .range(first..)
                .next()
                .filter(|(id, _)| id.get() < end)
                .map(|(id, _)| id.get());
            match taken {
                Some(used) => {
                    start = used
                        .checked_add(1)
                        .ok_or(RegistryError::NumberSpaceExhausted)?;
                }
                None => {
                    let range = CellRange { first, count };
                    self.ranges.insert(name.to_owned(), range);
                    self.next = end;
                    return Ok(range);
                }
            }
        }
    }

    /// Returns the block allocated to `name`.
    #[must_use]
    pub fn cell_range(&self, name: &str) -> Option<CellRange> {
        self.ranges.get(name).copied()
    }

    /// Returns the current numbers of the live cells allocated to `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the component is unknown.
    pub fn component_cells(&self, name: &str) -> Result<Vec<CellId>, RegistryError> {
        let range = self
            .ranges
            .get(name)
            .ok_or_else(|| RegistryError::UnknownComponent(name.to_owned()))?;
        Ok(range
            .iter()
            .map(|allocated| self.moved.get(&allocated).copied().unwrap_or(allocated))
            .filter(|current| self.cells.contains_key(current))
            .collect())
    }

    /// Returns the component whose block `cell` was allocated from.
    #[must_use]
    pub fn owner(&self, cell: CellId) -> Option<&str> {
        let allocated = match self.moved.iter().find(|(_, current)| **current == cell) {
            Some((allocated, _)) => *allocated,
            // The block's own cell moved away from this number.
            None if self.moved.contains_key(&cell) => return None,
            None => cell,
        };
        self.ranges
            .iter()
            .find(|(_, r)| r.contains(allocated))
            .map(|(name, _)| name.as_str())
    }

    /// Stores a cell under `id`.
    ///
    /// An existing cell with the same number is overwritten; the number is
    /// logged and recorded in [`ObjectRegister::overwritten`]. Returns the
    /// replaced cell.
    pub fn add_cell(&mut self, id: CellId, cell: CellData) -> Option<CellData> {
        let old = self.cells.insert(id, cell);
        if old.is_some() {
            warn!(cell = %id, "duplicate cell number, older cell overwritten");
            self.overwritten.push(id);
        }
        old
    }

    /// Numbers that were defined more than once during the build.
    #[must_use]
    pub fn overwritten(&self) -> &[CellId] {
        &self.overwritten
    }

    /// Returns the cell stored under `id`.
    #[must_use]
    pub fn cell(&self, id: CellId) -> Option<&CellData> {
        self.cells.get(&id)
    }

    pub(crate) fn cell_mut(&mut self, id: CellId) -> Option<&mut CellData> {
        self.cells.get_mut(&id)
    }

    /// Returns `true` if a cell is stored under `id`.
    #[must_use]
    pub fn contains(&self, id: CellId) -> bool {
        self.cells.contains_key(&id)
    }

    /// Returns the number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if there are no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterates over cells in number order.
    pub fn iter(&self) -> impl Iterator<Item = (CellId, &CellData)> {
        self.cells.iter().map(|(id, c)| (*id, c))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (CellId, &mut CellData)> {
        self.cells.iter_mut().map(|(id, c)| (*id, c))
    }

    /// Returns the set of live cell numbers.
    #[must_use]
    pub fn ids(&self) -> BTreeSet<CellId> {
        self.cells.keys().copied().collect()
    }

    /// Moves cells to their new numbers and rewrites every `#N`
    /// placeholder to match.
    pub(crate) fn renumber(&mut self, renumbering: &Renumbering<CellId>) {
        let cells = std::mem::take(&mut self.cells);
        self.cells = cells
            .into_iter()
            .map(|(id, mut cell)| {
                cell.region_mut().map_cells(&|c| renumbering.get(c));
                (renumbering.get(id), cell)
            })
            .collect();

        let allocated: Vec<CellId> = self.ranges.values().flat_map(CellRange::iter).collect();
        for number in allocated {
            let current = self.moved.get(&number).copied().unwrap_or(number);
            let target = renumbering.get(current);
            if target == number {
                self.moved.remove(&number);
            } else {
                self.moved.insert(number, target);
            }
        }
        self.overwritten = self
            .overwritten
            .iter()
            .map(|c| renumbering.get(*c))
            .collect();
    }

    /// Clears all state.
    pub fn reset(&mut self) {
        self.cells.clear();
        self.ranges.clear();
        self.moved.clear();
        self.overwritten.clear();
        self.next = self.first;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::rule::HeadRule;

    fn cell(text: &str) -> CellData {
        CellData::void(HeadRule::parse(text).unwrap())
    }

    fn id(n: u32) -> CellId {
        CellId::new(n).unwrap()
    }

    #[test]
    fn ranges_do_not_collide() {
        let mut reg = ObjectRegister::new(1);
        let a = reg.allocate_cell_range("target", 3).unwrap();
        let b = reg.allocate_cell_range("moderator", 2).unwrap();
        assert_eq!(a.first().get(), 1);
        assert_eq!(b.first().get(), 4);
        assert!(a.contains(id(3)));
        assert!(!a.contains(id(4)));
        assert_eq!(a.get(3), None);
    }

    #[test]
    fn ranges_skip_explicit_cells() {
        let mut reg = ObjectRegister::new(1);
        reg.add_cell(id(2), cell("1"));
        let r = reg.allocate_cell_range("shield", 2).unwrap();
        assert_eq!(r.first().get(), 3);
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut reg = ObjectRegister::new(1);
        reg.allocate_cell_range("target", 1).unwrap();
        assert!(matches!(
            reg.allocate_cell_range("target", 1),
            Err(RegistryError::DuplicateComponent(_))
        ));
        assert!(reg.allocate_cell_range("empty", 0).is_err());
    }

    #[test]
    fn duplicate_cell_overwrites_and_is_recorded() {
        let mut reg = ObjectRegister::new(1);
        assert!(reg.add_cell(id(5), cell("1")).is_none());
        let old = reg.add_cell(id(5), cell("2")).unwrap();
        assert_eq!(old.region().as_str(), "1");
        assert_eq!(reg.cell(id(5)).unwrap().region().as_str(), "2");
        assert_eq!(reg.overwritten(), &[id(5)]);
    }

    #[test]
    fn component_cells_follow_renumbering() {
        let mut reg = ObjectRegister::new(1);
        let r = reg.allocate_cell_range("target", 2).unwrap();
        reg.add_cell(r.first(), cell("1"));
        reg.add_cell(r.get(1).unwrap(), cell("2 #1"));
        let map = Renumbering::new([(id(1), id(10)), (id(2), id(11))], &reg.ids()).unwrap();
        reg.renumber(&map);
        assert_eq!(reg.component_cells("target").unwrap(), vec![id(10), id(11)]);
        assert_eq!(reg.cell(id(11)).unwrap().region().as_str(), "2 #10");
        assert_eq!(reg.owner(id(10)), Some("target"));
        assert_eq!(reg.owner(id(1)), None);
    }

    #[test]
    fn reset_clears_ranges() {
        let mut reg = ObjectRegister::new(1);
        reg.allocate_cell_range("target", 4).unwrap();
        reg.reset();
        assert!(reg.cell_range("target").is_none());
        assert_eq!(reg.allocate_cell_range("target", 1).unwrap().first().get(), 1);
    }
}
