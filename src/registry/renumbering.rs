use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use crate::error::RegistryError;

/// A validated old-to-new number mapping.
///
/// Every key exists in the renumbered domain, no two keys share a target,
/// and no target collides with a number that stays in place. Numbers not
/// in the mapping map to themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renumbering<K> {
    map: BTreeMap<K, K>,
}

impl<K: Ord + Copy + Display> Renumbering<K> {
    /// Validates `pairs` against the set of numbers currently in use.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NonBijective`] if the mapping is not a
    /// bijection on `in_use`.
    pub fn new(
        pairs: impl IntoIterator<Item = (K, K)>,
        in_use: &BTreeSet<K>,
    ) -> Result<Self, RegistryError> {
        let mut map = BTreeMap::new();
        for (old, new) in pairs {
            if !in_use.contains(&old) {
                return Err(RegistryError::NonBijective(format!("{old} is not in use")));
            }
            if let Some(previous) = map.insert(old, new) {
                if previous != new {
                    return Err(RegistryError::NonBijective(format!(
                        "{old} maps to both {previous} and {new}"
                    )));
                }
            }
        }
        let mut targets = BTreeSet::new();
        for (old, new) in &map {
            if !targets.insert(*new) {
                return Err(RegistryError::NonBijective(format!(
                    "{new} is the target of more than one number (including {old})"
                )));
            }
            if in_use.contains(new) && !map.contains_key(new) {
                return Err(RegistryError::NonBijective(format!(
                    "{old} -> {new} collides with an unmoved number"
                )));
            }
        }
        map.retain(|old, new| old != new);
        Ok(Self { map })
    }

    /// Returns the new number for `old`.
    #[must_use]
    pub fn get(&self, old: K) -> K {
        self.map.get(&old).copied().unwrap_or(old)
    }

    /// Returns `true` if nothing moves.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the number of moved entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if no entry moves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates over the moved `(old, new)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (K, K)> + '_ {
        self.map.iter().map(|(k, v)| (*k, *v))
    }
}
