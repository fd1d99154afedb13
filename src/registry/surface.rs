use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::error::RegistryError;
use crate::geometry::{Orientation, Surface};

use super::{Renumbering, SignedSurf, SurfId};

/// Owner of every unique surface in a build.
///
/// Surfaces are deduplicated geometrically: interning a surface equal
/// (within the tolerance) to one already held returns the existing number,
/// negated if the candidate's positive side is the existing one's negative
/// side.
#[derive(Debug, Clone)]
pub struct SurfaceRegister {
    surfaces: BTreeMap<SurfId, Surface>,
    aliases: BTreeMap<SurfId, SignedSurf>,
    first: u32,
    next: u32,
    tolerance: f64,
}

impl SurfaceRegister {
    /// Creates an empty register that numbers from `first`.
    #[must_use]
    pub fn new(first: u32, tolerance: f64) -> Self {
        let first = first.max(1);
        Self {
            surfaces: BTreeMap::new(),
            aliases: BTreeMap::new(),
            first,
            next: first,
            tolerance,
        }
    }

    /// Returns the dedup tolerance.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Finds a held surface geometrically equal to `candidate`.
    ///
    /// The lowest matching number wins.
    #[must_use]
    pub fn find_equal(&self, candidate: &Surface) -> Option<SignedSurf> {
        let kind = candidate.kind();
        self.surfaces
            .iter()
            .filter(|(_, s)| s.kind() == kind)
            .find_map(|(id, s)| {
                s.matches(candidate, self.tolerance).map(|o| match o {
                    Orientation::Same => id.positive(),
                    Orientation::Flipped => id.negative(),
                })
            })
    }

    /// Interns `candidate` under the next free number, or returns the
    /// number of an equal surface already held.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NumberSpaceExhausted`] if no number is left.
    pub fn intern(&mut self, candidate: Surface) -> Result<SignedSurf, RegistryError> {
        if let Some(existing) = self.find_equal(&candidate) {
            debug!(surface = %existing, "reusing equal surface");
            return Ok(existing);
        }
        let id = self.next_free()?;
        self.surfaces.insert(id, candidate);
        Ok(id.positive())
    }

    /// Interns `candidate` under the number a component asked for.
    ///
    /// If an equal surface is already held under another number, that
    /// number is returned and `requested` becomes an alias for it, so
    /// region strings written with `requested` resolve through
    /// [`SurfaceRegister::resolve`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::SurfaceNumberInUse`] if `requested` already
    /// names a different surface.
    pub fn intern_numbered(
        &mut self,
        requested: SurfId,
        candidate: Surface,
    ) -> Result<SignedSurf, RegistryError> {
        if let Some(held) = self.surfaces.get(&requested) {
            return match held.matches(&candidate, self.tolerance) {
                Some(Orientation::Same) => Ok(requested.positive()),
                Some(Orientation::Flipped) => Ok(requested.negative()),
                None => Err(RegistryError::SurfaceNumberInUse(requested)),
            };
        }
        let existing = self.find_equal(&candidate);
        if let Some(alias) = self.aliases.get(&requested) {
            return match existing {
                Some(e) if e.id() == alias.id() => Ok(e),
                _ => Err(RegistryError::SurfaceNumberInUse(requested)),
            };
        }
        if let Some(existing) = existing {
            debug!(requested = %requested, surface = %existing, "aliasing equal surface");
            self.aliases.insert(requested, existing);
            return Ok(existing);
        }
        self.surfaces.insert(requested, candidate);
        Ok(requested.positive())
    }

    fn next_free(&mut self) -> Result<SurfId, RegistryError> {
        loop {
            let id = SurfId::new(self.next).ok_or(RegistryError::NumberSpaceExhausted)?;
            self.next = self
                .next
                .checked_add(1)
                .ok_or(RegistryError::NumberSpaceExhausted)?;
            if !self.surfaces.contains_key(&id) && !self.aliases.contains_key(&id) {
                return Ok(id);
            }
        }
    }

    /// Maps a reference through the alias table, keeping its sense.
    #[must_use]
    pub fn resolve(&self, surface: SignedSurf) -> SignedSurf {
        match self.aliases.get(&surface.id()) {
            Some(target) if surface.is_positive() => *target,
            Some(target) => target.flipped(),
            None => surface,
        }
    }

    /// Returns the surface held under `id`.
    #[must_use]
    pub fn get(&self, id: SurfId) -> Option<&Surface> {
        self.surfaces.get(&id)
    }

    /// Returns `true` if `id` names a held surface.
    #[must_use]
    pub fn contains(&self, id: SurfId) -> bool {
        self.surfaces.contains_key(&id)
    }

    /// Returns the number of held surfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    /// Returns `true` if no surface is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Iterates over held surfaces in number order.
    pub fn iter(&self) -> impl Iterator<Item = (SurfId, &Surface)> {
        self.surfaces.iter().map(|(id, s)| (*id, s))
    }

    /// Returns the set of held numbers.
    #[must_use]
    pub fn ids(&self) -> BTreeSet<SurfId> {
        self.surfaces.keys().copied().collect()
    }

    /// Deletes a surface. Callers must have checked it is unreferenced.
    pub(crate) fn remove(&mut self, id: SurfId) -> Option<Surface> {
        self.aliases.retain(|_, target| target.id() != id);
        self.surfaces.remove(&id)
    }

    /// Moves surfaces to their new numbers. Aliases belong to the build
    /// phase and are dropped.
    pub(crate) fn renumber(&mut self, renumbering: &Renumbering<SurfId>) {
        let surfaces = std::mem::take(&mut self.surfaces);
        self.surfaces = surfaces
            .into_iter()
            .map(|(id, s)| (renumbering.get(id), s))
            .collect();
        self.aliases.clear();
        let highest = self.surfaces.keys().next_back().map_or(0, |id| id.get());
        self.next = self.first.max(highest.saturating_add(1));
    }

    /// Clears all state.
    pub fn reset(&mut self) {
        self.surfaces.clear();
        self.aliases.clear();
        self.next = self.first;
    }
}
