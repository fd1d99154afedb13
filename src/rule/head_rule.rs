use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::fmt;

use crate::error::ExpressionError;
use crate::geometry::Surface;
use crate::math::Point3;
use crate::registry::{CellId, SignedSurf, SurfId};

use super::parse::parse_region;
use super::{simplify, Rule};

/// The region of one cell or boundary.
///
/// Wraps an optional simplified [`Rule`] (absent while the region is still
/// being composed) and lazily caches its text and primary surface. Every
/// edit drops both caches.
#[derive(Debug, Clone, Default)]
pub struct HeadRule {
    rule: Option<Rule>,
    text: OnceCell<String>,
    primary: OnceCell<Option<SignedSurf>>,
}

impl HeadRule {
    /// Creates an empty head rule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps `rule` after simplifying it.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule contains an empty group.
    pub fn from_rule(rule: Rule) -> Result<Self, ExpressionError> {
        let mut head = Self::new();
        head.set(Some(simplify(rule)?));
        Ok(head)
    }

    /// Parses a region expression. Whitespace-only input gives an empty
    /// head rule.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is malformed or holds an empty group.
    pub fn parse(text: &str) -> Result<Self, ExpressionError> {
        let mut head = Self::new();
        head.set(parse_region(text)?.map(simplify).transpose()?);
        Ok(head)
    }

    /// Returns the wrapped rule, if any.
    #[must_use]
    pub fn rule(&self) -> Option<&Rule> {
        self.rule.as_ref()
    }

    /// Returns `true` if no region has been composed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rule.is_none()
    }

    fn set(&mut self, rule: Option<Rule>) {
        self.rule = rule;
        self.text = OnceCell::new();
        self.primary = OnceCell::new();
    }

    fn combine(
        &mut self,
        other: Rule,
        wrap: fn(Vec<Rule>) -> Rule,
    ) -> Result<(), ExpressionError> {
        let combined = match &self.rule {
            Some(current) => wrap(vec![current.clone(), other]),
            None => other,
        };
        let rule = simplify(combined)?;
        self.set(Some(rule));
        Ok(())
    }

    /// Intersects the region with `rule`.
    ///
    /// # Errors
    ///
    /// Returns an error if `rule` contains an empty group; the region is
    /// unchanged.
    pub fn add_intersection(&mut self, rule: Rule) -> Result<(), ExpressionError> {
        self.combine(rule, Rule::Intersection)
    }

    /// Unites the region with `rule`.
    ///
    /// # Errors
    ///
    /// Returns an error if `rule` contains an empty group; the region is
    /// unchanged.
    pub fn add_union(&mut self, rule: Rule) -> Result<(), ExpressionError> {
        self.combine(rule, Rule::Union)
    }

    /// Parses `text` and intersects it with the region.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is malformed; the region is unchanged.
    pub fn add_intersect_string(&mut self, text: &str) -> Result<(), ExpressionError> {
        match parse_region(text)? {
            Some(rule) => self.add_intersection(rule),
            None => Ok(()),
        }
    }

    /// Parses `text` and unites it with the region.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is malformed; the region is unchanged.
    pub fn add_union_string(&mut self, text: &str) -> Result<(), ExpressionError> {
        match parse_region(text)? {
            Some(rule) => self.add_union(rule),
            None => Ok(()),
        }
    }

    /// Returns a new head rule for everything outside this region.
    ///
    /// # Errors
    ///
    /// Returns [`ExpressionError::DegenerateRegion`] if the region is empty.
    pub fn complement(&self) -> Result<Self, ExpressionError> {
        let rule = self
            .rule
            .clone()
            .ok_or_else(|| ExpressionError::DegenerateRegion("complement of an empty region".into()))?;
        Self::from_rule(Rule::Complement(Box::new(rule)))
    }

    /// Replaces the region with its complement.
    ///
    /// # Errors
    ///
    /// Returns [`ExpressionError::DegenerateRegion`] if the region is empty.
    pub fn make_complement(&mut self) -> Result<(), ExpressionError> {
        *self = self.complement()?;
        Ok(())
    }

    /// Returns the first surface reached front to back.
    ///
    /// Neighbouring components use this as "the" bounding surface of the
    /// region.
    #[must_use]
    pub fn primary_surface(&self) -> Option<SignedSurf> {
        *self
            .primary
            .get_or_init(|| self.rule.as_ref().and_then(Rule::first_surface))
    }

    /// Returns the region as a token string (empty for an empty region).
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.text.get_or_init(|| {
            self.rule
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default()
        })
    }

    /// Returns the distinct surfaces referenced, ignoring sense.
    #[must_use]
    pub fn surfaces(&self) -> BTreeSet<SurfId> {
        let mut out = BTreeSet::new();
        if let Some(rule) = &self.rule {
            rule.for_each_surface(&mut |s| {
                out.insert(s.id());
            });
        }
        out
    }

    /// Returns the distinct signed references in first-seen order.
    #[must_use]
    pub fn signed_surfaces(&self) -> Vec<SignedSurf> {
        let mut out = Vec::new();
        if let Some(rule) = &self.rule {
            rule.for_each_surface(&mut |s| {
                if !out.contains(&s) {
                    out.push(s);
                }
            });
        }
        out
    }

    /// Returns `true` if any leaf references surface `id`.
    #[must_use]
    pub fn has_surface(&self, id: SurfId) -> bool {
        let mut found = false;
        if let Some(rule) = &self.rule {
            rule.for_each_surface(&mut |s| found |= s.id() == id);
        }
        found
    }

    /// Returns the cells referenced by `#N` placeholders.
    #[must_use]
    pub fn cell_complements(&self) -> BTreeSet<CellId> {
        let mut out = BTreeSet::new();
        if let Some(rule) = &self.rule {
            rule.for_each_cell_complement(&mut |c| {
                out.insert(c);
            });
        }
        out
    }

    /// Rewrites every surface leaf through `f` and re-simplifies.
    ///
    /// # Errors
    ///
    /// Returns an error only if the rewritten rule fails to simplify.
    pub fn map_surfaces(
        &mut self,
        f: &impl Fn(SignedSurf) -> SignedSurf,
    ) -> Result<(), ExpressionError> {
        if let Some(rule) = &self.rule {
            let mapped = simplify(rule.map_surfaces(f))?;
            self.set(Some(mapped));
        }
        Ok(())
    }

    /// Rewrites every `#N` placeholder through `f`.
    pub fn map_cells(&mut self, f: &impl Fn(CellId) -> CellId) {
        if let Some(rule) = &self.rule {
            let mapped = rule.map_cells(f);
            self.set(Some(mapped));
        }
    }

    /// Replaces every leaf on `old` by `new`.
    ///
    /// A negative `new` swaps the sense of the replaced leaves.
    ///
    /// # Errors
    ///
    /// Returns an error only if the rewritten rule fails to simplify.
    pub fn substitute_surface(&mut self, old: SurfId, new: SignedSurf) -> Result<(), ExpressionError> {
        self.map_surfaces(&|s| {
            if s.id() != old {
                s
            } else if new.is_positive() {
                s.with_id(new.id())
            } else {
                s.with_id(new.id()).flipped()
            }
        })
    }

    /// Replaces every `#old` placeholder by `#new`.
    pub fn substitute_cell(&mut self, old: CellId, new: CellId) {
        self.map_cells(&|c| if c == old { new } else { c });
    }

    /// Strips every leaf on surface `id`. Returns `true` if any was removed.
    ///
    /// Removing the last leaf leaves the head rule empty.
    pub fn remove_surface(&mut self, id: SurfId) -> bool {
        if !self.has_surface(id) {
            return false;
        }
        let stripped = self.rule.as_ref().and_then(|r| r.without_surface(id));
        let stripped = stripped.and_then(|r| simplify(r).ok());
        self.set(stripped);
        true
    }

    /// Tests whether `point` lies inside the region.
    ///
    /// An empty region contains nothing. Returns `None` if a surface is
    /// unknown to `lookup` or a `#N` placeholder is unresolved.
    pub fn contains<'a>(
        &self,
        point: &Point3,
        lookup: &impl Fn(SurfId) -> Option<&'a Surface>,
    ) -> Option<bool> {
        match &self.rule {
            Some(rule) => rule.contains(point, lookup),
            None => Some(false),
        }
    }

    /// Replaces the region with an already simplified rule.
    pub(crate) fn replace(&mut self, rule: Rule) {
        self.set(Some(rule));
    }
}

impl PartialEq for HeadRule {
    fn eq(&self, other: &Self) -> bool {
        self.rule == other.rule
    }
}

impl fmt::Display for HeadRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn surf(v: i32) -> SignedSurf {
        SignedSurf::new(v).unwrap()
    }

    #[test]
    fn built_incrementally() {
        let mut h = HeadRule::new();
        assert!(h.is_empty());
        assert_eq!(h.as_str(), "");
        h.add_intersect_string("1 -2").unwrap();
        h.add_intersect_string("3 -4").unwrap();
        assert_eq!(h.as_str(), "1 -2 3 -4");
        h.add_union_string("10").unwrap();
        assert_eq!(h.as_str(), "1 -2 3 -4 : 10");
    }

    #[test]
    fn caches_are_invalidated_on_edit() {
        let mut h = HeadRule::parse("5 6").unwrap();
        assert_eq!(h.primary_surface(), Some(surf(5)));
        assert_eq!(h.as_str(), "5 6");
        h.substitute_surface(SurfId::new(5).unwrap(), surf(-50)).unwrap();
        assert_eq!(h.primary_surface(), Some(surf(-50)));
        assert_eq!(h.as_str(), "-50 6");
    }

    #[test]
    fn malformed_text_leaves_region_unchanged() {
        let mut h = HeadRule::parse("1 2").unwrap();
        assert!(h.add_intersect_string("3 (4").is_err());
        assert_eq!(h.as_str(), "1 2");
    }

    #[test]
    fn empty_group_leaves_region_unchanged() {
        let mut h = HeadRule::parse("1 -2").unwrap();
        let empty = Rule::Union(vec![Rule::Surface(surf(3)), Rule::Intersection(Vec::new())]);
        assert!(matches!(
            h.add_intersection(empty.clone()),
            Err(ExpressionError::DegenerateRegion(_))
        ));
        assert_eq!(h.as_str(), "1 -2");
        assert!(h.add_union(empty).is_err());
        assert_eq!(h.as_str(), "1 -2");
        assert_eq!(h.primary_surface(), Some(surf(1)));

        let mut blank = HeadRule::new();
        assert!(blank.add_intersection(Rule::Union(Vec::new())).is_err());
        assert!(blank.is_empty());
    }

    #[test]
    fn complement_is_simplified() {
        let h = HeadRule::parse("1 -2 (3 : 4)").unwrap();
        let c = h.complement().unwrap();
        assert_eq!(c.as_str(), "-1 : 2 : -3 -4");
        assert_eq!(c.complement().unwrap(), h);
        assert!(HeadRule::new().complement().is_err());
    }

    #[test]
    fn make_complement_in_place() {
        let mut h = HeadRule::parse("-7").unwrap();
        h.make_complement().unwrap();
        assert_eq!(h.as_str(), "7");
    }

    #[test]
    fn surface_queries() {
        let h = HeadRule::parse("3 -1 (2 : -3) #8").unwrap();
        let ids: Vec<u32> = h.surfaces().into_iter().map(SurfId::get).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(h.signed_surfaces(), vec![surf(3), surf(-1), surf(2), surf(-3)]);
        assert!(h.has_surface(SurfId::new(2).unwrap()));
        assert!(!h.has_surface(SurfId::new(8).unwrap()));
        assert_eq!(h.cell_complements().len(), 1);
    }

    #[test]
    fn substitution_merges_duplicates() {
        let mut h = HeadRule::parse("1 2 -3").unwrap();
        h.substitute_surface(SurfId::new(2).unwrap(), surf(1)).unwrap();
        assert_eq!(h.as_str(), "1 -3");
    }

    #[test]
    fn negative_substitution_flips_sense() {
        let mut h = HeadRule::parse("4 : -4 9").unwrap();
        h.substitute_surface(SurfId::new(4).unwrap(), surf(-6)).unwrap();
        assert_eq!(h.as_str(), "-6 : 6 9");
    }

    #[test]
    fn remove_surface_strips_leaves() {
        let mut h = HeadRule::parse("1 -2 3").unwrap();
        assert!(h.remove_surface(SurfId::new(2).unwrap()));
        assert_eq!(h.as_str(), "1 3");
        assert!(!h.remove_surface(SurfId::new(2).unwrap()));
        let mut single = HeadRule::parse("7").unwrap();
        single.remove_surface(SurfId::new(7).unwrap());
        assert!(single.is_empty());
    }

    #[test]
    fn cell_substitution() {
        let mut h = HeadRule::parse("1 #2").unwrap();
        h.substitute_cell(CellId::new(2).unwrap(), CellId::new(20).unwrap());
        assert_eq!(h.as_str(), "1 #20");
    }
}
