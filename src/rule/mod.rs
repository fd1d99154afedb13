//! Boolean region expressions over signed surface references.
//!
//! A [`Rule`] is a plain owned tree. Edits build a new tree, so two
//! [`HeadRule`]s never alias each other's nodes.

mod display;
mod head_rule;
mod parse;
mod simplify;

pub use head_rule::HeadRule;
pub use simplify::simplify;

use crate::geometry::Surface;
use crate::math::Point3;
use crate::registry::{CellId, SignedSurf, SurfId};

/// A region of space built from half-spaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Rule {
    /// One side of a surface.
    Surface(SignedSurf),
    /// Points inside every child.
    Intersection(Vec<Rule>),
    /// Points inside any child.
    Union(Vec<Rule>),
    /// Points outside the child.
    Complement(Box<Rule>),
    /// Points outside cell `N`, written `#N`. Stays symbolic until the
    /// complement resolution pass substitutes the cell's region.
    CellComplement(CellId),
}

impl Rule {
    /// Leaf referencing one side of a surface.
    #[must_use]
    pub fn surface(surface: SignedSurf) -> Self {
        Self::Surface(surface)
    }

    /// Intersection of two rules, simplified.
    ///
    /// # Errors
    ///
    /// Returns an error if either operand contains an empty group.
    pub fn intersect(a: Self, b: Self) -> Result<Self, crate::error::ExpressionError> {
        simplify(Self::Intersection(vec![a, b]))
    }

    /// Union of two rules, simplified.
    ///
    /// # Errors
    ///
    /// Returns an error if either operand contains an empty group.
    pub fn union_of(a: Self, b: Self) -> Result<Self, crate::error::ExpressionError> {
        simplify(Self::Union(vec![a, b]))
    }

    /// Complement of a rule, simplified.
    ///
    /// # Errors
    ///
    /// Returns an error if the operand contains an empty group.
    pub fn complement_of(a: Self) -> Result<Self, crate::error::ExpressionError> {
        simplify(Self::Complement(Box::new(a)))
    }

    /// Calls `f` on every surface leaf, front to back.
    pub fn for_each_surface(&self, f: &mut impl FnMut(SignedSurf)) {
        match self {
            Self::Surface(s) => f(*s),
            Self::Intersection(children) | Self::Union(children) => {
                for child in children {
                    child.for_each_surface(f);
                }
            }
            Self::Complement(inner) => inner.for_each_surface(f),
            Self::CellComplement(_) => {}
        }
    }

    /// Calls `f` on every `#N` placeholder, front to back.
    pub fn for_each_cell_complement(&self, f: &mut impl FnMut(CellId)) {
        match self {
            Self::CellComplement(cell) => f(*cell),
            Self::Intersection(children) | Self::Union(children) => {
                for child in children {
                    child.for_each_cell_complement(f);
                }
            }
            Self::Complement(inner) => inner.for_each_cell_complement(f),
            Self::Surface(_) => {}
        }
    }

    /// Returns the first surface leaf in front-to-back order.
    #[must_use]
    pub fn first_surface(&self) -> Option<SignedSurf> {
        match self {
            Self::Surface(s) => Some(*s),
            Self::Intersection(children) | Self::Union(children) => {
                children.iter().find_map(Self::first_surface)
            }
            Self::Complement(inner) => inner.first_surface(),
            Self::CellComplement(_) => None,
        }
    }

    /// Rebuilds the tree with every surface leaf passed through `f`.
    #[must_use]
    pub fn map_surfaces(&self, f: &impl Fn(SignedSurf) -> SignedSurf) -> Self {
        match self {
            Self::Surface(s) => Self::Surface(f(*s)),
            Self::Intersection(children) => {
                Self::Intersection(children.iter().map(|c| c.map_surfaces(f)).collect())
            }
            Self::Union(children) => {
                Self::Union(children.iter().map(|c| c.map_surfaces(f)).collect())
            }
            Self::Complement(inner) => Self::Complement(Box::new(inner.map_surfaces(f))),
            Self::CellComplement(cell) => Self::CellComplement(*cell),
        }
    }

    /// Rebuilds the tree with every `#N` placeholder passed through `f`.
    #[must_use]
    pub fn map_cells(&self, f: &impl Fn(CellId) -> CellId) -> Self {
        match self {
            Self::Surface(s) => Self::Surface(*s),
            Self::Intersection(children) => {
                Self::Intersection(children.iter().map(|c| c.map_cells(f)).collect())
            }
            Self::Union(children) => Self::Union(children.iter().map(|c| c.map_cells(f)).collect()),
            Self::Complement(inner) => Self::Complement(Box::new(inner.map_cells(f))),
            Self::CellComplement(cell) => Self::CellComplement(f(*cell)),
        }
    }

    /// Replaces every `#N` placeholder with the rule `f` returns for it.
    ///
    /// The replacement is inserted as-is; callers decide whether it should
    /// already be complemented.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `f`.
    pub fn try_expand_cells<E>(
        &self,
        f: &mut impl FnMut(CellId) -> Result<Self, E>,
    ) -> Result<Self, E> {
        Ok(match self {
            Self::Surface(s) => Self::Surface(*s),
            Self::Intersection(children) => Self::Intersection(
                children
                    .iter()
                    .map(|c| c.try_expand_cells(f))
                    .collect::<Result<_, _>>()?,
            ),
            Self::Union(children) => Self::Union(
                children
                    .iter()
                    .map(|c| c.try_expand_cells(f))
                    .collect::<Result<_, _>>()?,
            ),
            Self::Complement(inner) => Self::Complement(Box::new(inner.try_expand_cells(f)?)),
            Self::CellComplement(cell) => f(*cell)?,
        })
    }

    /// Removes every leaf on surface `id`, returning `None` if nothing is left.
    ///
    /// Groups left with a single child collapse into it.
    #[must_use]
    pub fn without_surface(&self, id: SurfId) -> Option<Self> {
        match self {
            Self::Surface(s) => (s.id() != id).then_some(Self::Surface(*s)),
            Self::Intersection(children) => {
                Self::rebuild(children, id, Self::Intersection)
            }
            Self::Union(children) => Self::rebuild(children, id, Self::Union),
            Self::Complement(inner) => inner
                .without_surface(id)
                .map(|r| Self::Complement(Box::new(r))),
            Self::CellComplement(cell) => Some(Self::CellComplement(*cell)),
        }
    }

    fn rebuild(children: &[Self], id: SurfId, wrap: fn(Vec<Self>) -> Self) -> Option<Self> {
        let mut kept: Vec<Self> = children
            .iter()
            .filter_map(|c| c.without_surface(id))
            .collect();
        match kept.len() {
            0 => None,
            1 => kept.pop(),
            _ => Some(wrap(kept)),
        }
    }

    /// Tests whether `point` lies inside the region.
    ///
    /// Returns `None` if a surface cannot be looked up or the rule still
    /// holds a `#N` placeholder.
    pub fn contains<'a>(
        &self,
        point: &Point3,
        lookup: &impl Fn(SurfId) -> Option<&'a Surface>,
    ) -> Option<bool> {
        match self {
            Self::Surface(s) => {
                let surface = lookup(s.id())?;
                Some(surface.is_positive_side(point) == s.is_positive())
            }
            Self::Intersection(children) => {
                for child in children {
                    if !child.contains(point, lookup)? {
                        return Some(false);
                    }
                }
                Some(true)
            }
            Self::Union(children) => {
                for child in children {
                    if child.contains(point, lookup)? {
                        return Some(true);
                    }
                }
                Some(false)
            }
            Self::Complement(inner) => inner.contains(point, lookup).map(|inside| !inside),
            Self::CellComplement(_) => None,
        }
    }
}
