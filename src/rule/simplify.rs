use crate::error::ExpressionError;

use super::Rule;

/// Brings a rule into canonical form.
///
/// - complements are pushed down to the leaves (De Morgan), so
///   `Complement(Complement(x))` becomes `x` and `#(s)` becomes `-s`;
///   only `#N` placeholders keep a complement wrapper;
/// - nested groups of the same kind are flattened;
/// - duplicate children are removed, keeping the first occurrence;
/// - groups with a single child collapse into it.
///
/// Child order is otherwise preserved, so the result is deterministic and
/// `simplify(simplify(r)) == simplify(r)`.
///
/// # Errors
///
/// Returns [`ExpressionError::DegenerateRegion`] if any group has no
/// children.
pub fn simplify(rule: Rule) -> Result<Rule, ExpressionError> {
    normalize(rule, false)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum GroupKind {
    Intersection,
    Union,
}

impl GroupKind {
    fn dual(self) -> Self {
        match self {
            Self::Intersection => Self::Union,
            Self::Union => Self::Intersection,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Intersection => "intersection",
            Self::Union => "union",
        }
    }
}

fn normalize(rule: Rule, negate: bool) -> Result<Rule, ExpressionError> {
    match rule {
        Rule::Surface(s) => Ok(Rule::Surface(if negate { s.flipped() } else { s })),
        Rule::CellComplement(cell) => Ok(if negate {
            Rule::Complement(Box::new(Rule::CellComplement(cell)))
        } else {
            Rule::CellComplement(cell)
        }),
        Rule::Complement(inner) => normalize(*inner, !negate),
        Rule::Intersection(children) => group(GroupKind::Intersection, children, negate),
        Rule::Union(children) => group(GroupKind::Union, children, negate),
    }
}

fn group(kind: GroupKind, children: Vec<Rule>, negate: bool) -> Result<Rule, ExpressionError> {
    if children.is_empty() {
        return Err(ExpressionError::DegenerateRegion(format!(
            "{} with no children",
            kind.name()
        )));
    }
    let kind = if negate { kind.dual() } else { kind };

    let mut flat: Vec<Rule> = Vec::with_capacity(children.len());
    for child in children {
        match (kind, normalize(child, negate)?) {
            (GroupKind::Intersection, Rule::Intersection(grand))
            | (GroupKind::Union, Rule::Union(grand)) => {
                for g in grand {
                    push_unique(&mut flat, g);
                }
            }
            (_, other) => push_unique(&mut flat, other),
        }
    }

    if flat.len() == 1 {
        return Ok(flat.remove(0));
    }
    Ok(match kind {
        GroupKind::Intersection => Rule::Intersection(flat),
        GroupKind::Union => Rule::Union(flat),
    })
}

fn push_unique(children: &mut Vec<Rule>, rule: Rule) {
    if !children.contains(&rule) {
        children.push(rule);
    }
}
