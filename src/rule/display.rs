use std::fmt::{self, Display, Formatter};

use super::Rule;

// Intersection binds tighter than union, so a union inside an intersection
// needs parentheses. Same-kind nesting is parenthesized too, which keeps
// `parse(to_string(r)) == r` for unsimplified trees.

impl Display for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Surface(s) => write!(f, "{s}"),
            Self::CellComplement(cell) => write!(f, "#{cell}"),
            Self::Complement(inner) => write!(f, "#({inner})"),
            Self::Intersection(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    match child {
                        Self::Union(_) | Self::Intersection(_) => write!(f, "({child})")?,
                        _ => write!(f, "{child}")?,
                    }
                }
                Ok(())
            }
            Self::Union(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" : ")?;
                    }
                    match child {
                        Self::Union(_) => write!(f, "({child})")?,
                        _ => write!(f, "{child}")?,
                    }
                }
                Ok(())
            }
        }
    }
}
