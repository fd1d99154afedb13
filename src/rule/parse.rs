use std::str::FromStr;

use pest::error::InputLocation;
use pest::iterators::Pair;
use pest::Parser;

use crate::error::ExpressionError;
use crate::registry::{CellId, SignedSurf};

use super::Rule;

mod grammar {
    #[derive(pest_derive::Parser)]
    #[grammar = "rule/region.pest"]
    pub(super) struct RegionParser;
}

use grammar::{RegionParser, Rule as Token};

/// Parses a region expression without simplifying it.
///
/// Returns `Ok(None)` for an input holding only whitespace.
pub(crate) fn parse_region(text: &str) -> Result<Option<Rule>, ExpressionError> {
    let mut pairs =
        RegionParser::parse(Token::region, text).map_err(|e| from_pest(text, &e))?;
    let Some(region) = pairs.next() else {
        return Ok(None);
    };
    region
        .into_inner()
        .find(|p| p.as_rule() == Token::union)
        .map(|p| build_union(text, p))
        .transpose()
}

impl FromStr for Rule {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_region(s)?
            .ok_or_else(|| ExpressionError::DegenerateRegion("empty expression".into()))
    }
}

fn from_pest(text: &str, err: &pest::error::Error<Token>) -> ExpressionError {
    let position = match err.location {
        InputLocation::Pos(p) | InputLocation::Span((p, _)) => p,
    };
    ExpressionError::Malformed {
        expression: text.to_owned(),
        position,
        reason: err.variant.message().into_owned(),
    }
}

fn malformed(text: &str, pair: &Pair<'_, Token>, reason: String) -> ExpressionError {
    ExpressionError::Malformed {
        expression: text.to_owned(),
        position: pair.as_span().start(),
        reason,
    }
}

fn build_union(text: &str, pair: Pair<'_, Token>) -> Result<Rule, ExpressionError> {
    let mut children = pair
        .into_inner()
        .map(|p| build_intersection(text, p))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(if children.len() == 1 {
        children.remove(0)
    } else {
        Rule::Union(children)
    })
}

fn build_intersection(text: &str, pair: Pair<'_, Token>) -> Result<Rule, ExpressionError> {
    let mut children = pair
        .into_inner()
        .map(|p| build_factor(text, p))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(if children.len() == 1 {
        children.remove(0)
    } else {
        Rule::Intersection(children)
    })
}

fn build_factor(text: &str, pair: Pair<'_, Token>) -> Result<Rule, ExpressionError> {
    match pair.as_rule() {
        Token::surface => {
            let value = pair
                .as_str()
                .parse::<i32>()
                .ok()
                .and_then(SignedSurf::new)
                .ok_or_else(|| {
                    malformed(text, &pair, format!("`{}` is not a surface number", pair.as_str()))
                })?;
            Ok(Rule::Surface(value))
        }
        Token::cell_ref => {
            let digits = pair.as_str().trim_start_matches('#');
            let cell = digits
                .parse::<u32>()
                .ok()
                .and_then(CellId::new)
                .ok_or_else(|| {
                    malformed(text, &pair, format!("`{}` is not a cell number", pair.as_str()))
                })?;
            Ok(Rule::CellComplement(cell))
        }
        Token::group => build_group(text, pair),
        Token::complement => {
            let span_pair = pair.clone();
            let group = pair
                .into_inner()
                .next()
                .ok_or_else(|| malformed(text, &span_pair, "complement without a group".into()))?;
            Ok(Rule::Complement(Box::new(build_group(text, group)?)))
        }
        other => Err(malformed(text, &pair, format!("unexpected {other:?}"))),
    }
}

fn build_group(text: &str, pair: Pair<'_, Token>) -> Result<Rule, ExpressionError> {
    let start = pair.as_span().start();
    match pair.into_inner().next() {
        Some(union) => build_union(text, union),
        None => Err(ExpressionError::DegenerateRegion(format!(
            "empty parentheses at offset {start} in `{text}`"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn leaf(v: i32) -> Rule {
        Rule::Surface(SignedSurf::new(v).unwrap())
    }

    #[test]
    fn union_of_two_leaves() {
        let r: Rule = "-5 : 6".parse().unwrap();
        assert_eq!(r, Rule::Union(vec![leaf(-5), leaf(6)]));
    }

    #[test]
    fn implicit_intersection() {
        let r: Rule = "1 -2 +3".parse().unwrap();
        assert_eq!(r, Rule::Intersection(vec![leaf(1), leaf(-2), leaf(3)]));
    }

    #[test]
    fn grouping_and_precedence() {
        let r: Rule = "1 2 : (3 : 4) 5".parse().unwrap();
        assert_eq!(
            r,
            Rule::Union(vec![
                Rule::Intersection(vec![leaf(1), leaf(2)]),
                Rule::Intersection(vec![Rule::Union(vec![leaf(3), leaf(4)]), leaf(5)]),
            ])
        );
    }

    #[test]
    fn complement_forms() {
        let a: Rule = "#(1 2)".parse().unwrap();
        let b: Rule = "-(1 2)".parse().unwrap();
        assert_eq!(a, b);
        let c: Rule = "#12".parse().unwrap();
        assert_eq!(c, Rule::CellComplement(CellId::new(12).unwrap()));
    }

    #[test]
    fn whitespace_only_is_empty() {
        assert!(parse_region("   ").unwrap().is_none());
        assert!(matches!(
            "".parse::<Rule>(),
            Err(ExpressionError::DegenerateRegion(_))
        ));
    }

    #[test]
    fn unbalanced_parentheses() {
        assert!(matches!(
            "(1 2".parse::<Rule>(),
            Err(ExpressionError::Malformed { .. })
        ));
        assert!(matches!(
            "1 2)".parse::<Rule>(),
            Err(ExpressionError::Malformed { .. })
        ));
    }

    #[test]
    fn bad_tokens() {
        let err = "1 abc".parse::<Rule>().unwrap_err();
        let ExpressionError::Malformed { position, .. } = err else {
            panic!("expected malformed, got {err:?}");
        };
        assert_eq!(position, 2);
        assert!(matches!(
            "1 -0".parse::<Rule>(),
            Err(ExpressionError::Malformed { .. })
        ));
        assert!(matches!(
            "99999999999".parse::<Rule>(),
            Err(ExpressionError::Malformed { .. })
        ));
        assert!(matches!(
            "#0".parse::<Rule>(),
            Err(ExpressionError::Malformed { .. })
        ));
    }

    #[test]
    fn empty_group_is_degenerate() {
        assert!(matches!(
            "1 ()".parse::<Rule>(),
            Err(ExpressionError::DegenerateRegion(_))
        ));
    }
}
