//! Raw syntax trees to canonical [`AstNode`]s.
//!
//! Every function here returns `anyhow::Result`; an `Err` means the input is
//! syntactically fine or not, but has no canonical form, and the caller turns
//! it into a `matchesAdvanced` node.

use anyhow::{Result, bail};
use sieve_syntax::{
    ComparisonOp, DateExpr, LocationExpr, NumberExpr, NumberLiteral, NumberTerm, Span,
    parse_date, parse_location, parse_number,
};

use crate::{
    TypeFamily,
    ast::{AstNode, BoundKind, LocationShape, NodeKind, Value},
};

pub(crate) fn normalize_number(input: &str) -> Result<AstNode> {
    let expr = parse_number(input)?;
    let normalizer = NumberNormalizer { input };
    let parts = match &expr {
        NumberExpr::List(parts) => parts.as_slice(),
        single => std::slice::from_ref(single),
    };
    let mut items = Vec::new();
    for part in parts {
        items.extend(normalizer.items(part, false)?);
    }
    let items = merge_equality_groups(gather_values(items, |negated| !negated));

    let mut root = match <[Item; 1]>::try_from(items) {
        Ok([item]) => item.into_node(false),
        Err(items) => AstNode::new(
            TypeFamily::Number,
            NodeKind::Composite {
                children: items.into_iter().map(|item| item.into_node(true)).collect(),
            },
            input,
        ),
    };
    root.source = input.to_string();
    Ok(root)
}

/// One entry of a comma list while it is being merged.
#[derive(Debug)]
enum Item {
    /// Equality leaves sharing one negation, each with its byte offset.
    Values {
        leaves: Vec<(usize, AstNode)>,
        negated: bool,
    },
    Clause(AstNode),
}

impl Item {
    // Inside a multi item list a single value stays wrapped so the list is
    // never mistaken for one equality group.
    fn into_node(self, in_list: bool) -> AstNode {
        match self {
            Item::Clause(node) => node,
            Item::Values {
                mut leaves,
                negated,
            } => {
                if leaves.len() == 1 && !in_list {
                    return leaves.remove(0).1;
                }
                let source = leaves
                    .iter()
                    .map(|(_, leaf)| leaf.source.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                let children = leaves.into_iter().map(|(_, leaf)| leaf).collect();
                AstNode::new(
                    TypeFamily::Number,
                    NodeKind::Composite {
                        children,
                    },
                    source,
                )
                .negate(negated)
            }
        }
    }
}

// Equality groups accepted by `gather` join the first such group, wherever
// they appear in the list.
fn gather_values(items: Vec<Item>, gather: impl Fn(bool) -> bool) -> Vec<Item> {
    let mut out: Vec<Item> = Vec::with_capacity(items.len());
    let mut group_at = None;
    for item in items {
        match item {
            Item::Values { leaves, negated } if gather(negated) => match group_at {
                Some(idx) => {
                    if let Some(Item::Values { leaves: group, .. }) = out.get_mut(idx) {
                        group.extend(leaves);
                    }
                }
                None => {
                    group_at = Some(out.len());
                    out.push(Item::Values { leaves, negated });
                }
            },
            other => out.push(other),
        }
    }
    out
}

// A list of exactly two equality groups reads as a single `is (not) a or b`
// group, negated as soon as either side was.
fn merge_equality_groups(items: Vec<Item>) -> Vec<Item> {
    match <[Item; 2]>::try_from(items) {
        Ok(
            [
                Item::Values {
                    leaves: mut all,
                    negated: a,
                },
                Item::Values {
                    leaves: rest,
                    negated: b,
                },
            ],
        ) => {
            let negated = a || b;
            all.extend(rest);
            all.sort_by_key(|(offset, _)| *offset);
            let leaves = all
                .into_iter()
                .map(|(offset, leaf)| (offset, leaf.negate(negated)))
                .collect();
            vec![Item::Values { leaves, negated }]
        }
        Ok(pair) => pair.into(),
        Err(items) => items,
    }
}

struct NumberNormalizer<'a> {
    input: &'a str,
}

impl NumberNormalizer<'_> {
    fn items(&self, expr: &NumberExpr, negated: bool) -> Result<Vec<Item>> {
        match expr {
            NumberExpr::Term(term, span) => self.term(term, *span, negated),
            NumberExpr::List(parts) => {
                let mut items = Vec::new();
                for part in parts {
                    items.extend(self.items(part, negated)?);
                }
                Ok(items)
            }
            NumberExpr::Not(inner, _) => {
                let items = self.items(inner, !negated)?;
                Ok(gather_values(items, |_| true))
            }
            NumberExpr::And(parts) => {
                let range = self.and(parts, expr.span(), negated)?;
                Ok(vec![Item::Clause(range)])
            }
            NumberExpr::Or(parts) => self.or(parts, expr.span(), negated),
        }
    }

    fn term(&self, term: &NumberTerm, span: Span, negated: bool) -> Result<Vec<Item>> {
        let source = span.slice(self.input);
        let clause = match term {
            NumberTerm::Value(value) => return Ok(vec![self.value(value, span, negated)]),
            NumberTerm::Comparison {
                op: ComparisonOp::Eq,
                value,
            } => return Ok(vec![self.value(value, span, negated)]),
            NumberTerm::Comparison {
                op: ComparisonOp::Ne,
                value,
            } => return Ok(vec![self.value(value, span, !negated)]),
            NumberTerm::Comparison { op, value } => one_sided(*op, value, source, negated)?,
            NumberTerm::Interval {
                low,
                high,
                low_closed,
                high_closed,
            } => self.bounded(
                low.as_ref(),
                high.as_ref(),
                *low_closed,
                *high_closed,
                source,
                negated,
            )?,
            NumberTerm::To { low, high } => {
                self.bounded(low.as_ref(), high.as_ref(), true, true, source, negated)?
            }
            NumberTerm::Null => {
                AstNode::new(TypeFamily::Number, NodeKind::NullCheck, source).negate(negated)
            }
        };
        Ok(vec![Item::Clause(clause)])
    }

    fn value(&self, value: &NumberLiteral, span: Span, negated: bool) -> Item {
        let leaf = AstNode::new(
            TypeFamily::Number,
            NodeKind::Comparison {
                op: ComparisonOp::Eq,
                value: Value::Number(value.clone()),
            },
            span.slice(self.input),
        )
        .negate(negated);
        Item::Values {
            leaves: vec![(span.start, leaf)],
            negated,
        }
    }

    // Intervals and `to` ranges: both ends make a range, one end makes a
    // plain comparison and the bracket on the missing side is irrelevant.
    fn bounded(
        &self,
        low: Option<&NumberLiteral>,
        high: Option<&NumberLiteral>,
        low_closed: bool,
        high_closed: bool,
        source: &str,
        negated: bool,
    ) -> Result<AstNode> {
        match (low, high) {
            (Some(low), Some(high)) => Ok(range(
                (low, low_closed),
                (high, high_closed),
                source,
                negated,
            )),
            (Some(low), None) => {
                let op = if low_closed {
                    ComparisonOp::Gte
                } else {
                    ComparisonOp::Gt
                };
                one_sided(op, low, source, negated)
            }
            (None, Some(high)) => {
                let op = if high_closed {
                    ComparisonOp::Lte
                } else {
                    ComparisonOp::Lt
                };
                one_sided(op, high, source, negated)
            }
            (None, None) => bail!("range {source:?} has no endpoints"),
        }
    }

    // `>7 AND <80.44` is the range between the two values.
    fn and(&self, parts: &[NumberExpr], span: Span, negated: bool) -> Result<AstNode> {
        let Some(((low_op, low), (high_op, high))) = comparison_pair(parts) else {
            bail!("AND only joins one lower and one upper bound");
        };
        Ok(range(
            (low, low_op.is_inclusive()),
            (high, high_op.is_inclusive()),
            span.slice(self.input),
            negated,
        ))
    }

    // `<7 OR >80.44` is everything outside the range between the values; any
    // other OR is just a list.
    fn or(&self, parts: &[NumberExpr], span: Span, negated: bool) -> Result<Vec<Item>> {
        if let Some(((above_op, above), (below_op, below))) = comparison_pair(parts) {
            let node = range(
                (below, below_op.is_inclusive()),
                (above, above_op.is_inclusive()),
                span.slice(self.input),
                !negated,
            );
            return Ok(vec![Item::Clause(node)]);
        }
        let mut items = Vec::new();
        for part in parts {
            items.extend(self.items(part, negated)?);
        }
        Ok(items)
    }
}

type Bound<'a> = (ComparisonOp, &'a NumberLiteral);

// Splits two single comparisons into (lower bound, upper bound) when they
// point in opposite directions.
fn comparison_pair(parts: &[NumberExpr]) -> Option<(Bound<'_>, Bound<'_>)> {
    fn as_comparison(expr: &NumberExpr) -> Option<Bound<'_>> {
        match expr {
            NumberExpr::Term(NumberTerm::Comparison { op, value }, _) => Some((*op, value)),
            _ => None,
        }
    }
    let [a, b] = parts else {
        return None;
    };
    let (a, b) = (as_comparison(a)?, as_comparison(b)?);
    if a.0.is_lower_bound() && b.0.is_upper_bound() {
        Some((a, b))
    } else if a.0.is_upper_bound() && b.0.is_lower_bound() {
        Some((b, a))
    } else {
        None
    }
}

fn one_sided(
    op: ComparisonOp,
    value: &NumberLiteral,
    source: &str,
    negated: bool,
) -> Result<AstNode> {
    if negated {
        bail!("cannot negate the one-sided comparison {source:?}");
    }
    Ok(AstNode::new(
        TypeFamily::Number,
        NodeKind::Comparison {
            op,
            value: Value::Number(value.clone()),
        },
        source,
    ))
}

// Endpoints written high-to-low are swapped, each keeping its own bracket.
fn range(
    low: (&NumberLiteral, bool),
    high: (&NumberLiteral, bool),
    source: &str,
    negated: bool,
) -> AstNode {
    let (low, high) = if low.0.value() > high.0.value() {
        (high, low)
    } else {
        (low, high)
    };
    AstNode::new(
        TypeFamily::Number,
        NodeKind::Range {
            low: Some(Value::Number(low.0.clone())),
            high: Some(Value::Number(high.0.clone())),
            bounds: BoundKind::new(low.1, high.1),
        },
        source,
    )
    .negate(negated)
}

pub(crate) fn normalize_date(input: &str) -> Result<AstNode> {
    let mut negated = false;
    let kind = match parse_date(input)? {
        DateExpr::AnyTime => NodeKind::Range {
            low: None,
            high: None,
            bounds: BoundKind::ClosedOpen,
        },
        DateExpr::Null {
            negated: null_negated,
        } => {
            negated = null_negated;
            NodeKind::NullCheck
        }
        DateExpr::Relative { period, unit, side } => NodeKind::DateRelative { period, unit, side },
        DateExpr::ThisRange { start, end } => NodeKind::DateThisRange { start, end },
        DateExpr::Past { count, unit } => {
            if count < 1 {
                bail!("'{input}' describes an empty window");
            }
            NodeKind::DatePast { count, unit }
        }
        DateExpr::Ago {
            count,
            unit,
            duration,
        } => NodeKind::DateAgo {
            count,
            unit,
            duration,
        },
        DateExpr::Bound { side, anchor } => NodeKind::DateBound { side, anchor },
        DateExpr::Absolute(literal) => NodeKind::Literal {
            value: Value::Date(literal),
        },
        // Date ranges are always half-open; reversed endpoints only swap.
        DateExpr::Range { start, end } => {
            let (low, high) = if start.datetime > end.datetime {
                (end, start)
            } else {
                (start, end)
            };
            NodeKind::Range {
                low: Some(Value::Date(low)),
                high: Some(Value::Date(high)),
                bounds: BoundKind::ClosedOpen,
            }
        }
        DateExpr::Weekday(weekday) => NodeKind::Weekday(weekday),
    };
    Ok(AstNode::new(TypeFamily::Date, kind, input).negate(negated))
}

pub(crate) fn normalize_location(input: &str) -> Result<AstNode> {
    let shape = match parse_location(input)? {
        LocationExpr::Anywhere => LocationShape::Anywhere,
        LocationExpr::Null { negated } => {
            return Ok(
                AstNode::new(TypeFamily::Location, NodeKind::NullCheck, input).negate(negated),
            );
        }
        LocationExpr::Point { lat, lon } => LocationShape::Point { lat, lon },
        LocationExpr::Circle {
            distance,
            unit,
            lat,
            lon,
        } => LocationShape::Circle {
            lat,
            lon,
            distance,
            unit,
        },
        LocationExpr::Box {
            lat0,
            lon0,
            lat1,
            lon1,
        } => LocationShape::Box {
            lat0,
            lon0,
            lat1,
            lon1,
        },
    };
    Ok(AstNode::new(
        TypeFamily::Location,
        NodeKind::Location(shape),
        input,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(input: &str) -> AstNode {
        normalize_number(input).unwrap()
    }

    fn leaf_texts(node: &AstNode) -> Vec<(String, bool)> {
        node.children()
            .iter()
            .map(|leaf| match &leaf.kind {
                NodeKind::Comparison { value, .. } => (value.to_string(), leaf.negated),
                other => panic!("expected Comparison, got: {other:?}"),
            })
            .collect()
    }

    #[test]
    fn positive_values_coalesce_across_negations() {
        let root = number("23, not 42, 43");
        assert!(root.is_equality_group());
        assert!(root.negated);
        assert_eq!(
            leaf_texts(&root),
            [
                ("23".to_string(), true),
                ("42".to_string(), true),
                ("43".to_string(), true),
            ]
        );
    }

    #[test]
    fn three_groups_stay_apart() {
        let root = number("23, not 42, not 43");
        let NodeKind::Composite { children } = &root.kind else {
            panic!("expected list");
        };
        assert_eq!(children.len(), 3);
        assert!(children.iter().all(AstNode::is_equality_group));
        assert!(!children[0].negated);
        assert!(children[1].negated && children[2].negated);
    }

    #[test]
    fn reversed_interval_swaps_with_brackets() {
        let root = number("[0.1, -4)");
        let NodeKind::Range { low, high, bounds } = &root.kind else {
            panic!("expected Range");
        };
        assert_eq!(low.as_ref().map(Value::to_string).as_deref(), Some("-4"));
        assert_eq!(high.as_ref().map(Value::to_string).as_deref(), Some("0.1"));
        assert_eq!(*bounds, BoundKind::OpenClosed);
    }

    #[test]
    fn unsupported_combinations_fail() {
        for input in ["not >5", ">1 AND >2", "1 AND 2", "not (1,)", "not [5,)"] {
            assert!(normalize_number(input).is_err(), "{input:?}");
        }
        assert!(normalize_date("0 days").is_err());
    }

    #[test]
    fn root_source_is_the_full_input() {
        let input = "  >= 5.5 AND <=10 ";
        assert_eq!(number(input).source, input);
    }
}
