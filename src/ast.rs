use std::{cmp::Ordering, fmt};

use jiff::{Timestamp, civil::Weekday};
use sieve_syntax::{
    ComparisonOp, DateAnchor, DateLiteral, DateUnit, DistanceUnit, NumberLiteral, Period, Side,
};

use crate::TypeFamily;

/// A parsed filter expression, or one clause of it.
///
/// Nodes are plain values: built once by [`crate::parse_filter_expression`]
/// and never mutated afterwards. `source` is the fragment a clause was parsed
/// from; on the root it is the whole input, byte for byte.
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    pub family: TypeFamily,
    pub kind: NodeKind,
    pub negated: bool,
    pub source: String,
    /// Instant relative dates are anchored to. Only set for the date family.
    pub now: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Literal {
        value: Value,
    },
    Range {
        low: Option<Value>,
        high: Option<Value>,
        bounds: BoundKind,
    },
    /// `!=` is expressed as `Eq` with [`AstNode::negated`] set.
    Comparison {
        op: ComparisonOp,
        value: Value,
    },
    NullCheck,
    /// Clauses of which any may match: comma lists, `OR`, and equality
    /// groups such as `1, 3, 5`. `AND` only survives as a range.
    Composite {
        children: Vec<AstNode>,
    },
    DateRelative {
        period: Period,
        unit: DateUnit,
        side: Option<Side>,
    },
    DateAgo {
        count: i64,
        unit: DateUnit,
        duration: Option<(i64, DateUnit)>,
    },
    DatePast {
        count: i64,
        unit: DateUnit,
    },
    DateBound {
        side: Side,
        anchor: DateAnchor,
    },
    DateThisRange {
        start: DateUnit,
        end: DateUnit,
    },
    Weekday(Weekday),
    Location(LocationShape),
    /// Input no grammar accepted, kept verbatim.
    Advanced {
        text: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    OpenOpen,
    OpenClosed,
    ClosedOpen,
    ClosedClosed,
}

impl BoundKind {
    pub fn new(low_closed: bool, high_closed: bool) -> Self {
        match (low_closed, high_closed) {
            (false, false) => BoundKind::OpenOpen,
            (false, true) => BoundKind::OpenClosed,
            (true, false) => BoundKind::ClosedOpen,
            (true, true) => BoundKind::ClosedClosed,
        }
    }

    pub fn low_closed(self) -> bool {
        matches!(self, BoundKind::ClosedOpen | BoundKind::ClosedClosed)
    }

    pub fn high_closed(self) -> bool {
        matches!(self, BoundKind::OpenClosed | BoundKind::ClosedClosed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BoundKind::OpenOpen => "()",
            BoundKind::OpenClosed => "(]",
            BoundKind::ClosedOpen => "[)",
            BoundKind::ClosedClosed => "[]",
        }
    }

    pub(crate) fn open_char(self) -> char {
        if self.low_closed() { '[' } else { '(' }
    }

    pub(crate) fn close_char(self) -> char {
        if self.high_closed() { ']' } else { ')' }
    }
}

impl fmt::Display for BoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocationShape {
    Anywhere,
    Point {
        lat: NumberLiteral,
        lon: NumberLiteral,
    },
    Circle {
        lat: NumberLiteral,
        lon: NumberLiteral,
        distance: NumberLiteral,
        unit: DistanceUnit,
    },
    Box {
        lat0: NumberLiteral,
        lon0: NumberLiteral,
        lat1: NumberLiteral,
        lon1: NumberLiteral,
    },
}

/// Operand of a literal, comparison or range. Values of the same kind are
/// ordered; values of different kinds are incomparable.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(NumberLiteral),
    Date(DateLiteral),
    Text(String),
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.value().partial_cmp(&b.value()),
            (Value::Date(a), Value::Date(b)) => Some(a.datetime.cmp(&b.datetime)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(number) => write!(f, "{number}"),
            Value::Date(date) => write!(f, "{date}"),
            Value::Text(text) => f.write_str(text),
        }
    }
}

impl AstNode {
    pub(crate) fn new(family: TypeFamily, kind: NodeKind, source: impl Into<String>) -> Self {
        Self {
            family,
            kind,
            negated: false,
            source: source.into(),
            now: None,
        }
    }

    pub(crate) fn advanced(family: TypeFamily, text: &str) -> Self {
        Self::new(
            family,
            NodeKind::Advanced {
                text: text.to_string(),
            },
            text,
        )
    }

    pub(crate) fn negate(mut self, negated: bool) -> Self {
        self.negated = negated;
        self
    }

    /// The text this node was parsed from. For the root it is the full input.
    pub fn raw_expression(&self) -> &str {
        &self.source
    }

    pub fn is_advanced(&self) -> bool {
        matches!(self.kind, NodeKind::Advanced { .. })
    }

    /// `1,3,5` style group: a composite whose children are all `Eq`
    /// comparisons.
    pub fn is_equality_group(&self) -> bool {
        match &self.kind {
            NodeKind::Composite { children } => {
                !children.is_empty() && children.iter().all(AstNode::is_equality)
            }
            _ => false,
        }
    }

    pub(crate) fn is_equality(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Comparison {
                op: ComparisonOp::Eq,
                ..
            }
        )
    }

    pub(crate) fn children(&self) -> &[AstNode] {
        match &self.kind {
            NodeKind::Composite { children } => children,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(text: &str) -> Value {
        Value::Number(NumberLiteral::parse(text).unwrap())
    }

    #[test]
    fn bound_kind_round_trips_through_flags() {
        for kind in [
            BoundKind::OpenOpen,
            BoundKind::OpenClosed,
            BoundKind::ClosedOpen,
            BoundKind::ClosedClosed,
        ] {
            assert_eq!(BoundKind::new(kind.low_closed(), kind.high_closed()), kind);
            assert_eq!(kind.as_str().len(), 2);
        }
    }

    #[test]
    fn numbers_order_by_value_not_text() {
        assert!(number("-4") < number("0.1"));
        assert!(number("10") > number("9.5"));
        assert_eq!(number("1.0").partial_cmp(&number("1")), Some(Ordering::Equal));
        assert_eq!(number("1").partial_cmp(&Value::Text("1".into())), None);
    }
}
