use std::collections::BTreeMap;

use sieve_syntax::{ComparisonOp, DateAnchor, DatePrecision, Period, Side};

use crate::{
    TypeFamily,
    ast::{AstNode, LocationShape, NodeKind, Value},
};

impl AstNode {
    /// The canonical operator category, e.g. `between`, `!=`, `pastAgo`.
    pub fn operator_tag(&self) -> &'static str {
        match &self.kind {
            NodeKind::Advanced { .. } => "matchesAdvanced",
            NodeKind::Composite { children } if self.is_equality_group() => {
                if children.iter().any(|leaf| !leaf.negated) {
                    "="
                } else {
                    "!="
                }
            }
            NodeKind::Composite { children } => lead_clause(children)
                .map(AstNode::operator_tag)
                .unwrap_or("matchesAdvanced"),
            NodeKind::Comparison { op, .. } => match (op, self.negated) {
                (ComparisonOp::Eq, false) | (ComparisonOp::Ne, true) => "=",
                (ComparisonOp::Eq, true) | (ComparisonOp::Ne, false) => "!=",
                (op, _) => op.as_str(),
            },
            NodeKind::Range {
                low: None,
                high: None,
                ..
            } => "anytime",
            NodeKind::Range { .. } => match (self.family, self.negated) {
                (TypeFamily::Number, false) => "between",
                (TypeFamily::Number, true) => "!between",
                _ => "range",
            },
            NodeKind::NullCheck => match (self.family, self.negated) {
                (_, false) => "null",
                (TypeFamily::Number, true) => "!null",
                (_, true) => "notnull",
            },
            NodeKind::Literal {
                value: Value::Date(literal),
            } => match literal.precision {
                DatePrecision::Year => "year",
                DatePrecision::Month => "month",
                DatePrecision::Day | DatePrecision::Second => "on",
            },
            NodeKind::Literal { .. } => "=",
            NodeKind::DateRelative { period, side, .. } => match (side, period) {
                (None, Period::This) => "this",
                (None, Period::Next) => "next",
                (None, Period::Last) => "last",
                (Some(Side::Before), Period::This) => "before_this",
                (Some(Side::Before), Period::Next) => "before_next",
                (Some(Side::Before), Period::Last) => "before_last",
                (Some(Side::After), Period::This) => "after_this",
                (Some(Side::After), Period::Next) => "after_next",
                (Some(Side::After), Period::Last) => "after_last",
            },
            NodeKind::DateAgo { .. } => "pastAgo",
            NodeKind::DatePast { .. } => "past",
            NodeKind::DateBound { side, .. } => side.as_str(),
            NodeKind::DateThisRange { .. } => "thisRange",
            NodeKind::Weekday(_) => "weekday",
            NodeKind::Location(shape) => match shape {
                LocationShape::Anywhere => "anywhere",
                LocationShape::Point { .. } => "location",
                LocationShape::Circle { .. } => "circle",
                LocationShape::Box { .. } => "box",
            },
        }
    }

    /// A list is negated only when every clause in it is.
    pub fn is_negated(&self) -> bool {
        match &self.kind {
            NodeKind::Composite { children } => {
                !children.is_empty() && children.iter().all(AstNode::is_negated)
            }
            _ => self.negated,
        }
    }

    /// The single operand, or the first one of a list.
    pub fn value(&self) -> Option<Value> {
        match &self.kind {
            NodeKind::Literal { value } | NodeKind::Comparison { value, .. } => {
                Some(value.clone())
            }
            NodeKind::Composite { children } => lead_clause(children).and_then(AstNode::value),
            NodeKind::Advanced { text } => Some(Value::Text(text.clone())),
            _ => None,
        }
    }

    /// Operand text: `5`, `1,2,3` for an equality group, `[1,5]` for a range.
    /// Lists report their lead clause.
    pub fn value_string(&self) -> String {
        match &self.kind {
            NodeKind::Comparison { value, .. } | NodeKind::Literal { value } => value.to_string(),
            NodeKind::Composite { children } if self.is_equality_group() => children
                .iter()
                .filter_map(AstNode::value)
                .map(|value| value.to_string())
                .collect::<Vec<_>>()
                .join(","),
            NodeKind::Composite { children } => lead_clause(children)
                .map(AstNode::value_string)
                .unwrap_or_default(),
            NodeKind::NullCheck => String::new(),
            NodeKind::Advanced { text } => text.clone(),
            NodeKind::Range { .. } if self.family == TypeFamily::Number => self.interval_text(),
            _ => self.canonical_expression(),
        }
    }

    /// Lower end of the first range, in canonical clause order.
    pub fn low(&self) -> Option<String> {
        match &self.first_range()?.kind {
            NodeKind::Range { low, .. } => low.as_ref().map(Value::to_string),
            _ => None,
        }
    }

    /// Upper end of the first range, in canonical clause order.
    pub fn high(&self) -> Option<String> {
        match &self.first_range()?.kind {
            NodeKind::Range { high, .. } => high.as_ref().map(Value::to_string),
            _ => None,
        }
    }

    /// Bracket notation of the first range: `()`, `(]`, `[)` or `[]`.
    pub fn bounds(&self) -> Option<&'static str> {
        match &self.first_range()?.kind {
            NodeKind::Range {
                low: None,
                high: None,
                ..
            } => None,
            NodeKind::Range { bounds, .. } => Some(bounds.as_str()),
            _ => None,
        }
    }

    fn first_range(&self) -> Option<&AstNode> {
        match &self.kind {
            NodeKind::Range { .. } => Some(self),
            NodeKind::Composite { children } => {
                canonical_order(children).find_map(AstNode::first_range)
            }
            _ => None,
        }
    }

    /// Structured fields of a date or location filter, keyed the way query
    /// builders expect them (`lat`, `long`, `type`, ...). `None` for numbers,
    /// unconstrained filters and the fallback.
    pub fn payload(&self) -> Option<BTreeMap<&'static str, String>> {
        if self.family == TypeFamily::Number {
            return None;
        }
        let mut map = BTreeMap::new();
        match &self.kind {
            NodeKind::NullCheck => {}
            NodeKind::Location(LocationShape::Anywhere) => return None,
            NodeKind::Location(LocationShape::Point { lat, lon }) => {
                map.insert("lat", lat.to_string());
                map.insert("long", lon.to_string());
            }
            NodeKind::Location(LocationShape::Circle {
                lat,
                lon,
                distance,
                unit,
            }) => {
                map.insert("distance", distance.to_string());
                map.insert("lat", lat.to_string());
                map.insert("lon", lon.to_string());
                map.insert("unit", unit.as_str().to_string());
            }
            NodeKind::Location(LocationShape::Box {
                lat0,
                lon0,
                lat1,
                lon1,
            }) => {
                map.insert("lat", lat0.to_string());
                map.insert("lon", lon0.to_string());
                map.insert("lat1", lat1.to_string());
                map.insert("lon1", lon1.to_string());
            }
            NodeKind::Range {
                low: None,
                high: None,
                ..
            } => return None,
            NodeKind::Range { low, high, .. } => {
                if let Some(low) = low {
                    map.insert("start", low.to_string());
                }
                if let Some(high) = high {
                    map.insert("end", high.to_string());
                }
            }
            NodeKind::Literal { value } => {
                map.insert("date", value.to_string());
            }
            NodeKind::DateRelative { unit, .. } => {
                map.insert("unit", unit.name().to_string());
            }
            NodeKind::DateAgo {
                count,
                unit,
                duration,
            } => {
                map.insert("unit", unit.name().to_string());
                map.insert("value", count.to_string());
                if let Some((count, unit)) = duration {
                    map.insert("duration_unit", unit.name().to_string());
                    map.insert("duration_value", count.to_string());
                }
            }
            NodeKind::DatePast { count, unit } => {
                map.insert("unit", unit.name().to_string());
                map.insert("value", count.to_string());
            }
            NodeKind::DateBound { anchor, .. } => match anchor {
                DateAnchor::Absolute(literal) => {
                    map.insert("date", literal.to_string());
                }
                DateAnchor::Ago { count, unit } => {
                    map.insert("anchor", "ago".to_string());
                    map.insert("unit", unit.name().to_string());
                    map.insert("value", count.to_string());
                }
                DateAnchor::FromNow { count, unit } => {
                    map.insert("anchor", "from now".to_string());
                    map.insert("unit", unit.name().to_string());
                    map.insert("value", count.to_string());
                }
            },
            NodeKind::DateThisRange { start, end } => {
                map.insert("start", start.name().to_string());
                map.insert("end", end.name().to_string());
            }
            NodeKind::Weekday(weekday) => {
                map.insert("day", weekday_name(*weekday).to_string());
            }
            NodeKind::Comparison { .. } | NodeKind::Composite { .. } | NodeKind::Advanced { .. } => {
                return None;
            }
        }
        map.insert("type", self.operator_tag().to_string());
        Some(map)
    }
}

// Positive clauses first, then negated ones, each in source order. Canonical
// text is written in this order, so the accessors read it the same way.
pub(crate) fn canonical_order(children: &[AstNode]) -> impl Iterator<Item = &AstNode> {
    let positive = children.iter().filter(|child| !child.is_negated());
    let negative = children.iter().filter(|child| child.is_negated());
    positive.chain(negative)
}

// First clause that is not negated, else the first clause.
pub(crate) fn lead_clause(children: &[AstNode]) -> Option<&AstNode> {
    canonical_order(children).next()
}

pub(crate) fn weekday_name(weekday: jiff::civil::Weekday) -> &'static str {
    use jiff::civil::Weekday;
    match weekday {
        Weekday::Monday => "monday",
        Weekday::Tuesday => "tuesday",
        Weekday::Wednesday => "wednesday",
        Weekday::Thursday => "thursday",
        Weekday::Friday => "friday",
        Weekday::Saturday => "saturday",
        Weekday::Sunday => "sunday",
    }
}
