//! English descriptions and re-parseable canonical text.

use sieve_syntax::{DateAnchor, DateLiteral, DatePrecision, Period, Side};

use crate::{
    TypeFamily,
    ast::{AstNode, LocationShape, NodeKind, Value},
    classify::{canonical_order, weekday_name},
};

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

impl AstNode {
    /// Human readable summary, e.g. `is in range [1, 5), and is not 10`.
    pub fn description(&self) -> String {
        match &self.kind {
            NodeKind::Advanced { text } => format!("matches {text}"),
            NodeKind::Composite { .. } if self.is_equality_group() => self.describe_values(),
            NodeKind::Composite { children } => describe_list(children),
            NodeKind::NullCheck if self.negated => "is not null".to_string(),
            NodeKind::NullCheck => "is null".to_string(),
            _ => match self.family {
                TypeFamily::Number => self.describe_number(),
                TypeFamily::Date => self.describe_date(),
                TypeFamily::Location => self.describe_location(),
            },
        }
    }

    /// Text that parses back to an equivalent filter: `[1,5),not 10`,
    /// `3 days ago`, `inside box from 1, 2 to 3, 4`.
    pub fn canonical_expression(&self) -> String {
        match &self.kind {
            NodeKind::Advanced { text } => text.clone(),
            NodeKind::Composite { children } if self.is_equality_group() => children
                .iter()
                .map(AstNode::canonical_expression)
                .collect::<Vec<_>>()
                .join(","),
            NodeKind::Composite { children } => canonical_order(children)
                .map(AstNode::canonical_expression)
                .collect::<Vec<_>>()
                .join(","),
            NodeKind::NullCheck if self.negated => "not null".to_string(),
            NodeKind::NullCheck => "null".to_string(),
            NodeKind::Comparison { op, value } => {
                if self.is_equality() {
                    self.not_prefix(value.to_string())
                } else {
                    format!("{op}{value}")
                }
            }
            NodeKind::Range {
                low: None,
                high: None,
                ..
            } => String::new(),
            NodeKind::Range { low, high, .. } if self.family == TypeFamily::Date => {
                format!("{} to {}", text_of(low), text_of(high))
            }
            NodeKind::Range { .. } => self.not_prefix(self.interval_text()),
            NodeKind::Literal { value } => value.to_string(),
            NodeKind::DateRelative { period, unit, side } => match side {
                Some(side) => format!("{} {} {unit}", side.as_str(), period.as_str()),
                None => format!("{} {unit}", period.as_str()),
            },
            NodeKind::DateAgo {
                count,
                unit,
                duration,
            } => {
                let mut text = format!("{} ago", unit.count_label(*count));
                if let Some((count, unit)) = duration {
                    text.push_str(&format!(" for {}", unit.count_label(*count)));
                }
                text
            }
            NodeKind::DatePast { count, unit } => unit.count_label(*count),
            NodeKind::DateBound { side, anchor } => {
                let anchor = match anchor {
                    DateAnchor::Absolute(literal) => literal.to_string(),
                    DateAnchor::Ago { count, unit } => format!("{} ago", unit.count_label(*count)),
                    DateAnchor::FromNow { count, unit } => {
                        format!("{} from now", unit.count_label(*count))
                    }
                };
                format!("{} {anchor}", side.as_str())
            }
            NodeKind::DateThisRange { start, end } => format!("this {start} to {end}"),
            NodeKind::Weekday(weekday) => weekday_name(*weekday).to_string(),
            NodeKind::Location(shape) => match shape {
                LocationShape::Anywhere => String::new(),
                LocationShape::Point { lat, lon } => format!("{lat}, {lon}"),
                LocationShape::Circle {
                    lat,
                    lon,
                    distance,
                    unit,
                } => format!("{distance} {} from {lat}, {lon}", unit.as_str()),
                LocationShape::Box {
                    lat0,
                    lon0,
                    lat1,
                    lon1,
                } => format!("inside box from {lat0}, {lon0} to {lat1}, {lon1}"),
            },
        }
    }

    /// `[1,5]`, `(,10]`.
    pub(crate) fn interval_text(&self) -> String {
        match &self.kind {
            NodeKind::Range { low, high, bounds } => format!(
                "{}{},{}{}",
                bounds.open_char(),
                text_of(low),
                text_of(high),
                bounds.close_char()
            ),
            _ => String::new(),
        }
    }

    fn not_prefix(&self, text: String) -> String {
        if self.negated {
            format!("not {text}")
        } else {
            text
        }
    }

    fn describe_values(&self) -> String {
        let values = self
            .children()
            .iter()
            .filter_map(AstNode::value)
            .map(|value| value.to_string())
            .collect::<Vec<_>>();
        values_phrase(&values, self.is_negated())
    }

    fn describe_number(&self) -> String {
        match &self.kind {
            NodeKind::Comparison { value, .. } if self.is_equality() => {
                values_phrase(&[value.to_string()], self.negated)
            }
            NodeKind::Comparison { op, value } => format!("is {op} {value}"),
            NodeKind::Range { low, high, bounds } => {
                let range = format!(
                    "{}{}, {}{}",
                    bounds.open_char(),
                    text_of(low),
                    text_of(high),
                    bounds.close_char()
                );
                if self.negated {
                    format!("is not in range {range}")
                } else {
                    format!("is in range {range}")
                }
            }
            _ => self.canonical_expression(),
        }
    }

    fn describe_date(&self) -> String {
        match &self.kind {
            NodeKind::Range {
                low: None,
                high: None,
                ..
            } => "is any time".to_string(),
            NodeKind::Range { low, high, .. } => {
                format!("is from {} until {}", coarse_text(low), coarse_text(high))
            }
            NodeKind::Literal {
                value: Value::Date(literal),
            } => match literal.precision {
                DatePrecision::Year => format!("is in the year {literal}"),
                DatePrecision::Month => {
                    let month = MONTHS
                        .get(usize::try_from(literal.datetime.month() - 1).unwrap_or(0))
                        .copied()
                        .unwrap_or_default();
                    format!("is in {month} {:04}", literal.datetime.year())
                }
                DatePrecision::Day | DatePrecision::Second => format!("is on {literal}"),
            },
            NodeKind::DateRelative {
                period,
                unit,
                side: None,
            } => {
                let period = match period {
                    Period::Last => "previous",
                    other => other.as_str(),
                };
                format!("is {period} {unit}")
            }
            NodeKind::DateAgo { .. } => format!("is {}", self.canonical_expression()),
            NodeKind::DatePast { count, unit } => {
                format!("is in the last {}", unit.count_label(*count))
            }
            NodeKind::DateBound { side, anchor } => {
                let anchor = match anchor {
                    DateAnchor::Absolute(literal) => coarse(literal).to_string(),
                    DateAnchor::Ago { count, unit } => format!("{} ago", unit.count_label(*count)),
                    DateAnchor::FromNow { count, unit } => {
                        format!("{} from now", unit.count_label(*count))
                    }
                };
                match side {
                    Side::Before => format!("is before {anchor}"),
                    Side::After => format!("is on or after {anchor}"),
                }
            }
            NodeKind::Weekday(weekday) => format!("is {}", weekday_name(*weekday)),
            _ => self.canonical_expression(),
        }
    }

    fn describe_location(&self) -> String {
        match &self.kind {
            NodeKind::Location(LocationShape::Anywhere) => "is anywhere".to_string(),
            NodeKind::Location(LocationShape::Box {
                lat0,
                lon0,
                lat1,
                lon1,
            }) => format!(
                "{}, {} to {}, {}",
                degrees(lat0.value(), 'N', 'S'),
                degrees(lon0.value(), 'E', 'W'),
                degrees(lat1.value(), 'N', 'S'),
                degrees(lon1.value(), 'E', 'W'),
            ),
            _ => self.canonical_expression(),
        }
    }
}

// Positive clauses are joined with "or"; negative ones follow, each joined
// with ", and". Negated values collapse into one deduplicated phrase.
fn describe_list(children: &[AstNode]) -> String {
    let positive = children
        .iter()
        .filter(|child| !child.is_negated())
        .map(AstNode::description)
        .collect::<Vec<_>>();

    let mut negative: Vec<String> = Vec::new();
    let mut values: Vec<String> = Vec::new();
    let mut values_at = None;
    for child in children.iter().filter(|child| child.is_negated()) {
        let leaves = match &child.kind {
            NodeKind::Composite { children } if child.is_equality_group() => children.as_slice(),
            _ if child.is_equality() => std::slice::from_ref(child),
            _ => {
                let description = child.description();
                if !negative.contains(&description) {
                    negative.push(description);
                }
                continue;
            }
        };
        if values_at.is_none() {
            values_at = Some(negative.len());
            negative.push(String::new());
        }
        for value in leaves.iter().filter_map(AstNode::value) {
            let value = value.to_string();
            if !values.contains(&value) {
                values.push(value);
            }
        }
    }
    if let Some(slot) = values_at.and_then(|idx| negative.get_mut(idx)) {
        *slot = values_phrase(&values, true);
    }

    match (positive.is_empty(), negative.is_empty()) {
        (false, false) => format!("{}, and {}", positive.join(" or "), negative.join(", and ")),
        (false, true) => positive.join(" or "),
        _ => negative.join(", and "),
    }
}

fn values_phrase(values: &[String], negated: bool) -> String {
    let joined = values.join(" or ");
    if negated {
        format!("is not {joined}")
    } else {
        format!("is {joined}")
    }
}

fn text_of(value: &Option<Value>) -> String {
    value.as_ref().map(Value::to_string).unwrap_or_default()
}

// Bounds and ranges are described to the day.
fn coarse(literal: &DateLiteral) -> DateLiteral {
    DateLiteral {
        datetime: literal.datetime,
        precision: literal.precision.min(DatePrecision::Day),
    }
}

fn coarse_text(value: &Option<Value>) -> String {
    match value {
        Some(Value::Date(literal)) => coarse(literal).to_string(),
        other => text_of(other),
    }
}

fn degrees(value: f64, positive: char, negative: char) -> String {
    let hemisphere = if value < 0.0 { negative } else { positive };
    format!("{:.1}°{hemisphere}", value.abs())
}

#[cfg(test)]
mod tests {
    use crate::{TypeFamily, parse_filter_expression};

    fn describe(family: TypeFamily, input: &str) -> String {
        parse_filter_expression(family, input, None).description()
    }

    #[test]
    fn negated_values_collapse_into_one_phrase() {
        assert_eq!(
            describe(TypeFamily::Number, "23, not 42, not 42"),
            "is 23, and is not 42"
        );
        assert_eq!(
            describe(TypeFamily::Number, "23,NOT NULL,NOT NULL"),
            "is 23, and is not null"
        );
    }

    #[test]
    fn box_uses_hemispheres() {
        assert_eq!(
            describe(
                TypeFamily::Location,
                "inside box from -72.33, 173.14 to 0, -61.70"
            ),
            "72.3°S, 173.1°E to 0.0°N, 61.7°W"
        );
    }

    #[test]
    fn months_are_spelled_out() {
        assert_eq!(describe(TypeFamily::Date, "2018-12"), "is in December 2018");
    }
}
