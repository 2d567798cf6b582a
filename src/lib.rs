//! # Sieve: typed filter expressions
//!
//! `sieve` turns the text a user types into a filter box into a canonical,
//! strictly typed filter. The caller names the type family of the field being
//! filtered and gets back an [`AstNode`] that answers the questions a query
//! builder asks: which operator, which values, which bounds.
//!
//! ```
//! use sieve::{parse_filter_expression, TypeFamily};
//!
//! let node = parse_filter_expression(TypeFamily::Number, ">= 5.5 AND <=10", None);
//! assert_eq!(node.operator_tag(), "between");
//! assert_eq!(node.low().as_deref(), Some("5.5"));
//! assert_eq!(node.high().as_deref(), Some("10"));
//! assert_eq!(node.bounds(), Some("[]"));
//!
//! // Anything outside the grammar is kept verbatim instead of failing.
//! let node = parse_filter_expression(TypeFamily::Number, "seventeen", None);
//! assert_eq!(node.operator_tag(), "matchesAdvanced");
//! assert_eq!(node.raw_expression(), "seventeen");
//! ```
//!
//! Relative dates stay symbolic in the tree. [`AstNode::window`] resolves them
//! against a [`DateArithmetic`] provider when a concrete window is needed.

mod ast;
mod classify;
mod describe;
mod flatten;
mod normalize;
mod window;

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use tracing::{debug, instrument};

pub use ast::{AstNode, BoundKind, LocationShape, NodeKind, Value};
pub use flatten::flatten;
pub use sieve_calendar::{
    Calendar, CalendarConfig, CalendarError, DateArithmetic, DateWindow, FirstDayOfWeek,
};
pub use sieve_syntax::{
    ComparisonOp, DateAnchor, DateLiteral, DatePrecision, DateUnit, DistanceUnit, NumberLiteral,
    Period, Side,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    Number,
    Date,
    Location,
}

impl TypeFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeFamily::Number => "number",
            TypeFamily::Date => "date",
            TypeFamily::Location => "location",
        }
    }
}

impl fmt::Display for TypeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "number" => Ok(TypeFamily::Number),
            "date" => Ok(TypeFamily::Date),
            "location" => Ok(TypeFamily::Location),
            _ => Err(Error::UnknownTypeFamily(s.to_string())),
        }
    }
}

/// Failures a caller can actually see. Malformed input is not one of them:
/// it parses to a `matchesAdvanced` node.
#[derive(Debug)]
pub enum Error {
    UnknownTypeFamily(String),
    Calendar(CalendarError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownTypeFamily(name) => write!(f, "unknown type family {name:?}"),
            Error::Calendar(err) => write!(f, "calendar provider failed: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Calendar(err) => Some(err),
            Error::UnknownTypeFamily(_) => None,
        }
    }
}

impl From<CalendarError> for Error {
    fn from(err: CalendarError) -> Self {
        Error::Calendar(err)
    }
}

/// Parses `expression` with the grammar of `family`.
///
/// Never fails: input that does not fit the grammar, or that fits but has no
/// canonical form, comes back as a `matchesAdvanced` node holding the input
/// unchanged. `now` anchors relative dates and defaults to the current time
/// for the date family.
#[instrument(level = "debug", skip_all, fields(family = ?family))]
pub fn parse_filter_expression(
    family: TypeFamily,
    expression: &str,
    now: Option<Timestamp>,
) -> AstNode {
    let parsed = match family {
        TypeFamily::Number => normalize::normalize_number(expression),
        TypeFamily::Date => normalize::normalize_date(expression),
        TypeFamily::Location => normalize::normalize_location(expression),
    };
    let mut node = match parsed {
        Ok(node) => node,
        Err(error) => {
            debug!(?error, expression, "falling back to matchesAdvanced");
            AstNode::advanced(family, expression)
        }
    };
    if family == TypeFamily::Date {
        node.now = Some(now.unwrap_or_else(Timestamp::now));
    }
    node
}

/// [`parse_filter_expression`] for callers holding the family as text.
pub fn parse_filter_expression_for(
    family: &str,
    expression: &str,
    now: Option<Timestamp>,
) -> Result<AstNode, Error> {
    let family = family.parse::<TypeFamily>()?;
    Ok(parse_filter_expression(family, expression, now))
}
