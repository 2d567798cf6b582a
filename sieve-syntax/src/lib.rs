//! # Sieve's Filter Expression Grammars
//!
//! `sieve-syntax` turns the text a user types into a search box into a raw,
//! per-family syntax tree. There is one grammar per type family:
//!
//! - [`parse_number`] understands values, comparisons, bracket intervals,
//!   `to` ranges, `AND`/`OR` pairs, `not` groups and `null`.
//! - [`parse_date`] understands absolute dates, `this/next/last <unit>`,
//!   `N <unit> ago [for M <unit>]`, `before/after ...` and a few shorthands.
//! - [`parse_location`] understands points, circles and boxes.
//!
//! The trees keep the shape the user wrote. Merging clauses, picking an
//! operator tag and falling back to a verbatim match are the job of the
//! `sieve` crate, so every function here simply reports a [`ParseError`] when
//! the text does not fit its grammar.
//!
//! ## Example
//! ```
//! use sieve_syntax::{parse_number, NumberExpr, NumberTerm};
//!
//! let expr = parse_number("1 to 5").unwrap();
//! let NumberExpr::Term(NumberTerm::To { low, high }, _) = expr else { panic!() };
//! assert_eq!(low.unwrap().as_str(), "1");
//! assert_eq!(high.unwrap().as_str(), "5");
//! ```

mod date;
mod lexer;
mod location;
mod number;

use std::fmt;

pub use date::{
    DateAnchor, DateExpr, DateLiteral, DatePrecision, DateUnit, Period, Side, parse_date,
};
pub use location::{DistanceUnit, LocationExpr, parse_location};
pub use number::{NumberExpr, NumberTerm, parse_number};

/// Byte range of a clause inside the raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Slices the covered fragment out of `input`, trimming surrounding
    /// whitespace.
    pub fn slice(self, input: &str) -> &str {
        input.get(self.start..self.end).unwrap_or_default().trim()
    }
}

/// Comparison operators shared by the number and date grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    /// `< value`
    Lt,
    /// `<= value`
    Lte,
    /// `> value`
    Gt,
    /// `>= value`
    Gte,
    /// `= value`
    Eq,
    /// `<> value` or `!= value`
    Ne,
}

impl ComparisonOp {
    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonOp::Lt => "<",
            ComparisonOp::Lte => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Gte => ">=",
            ComparisonOp::Eq => "=",
            ComparisonOp::Ne => "!=",
        }
    }

    /// `true` for operators that bound a value from below (`>`, `>=`).
    pub fn is_lower_bound(self) -> bool {
        matches!(self, ComparisonOp::Gt | ComparisonOp::Gte)
    }

    /// `true` for operators that bound a value from above (`<`, `<=`).
    pub fn is_upper_bound(self) -> bool {
        matches!(self, ComparisonOp::Lt | ComparisonOp::Lte)
    }

    /// `true` when the bound itself is part of the matched set.
    pub fn is_inclusive(self) -> bool {
        matches!(
            self,
            ComparisonOp::Lte | ComparisonOp::Gte | ComparisonOp::Eq
        )
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signed decimal as written by the user.
///
/// The text is kept verbatim except that a missing leading zero is restored,
/// so `.5` becomes `0.5` and `-.5` becomes `-0.5`, while `-1.0` and
/// `123456789` stay exactly as typed.
///
/// ```
/// use sieve_syntax::NumberLiteral;
/// assert_eq!(NumberLiteral::parse(".01").unwrap().as_str(), "0.01");
/// assert_eq!(NumberLiteral::parse("-.01").unwrap().as_str(), "-0.01");
/// assert_eq!(NumberLiteral::parse("-1.0").unwrap().as_str(), "-1.0");
/// assert!(NumberLiteral::parse("0.1.1").is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NumberLiteral {
    text: String,
    value: f64,
}

impl NumberLiteral {
    pub fn parse(raw: &str) -> Option<Self> {
        let (sign, digits) = match raw.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", raw),
        };
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (digits, None),
        };
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) {
            return None;
        }
        if let Some(frac) = frac_part {
            if frac.is_empty() || !all_digits(frac) {
                return None;
            }
        }
        if int_part.is_empty() && frac_part.is_none() {
            return None;
        }

        let text = if int_part.is_empty() {
            format!("{sign}0{digits}")
        } else {
            raw.to_string()
        };
        let value = text.parse::<f64>().ok()?;
        Some(Self { text, value })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl fmt::Display for NumberLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at byte {})", self.message, self.position)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_literal_restores_leading_zero() {
        let cases = [
            (".5", "0.5", 0.5),
            ("-.5", "-0.5", -0.5),
            ("0.01", "0.01", 0.01),
            ("123456789", "123456789", 123456789.0),
            ("-1.0", "-1.0", -1.0),
        ];
        for (raw, text, value) in cases {
            let literal = NumberLiteral::parse(raw).unwrap();
            assert_eq!(literal.as_str(), text, "{raw}");
            assert_eq!(literal.value(), value, "{raw}");
        }
    }

    #[test]
    fn number_literal_rejects_malformed_text() {
        for raw in ["", "-", ".", "1.", "0.1.1", "--1", "1e5", "abc", "1-"] {
            assert!(NumberLiteral::parse(raw).is_none(), "{raw:?}");
        }
    }

    #[test]
    fn span_slices_trimmed_fragment() {
        let input = "  1 to 5 ";
        assert_eq!(Span::new(0, input.len()).slice(input), "1 to 5");
        assert_eq!(Span::new(2, 3).to(Span::new(7, 8)).slice(input), "1 to 5");
    }
}
