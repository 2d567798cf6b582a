#![allow(dead_code)]
//! Shared helpers for `sieve-syntax` integration tests.

use sieve_syntax::*;

pub fn number_ok(input: &str) -> NumberExpr {
    parse_number(input).unwrap()
}

pub fn number_err(input: &str) -> ParseError {
    parse_number(input).unwrap_err()
}

pub fn date_ok(input: &str) -> DateExpr {
    parse_date(input).unwrap()
}

pub fn location_ok(input: &str) -> LocationExpr {
    parse_location(input).unwrap()
}

pub fn as_term(expr: &NumberExpr) -> &NumberTerm {
    match expr {
        NumberExpr::Term(term, _) => term,
        other => panic!("expected Term, got: {other:?}"),
    }
}

pub fn as_list(expr: &NumberExpr) -> &Vec<NumberExpr> {
    match expr {
        NumberExpr::List(items) => items,
        other => panic!("expected List, got: {other:?}"),
    }
}

pub fn as_and(expr: &NumberExpr) -> &Vec<NumberExpr> {
    match expr {
        NumberExpr::And(parts) => parts,
        other => panic!("expected And, got: {other:?}"),
    }
}

pub fn as_or(expr: &NumberExpr) -> &Vec<NumberExpr> {
    match expr {
        NumberExpr::Or(parts) => parts,
        other => panic!("expected Or, got: {other:?}"),
    }
}

pub fn as_not(expr: &NumberExpr) -> &NumberExpr {
    match expr {
        NumberExpr::Not(inner, _) => inner,
        other => panic!("expected Not, got: {other:?}"),
    }
}

pub fn value_is(expr: &NumberExpr, expected: &str) {
    match as_term(expr) {
        NumberTerm::Value(literal) => assert_eq!(literal.as_str(), expected),
        other => panic!("expected Value, got: {other:?}"),
    }
}

pub fn comparison_is(expr: &NumberExpr, op: ComparisonOp, expected: &str) {
    match as_term(expr) {
        NumberTerm::Comparison { op: actual, value } => {
            assert_eq!(*actual, op);
            assert_eq!(value.as_str(), expected);
        }
        other => panic!("expected Comparison, got: {other:?}"),
    }
}

pub fn interval_is(expr: &NumberExpr, low: Option<&str>, high: Option<&str>, closed: (bool, bool)) {
    match as_term(expr) {
        NumberTerm::Interval {
            low: l,
            high: h,
            low_closed,
            high_closed,
        } => {
            assert_eq!(l.as_ref().map(NumberLiteral::as_str), low);
            assert_eq!(h.as_ref().map(NumberLiteral::as_str), high);
            assert_eq!((*low_closed, *high_closed), closed);
        }
        other => panic!("expected Interval, got: {other:?}"),
    }
}
