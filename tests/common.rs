#![allow(dead_code)]
//! Shared helpers for `sieve` integration tests.

use jiff::{Timestamp, tz::TimeZone};
use sieve::*;
use tracing_subscriber::EnvFilter;

/// A Wednesday morning, UTC.
pub const NOW: &str = "2024-02-14T10:30:00Z";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn now() -> Timestamp {
    NOW.parse().unwrap()
}

pub fn number(input: &str) -> AstNode {
    init_tracing();
    parse_filter_expression(TypeFamily::Number, input, None)
}

pub fn date(input: &str) -> AstNode {
    init_tracing();
    parse_filter_expression(TypeFamily::Date, input, Some(now()))
}

pub fn location(input: &str) -> AstNode {
    init_tracing();
    parse_filter_expression(TypeFamily::Location, input, None)
}

pub fn utc_calendar(config: CalendarConfig) -> Calendar {
    Calendar::new(config).unwrap().with_time_zone(TimeZone::UTC)
}

/// Parses `input`, then parses its canonical text again and checks that both
/// agree on everything a query builder reads.
pub fn assert_canonical_round_trip(family: TypeFamily, input: &str) {
    let first = parse_filter_expression(family, input, Some(now()));
    let text = first.canonical_expression();
    let second = parse_filter_expression(family, &text, Some(now()));
    assert_eq!(
        first.operator_tag(),
        second.operator_tag(),
        "{input:?} -> {text:?}"
    );
    assert_eq!(first.low(), second.low(), "{input:?} -> {text:?}");
    assert_eq!(first.high(), second.high(), "{input:?} -> {text:?}");
    assert_eq!(first.bounds(), second.bounds(), "{input:?} -> {text:?}");
}
