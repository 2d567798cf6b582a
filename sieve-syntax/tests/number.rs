mod common;
use common::*;
use sieve_syntax::*;

#[test]
fn comma_list_keeps_every_value() {
    let expr = number_ok("1, 3, 5, 7");
    let items = as_list(&expr);
    assert_eq!(items.len(), 4);
    for (item, expected) in items.iter().zip(["1", "3", "5", "7"]) {
        value_is(item, expected);
    }
}

#[test]
fn comparisons_keep_their_operator() {
    let cases = [
        ("= 5", ComparisonOp::Eq, "5"),
        ("<> 5", ComparisonOp::Ne, "5"),
        ("!= 5", ComparisonOp::Ne, "5"),
        ("<3", ComparisonOp::Lt, "3"),
        ("<= 3", ComparisonOp::Lte, "3"),
        (">.5", ComparisonOp::Gt, "0.5"),
        (">= -.5", ComparisonOp::Gte, "-0.5"),
    ];
    for (input, op, value) in cases {
        comparison_is(&number_ok(input), op, value);
    }
}

#[test]
fn intervals_accept_any_bracket_pair() {
    interval_is(&number_ok("[1, 5]"), Some("1"), Some("5"), (true, true));
    interval_is(&number_ok("(1, 5]"), Some("1"), Some("5"), (false, true));
    interval_is(&number_ok("[1, 5)"), Some("1"), Some("5"), (true, false));
    interval_is(&number_ok("(1, 5)"), Some("1"), Some("5"), (false, false));
}

#[test]
fn open_ended_intervals() {
    interval_is(&number_ok("[10,)"), Some("10"), None, (true, false));
    interval_is(&number_ok("(-inf, 10]"), None, Some("10"), (false, true));
    interval_is(&number_ok("[10, inf)"), Some("10"), None, (true, false));
    interval_is(&number_ok("(,10]"), None, Some("10"), (false, true));
}

#[test]
fn and_or_build_chains() {
    let expr = number_ok(">= 5.5 AND <=10");
    let parts = as_and(&expr);
    comparison_is(&parts[0], ComparisonOp::Gte, "5.5");
    comparison_is(&parts[1], ComparisonOp::Lte, "10");

    let expr = number_ok(">10 AND <=20 OR 90");
    let parts = as_or(&expr);
    assert_eq!(as_and(&parts[0]).len(), 2);
    value_is(&parts[1], "90");
}

#[test]
fn not_group_stops_before_ranges() {
    let expr = number_ok("NOT 10, [1,5)");
    let items = as_list(&expr);
    value_is(as_not(&items[0]), "10");
    interval_is(&items[1], Some("1"), Some("5"), (true, false));

    let expr = number_ok("not 66, 99, 4");
    let inner = as_list(as_not(&expr));
    assert_eq!(inner.len(), 3);
}

#[test]
fn not_null_and_null() {
    assert!(matches!(as_term(&number_ok("null")), NumberTerm::Null));
    assert!(matches!(
        as_term(as_not(&number_ok("NOT NULL"))),
        NumberTerm::Null
    ));
}

#[test]
fn rejects_malformed_expressions() {
    for input in [
        "", "0.1.1.1", "0....1", "--1", "foo", "1234^, 567", "(,)", "[inf,10]", "AND", "OR",
        "1,", "1 2", "not", "[1,", ">",
    ] {
        let err = number_err(input);
        assert!(!err.message.is_empty(), "{input:?}");
    }
}

#[test]
fn error_positions_point_into_input() {
    let err = number_err("1, 2, foo");
    assert_eq!(err.position, 6);
    assert!(err.to_string().contains("at byte 6"));
}
