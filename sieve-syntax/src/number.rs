use crate::{
    ComparisonOp, NumberLiteral, ParseError, Span,
    lexer::{Cursor, NUMBER_RULES, Token, TokenKind},
};

/// Parses a number filter expression into its raw syntax tree.
///
/// ```
/// use sieve_syntax::{parse_number, NumberExpr};
/// let NumberExpr::List(items) = parse_number("1, 3, 5").unwrap() else { panic!() };
/// assert_eq!(items.len(), 3);
/// ```
pub fn parse_number(input: &str) -> Result<NumberExpr, ParseError> {
    NumberParser {
        cursor: Cursor::new(input, NUMBER_RULES)?,
    }
    .parse()
}

/// Raw number expression as written. Comma lists, `AND`/`OR` chains and `not`
/// prefixes are kept exactly as typed so the normalizer can apply the merge
/// rules in one place.
#[derive(Debug, Clone, PartialEq)]
pub enum NumberExpr {
    /// An atomic clause and the span it was parsed from.
    Term(NumberTerm, Span),
    /// `not` applied to the following range or run of comma separated values.
    Not(Box<NumberExpr>, Span),
    /// `a AND b` chain.
    And(Vec<NumberExpr>),
    /// `a OR b` chain.
    Or(Vec<NumberExpr>),
    /// Comma separated items.
    List(Vec<NumberExpr>),
}

impl NumberExpr {
    pub fn span(&self) -> Span {
        match self {
            NumberExpr::Term(_, span) | NumberExpr::Not(_, span) => *span,
            NumberExpr::And(parts) | NumberExpr::Or(parts) | NumberExpr::List(parts) => parts
                .iter()
                .map(NumberExpr::span)
                .reduce(Span::to)
                .unwrap_or(Span::new(0, 0)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NumberTerm {
    /// Bare value such as `5`.
    Value(NumberLiteral),
    /// `>5`, `<= 10`, `<> 3`.
    Comparison {
        op: ComparisonOp,
        value: NumberLiteral,
    },
    /// Bracket notation. A `None` endpoint was left blank or written as
    /// `inf`/`-inf`.
    Interval {
        low: Option<NumberLiteral>,
        high: Option<NumberLiteral>,
        low_closed: bool,
        high_closed: bool,
    },
    /// `1 to 5`, `1 to`, `to 5`.
    To {
        low: Option<NumberLiteral>,
        high: Option<NumberLiteral>,
    },
    /// `null`
    Null,
}

struct NumberParser<'a> {
    cursor: Cursor<'a>,
}

impl<'a> NumberParser<'a> {
    fn parse(mut self) -> Result<NumberExpr, ParseError> {
        if self.cursor.is_empty() {
            return Err(self.cursor.error("empty number expression"));
        }
        let expr = self.parse_list()?;
        self.cursor.expect_end()?;
        Ok(expr)
    }

    // The comma has the lowest precedence. A `not` group may swallow some of
    // the following commas itself, see `parse_not`.
    fn parse_list(&mut self) -> Result<NumberExpr, ParseError> {
        let mut items = vec![self.parse_item()?];
        while self.cursor.eat(TokenKind::Comma).is_some() {
            items.push(self.parse_item()?);
        }
        Ok(collapse(items, NumberExpr::List))
    }

    fn parse_item(&mut self) -> Result<NumberExpr, ParseError> {
        if let Some(token) = self.cursor.eat_word("null") {
            return Ok(NumberExpr::Term(NumberTerm::Null, token.span));
        }
        if let Some(token) = self.cursor.eat_word("not") {
            return self.parse_not(token);
        }
        // `<>`/`!=` only ever govern the single value that follows.
        if let Some(token) = self.cursor.eat(TokenKind::Op(ComparisonOp::Ne)) {
            let (value, span) = self.parse_value()?;
            return Ok(NumberExpr::Term(
                NumberTerm::Comparison {
                    op: ComparisonOp::Ne,
                    value,
                },
                token.span.to(span),
            ));
        }
        self.parse_or()
    }

    fn parse_not(&mut self, not: Token<'a>) -> Result<NumberExpr, ParseError> {
        if let Some(token) = self.cursor.eat_word("null") {
            let inner = NumberExpr::Term(NumberTerm::Null, token.span);
            return Ok(NumberExpr::Not(Box::new(inner), not.span.to(token.span)));
        }

        if self.starts_range() {
            let inner = self.parse_atom()?;
            let span = not.span.to(inner.span());
            return Ok(NumberExpr::Not(Box::new(inner), span));
        }

        let mut values = vec![self.parse_value_term()?];
        while self.continues_value_group() {
            self.cursor.next();
            values.push(self.parse_value_term()?);
        }
        let inner = collapse(values, NumberExpr::List);
        let span = not.span.to(inner.span());
        Ok(NumberExpr::Not(Box::new(inner), span))
    }

    // `not` keeps eating `, <number>` while the number stands alone, so
    // `not 1, 2, 3` negates all three but `not 10, [1,5)` only negates 10.
    fn continues_value_group(&self) -> bool {
        let comma = self.cursor.peek_kind() == Some(TokenKind::Comma);
        let number = self.cursor.peek_nth(1).map(|t| t.kind) == Some(TokenKind::Number);
        let standalone = match self.cursor.peek_nth(2) {
            None => true,
            Some(token) => token.kind == TokenKind::Comma,
        };
        comma && number && standalone
    }

    fn starts_range(&self) -> bool {
        match self.cursor.peek_kind() {
            Some(TokenKind::LBracket | TokenKind::LParen) => true,
            Some(TokenKind::Number) => {
                matches!(self.cursor.peek_nth(1), Some(token) if token.is_word("to"))
            }
            Some(TokenKind::Word) => self.cursor.peek_is_word("to"),
            _ => false,
        }
    }

    fn parse_or(&mut self) -> Result<NumberExpr, ParseError> {
        let mut parts = vec![self.parse_and()?];
        while self.cursor.eat_word("or").is_some() {
            parts.push(self.parse_and()?);
        }
        Ok(collapse(parts, NumberExpr::Or))
    }

    fn parse_and(&mut self) -> Result<NumberExpr, ParseError> {
        let mut parts = vec![self.parse_atom()?];
        while self.cursor.eat_word("and").is_some() {
            parts.push(self.parse_atom()?);
        }
        Ok(collapse(parts, NumberExpr::And))
    }

    fn parse_atom(&mut self) -> Result<NumberExpr, ParseError> {
        let Some(token) = self.cursor.peek() else {
            return Err(self.cursor.error("expected a number"));
        };
        match token.kind {
            TokenKind::Op(op) => {
                self.cursor.next();
                let (value, span) = self.parse_value()?;
                Ok(NumberExpr::Term(
                    NumberTerm::Comparison { op, value },
                    token.span.to(span),
                ))
            }
            TokenKind::LBracket | TokenKind::LParen => self.parse_interval(),
            TokenKind::Word if token.is_word("to") => {
                self.cursor.next();
                let (high, span) = self.parse_value()?;
                Ok(NumberExpr::Term(
                    NumberTerm::To {
                        low: None,
                        high: Some(high),
                    },
                    token.span.to(span),
                ))
            }
            TokenKind::Number => {
                let (low, span) = self.parse_value()?;
                if self.cursor.eat_word("to").is_none() {
                    return Ok(NumberExpr::Term(NumberTerm::Value(low), span));
                }
                let mut span = span.to(self.cursor.last_span());
                let high = if self.cursor.peek_kind() == Some(TokenKind::Number) {
                    let (high, high_span) = self.parse_value()?;
                    span = span.to(high_span);
                    Some(high)
                } else {
                    None
                };
                Ok(NumberExpr::Term(
                    NumberTerm::To {
                        low: Some(low),
                        high,
                    },
                    span,
                ))
            }
            _ => Err(self
                .cursor
                .error("expected a number, comparison or interval")),
        }
    }

    fn parse_interval(&mut self) -> Result<NumberExpr, ParseError> {
        let Some(open) = self.cursor.next() else {
            return Err(self.cursor.error("expected '[' or '('"));
        };
        let low_closed = open.kind == TokenKind::LBracket;

        let low = self.parse_endpoint(false)?;
        self.cursor.expect(TokenKind::Comma, "',' inside interval")?;
        let high = self.parse_endpoint(true)?;

        let close = match self.cursor.peek_kind() {
            Some(TokenKind::RBracket | TokenKind::RParen) => self.cursor.next(),
            _ => None,
        };
        let Some(close) = close else {
            return Err(self.cursor.error("expected ']' or ')'"));
        };
        if low.is_none() && high.is_none() {
            return Err(ParseError {
                message: "interval needs at least one endpoint".into(),
                position: open.span.start,
            });
        }

        Ok(NumberExpr::Term(
            NumberTerm::Interval {
                low,
                high,
                low_closed,
                high_closed: close.kind == TokenKind::RBracket,
            },
            open.span.to(close.span),
        ))
    }

    // Blank endpoints and infinities both mean "unbounded on this side", but
    // the sign has to point away from the interval: `[inf,10]` is rejected.
    fn parse_endpoint(&mut self, upper: bool) -> Result<Option<NumberLiteral>, ParseError> {
        match self.cursor.peek_kind() {
            Some(TokenKind::Number) => Ok(Some(self.parse_value()?.0)),
            Some(TokenKind::Minus) => {
                self.cursor.next();
                if upper || self.cursor.eat_word("inf").is_none() {
                    return Err(self.cursor.error("unexpected '-' in interval"));
                }
                Ok(None)
            }
            Some(TokenKind::Word) if self.cursor.peek_is_word("inf") => {
                if !upper {
                    return Err(self.cursor.error("lower endpoint cannot be +inf"));
                }
                self.cursor.next();
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn parse_value_term(&mut self) -> Result<NumberExpr, ParseError> {
        let (value, span) = self.parse_value()?;
        Ok(NumberExpr::Term(NumberTerm::Value(value), span))
    }

    fn parse_value(&mut self) -> Result<(NumberLiteral, Span), ParseError> {
        let token = self.cursor.expect(TokenKind::Number, "a number")?;
        let literal = NumberLiteral::parse(token.text).ok_or_else(|| ParseError {
            message: format!("malformed number {:?}", token.text),
            position: token.span.start,
        })?;
        Ok((literal, token.span))
    }
}

fn collapse(mut parts: Vec<NumberExpr>, wrap: fn(Vec<NumberExpr>) -> NumberExpr) -> NumberExpr {
    if parts.len() == 1 {
        parts.remove(0)
    } else {
        wrap(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(text: &str) -> NumberLiteral {
        NumberLiteral::parse(text).unwrap()
    }

    fn term(expr: &NumberExpr) -> &NumberTerm {
        match expr {
            NumberExpr::Term(term, _) => term,
            other => panic!("expected Term, got: {other:?}"),
        }
    }

    #[test]
    fn parses_single_value_and_comparisons() {
        assert_eq!(term(&parse_number("5").unwrap()), &NumberTerm::Value(value("5")));
        assert_eq!(
            term(&parse_number(">=    0").unwrap()),
            &NumberTerm::Comparison {
                op: ComparisonOp::Gte,
                value: value("0"),
            }
        );
        assert_eq!(
            term(&parse_number("<-242").unwrap()),
            &NumberTerm::Comparison {
                op: ComparisonOp::Lt,
                value: value("-242"),
            }
        );
    }

    #[test]
    fn not_swallows_standalone_values_only() {
        let NumberExpr::Not(inner, _) = parse_number("not 1, 2, 3").unwrap() else {
            panic!("expected Not");
        };
        let NumberExpr::List(values) = *inner else {
            panic!("expected List");
        };
        assert_eq!(values.len(), 3);

        let NumberExpr::List(items) = parse_number("NOT 10,[1,5)").unwrap() else {
            panic!("expected List");
        };
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], NumberExpr::Not(_, _)));
        assert!(matches!(
            term(&items[1]),
            NumberTerm::Interval {
                low_closed: true,
                high_closed: false,
                ..
            }
        ));

        let NumberExpr::List(items) = parse_number("23, not 42, not 43").unwrap() else {
            panic!("expected List");
        };
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn not_binds_to_following_range() {
        for input in ["not 3 to 80.44", "NOT[2, 4]", "NOT  (0.1,   -4]"] {
            let NumberExpr::Not(inner, span) = parse_number(input).unwrap() else {
                panic!("expected Not for {input}");
            };
            assert!(matches!(
                term(&inner),
                NumberTerm::To { .. } | NumberTerm::Interval { .. }
            ));
            assert_eq!(span.slice(input), input.trim());
        }
    }

    #[test]
    fn inequality_governs_a_single_value() {
        let NumberExpr::List(items) = parse_number("!= 1, 2, 3").unwrap() else {
            panic!("expected List");
        };
        assert_eq!(items.len(), 3);
        assert!(matches!(
            term(&items[0]),
            NumberTerm::Comparison {
                op: ComparisonOp::Ne,
                ..
            }
        ));
        assert!(matches!(term(&items[1]), NumberTerm::Value(_)));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let NumberExpr::Or(parts) = parse_number(">1 AND <2 OR >3 AND <4").unwrap() else {
            panic!("expected Or");
        };
        assert_eq!(parts.len(), 2);
        assert!(parts.iter().all(|part| matches!(part, NumberExpr::And(p) if p.len() == 2)));
    }

    #[test]
    fn open_ended_intervals() {
        let cases = [
            ("(1,)", Some("1"), None),
            ("(1, inf)", Some("1"), None),
            ("(-inf,100]", None, Some("100")),
            ("(,100)", None, Some("100")),
            ("[,10]", None, Some("10")),
        ];
        for (input, low, high) in cases {
            let NumberTerm::Interval {
                low: l, high: h, ..
            } = term(&parse_number(input).unwrap()).clone()
            else {
                panic!("expected Interval for {input}");
            };
            assert_eq!(l.as_ref().map(NumberLiteral::as_str), low, "{input}");
            assert_eq!(h.as_ref().map(NumberLiteral::as_str), high, "{input}");
        }
    }

    #[test]
    fn to_ranges_allow_missing_side() {
        assert_eq!(
            term(&parse_number("1 to").unwrap()),
            &NumberTerm::To {
                low: Some(value("1")),
                high: None,
            }
        );
        assert_eq!(
            term(&parse_number("to -1").unwrap()),
            &NumberTerm::To {
                low: None,
                high: Some(value("-1")),
            }
        );
    }

    #[test]
    fn rejects_unsupported_shapes() {
        for input in [
            "", "(,)", "AND", "OR", "[inf,10]", "--1", "foo", "1 2", "(1,2", "not", "1,",
            "^12345",
        ] {
            assert!(parse_number(input).is_err(), "{input:?} should not parse");
        }
    }
}
