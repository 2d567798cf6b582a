use std::fmt;

use jiff::civil::{Date, DateTime, Weekday};

use crate::{
    ParseError, Span,
    lexer::{Cursor, DATE_RULES, TokenKind},
};

/// Parses a date filter expression.
///
/// ```
/// use sieve_syntax::{parse_date, DateExpr, DateUnit};
/// let expr = parse_date("3 days ago").unwrap();
/// assert_eq!(expr, DateExpr::Ago { count: 3, unit: DateUnit::Day, duration: None });
/// ```
pub fn parse_date(input: &str) -> Result<DateExpr, ParseError> {
    let mut parser = DateParser {
        cursor: Cursor::new(input, DATE_RULES)?,
    };
    let expr = parser.parse()?;
    parser.cursor.expect_end()?;
    Ok(expr)
}

/// Calendar units understood by the relative date vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    FiscalQuarter,
    Year,
    FiscalYear,
}

impl DateUnit {
    pub fn name(self) -> &'static str {
        match self {
            DateUnit::Second => "second",
            DateUnit::Minute => "minute",
            DateUnit::Hour => "hour",
            DateUnit::Day => "day",
            DateUnit::Week => "week",
            DateUnit::Month => "month",
            DateUnit::Quarter => "quarter",
            DateUnit::FiscalQuarter => "fiscal quarter",
            DateUnit::Year => "year",
            DateUnit::FiscalYear => "fiscal year",
        }
    }

    /// `3 days`, `1 month`, `2 fiscal quarters`.
    pub fn count_label(self, count: i64) -> String {
        if count == 1 {
            format!("{count} {}", self.name())
        } else {
            format!("{count} {}s", self.name())
        }
    }

    fn from_word(word: &str) -> Option<Self> {
        let lower = word.to_ascii_lowercase();
        let singular = lower.strip_suffix('s').unwrap_or(&lower);
        Some(match singular {
            "second" => DateUnit::Second,
            "minute" => DateUnit::Minute,
            "hour" => DateUnit::Hour,
            "day" => DateUnit::Day,
            "week" => DateUnit::Week,
            "month" => DateUnit::Month,
            "quarter" => DateUnit::Quarter,
            "year" => DateUnit::Year,
            _ => return None,
        })
    }

    fn fiscal(self) -> Option<Self> {
        match self {
            DateUnit::Quarter => Some(DateUnit::FiscalQuarter),
            DateUnit::Year => Some(DateUnit::FiscalYear),
            _ => None,
        }
    }
}

impl fmt::Display for DateUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    This,
    Next,
    Last,
}

impl Period {
    pub fn as_str(self) -> &'static str {
        match self {
            Period::This => "this",
            Period::Next => "next",
            Period::Last => "last",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Before,
    After,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Before => "before",
            Side::After => "after",
        }
    }
}

/// How much of a [`DateLiteral`] the user actually wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DatePrecision {
    Year,
    Month,
    Day,
    Second,
}

/// An absolute date or timestamp. Missing components are filled with their
/// first value, so `2018` is `2018-01-01T00:00:00` with [`DatePrecision::Year`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateLiteral {
    pub datetime: DateTime,
    pub precision: DatePrecision,
}

impl DateLiteral {
    pub fn date(&self) -> Date {
        self.datetime.date()
    }
}

impl fmt::Display for DateLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dt = self.datetime;
        match self.precision {
            DatePrecision::Year => write!(f, "{:04}", dt.year()),
            DatePrecision::Month => write!(f, "{:04}/{:02}", dt.year(), dt.month()),
            DatePrecision::Day => {
                write!(f, "{:04}/{:02}/{:02}", dt.year(), dt.month(), dt.day())
            }
            DatePrecision::Second => write!(
                f,
                "{:04}/{:02}/{:02} {:02}:{:02}:{:02}",
                dt.year(),
                dt.month(),
                dt.day(),
                dt.hour(),
                dt.minute(),
                dt.second()
            ),
        }
    }
}

/// The point a `before`/`after` clause is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateAnchor {
    Absolute(DateLiteral),
    /// `3 days ago`
    Ago { count: i64, unit: DateUnit },
    /// `2 weeks from now`
    FromNow { count: i64, unit: DateUnit },
}

/// Raw date expression. Relative forms stay symbolic; nothing here depends on
/// the current instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateExpr {
    /// Empty input.
    AnyTime,
    /// `null` / `not null`.
    Null { negated: bool },
    /// `this week`, `before next month`, `after last quarter`.
    Relative {
        period: Period,
        unit: DateUnit,
        side: Option<Side>,
    },
    /// `this year to second`
    ThisRange { start: DateUnit, end: DateUnit },
    /// `3 days`, `last 3 days`
    Past { count: i64, unit: DateUnit },
    /// `3 months ago`, `3 months ago for 2 days`
    Ago {
        count: i64,
        unit: DateUnit,
        duration: Option<(i64, DateUnit)>,
    },
    /// `before 2018-01-01`, `after 2 weeks from now`
    Bound { side: Side, anchor: DateAnchor },
    /// `2018`, `2018/01`, `2018-05-18 12:00:00`
    Absolute(DateLiteral),
    /// `2018-05-18 to 2018-05-20`
    Range { start: DateLiteral, end: DateLiteral },
    /// `monday`
    Weekday(Weekday),
}

struct DateParser<'a> {
    cursor: Cursor<'a>,
}

impl DateParser<'_> {
    fn parse(&mut self) -> Result<DateExpr, ParseError> {
        if self.cursor.is_empty() {
            return Ok(DateExpr::AnyTime);
        }
        if self.cursor.eat_word("null").is_some() {
            return Ok(DateExpr::Null { negated: false });
        }
        if self.cursor.eat_word("not").is_some() {
            self.cursor.expect_word("null")?;
            return Ok(DateExpr::Null { negated: true });
        }
        if let Some(period) = self.eat_period() {
            return self.parse_period(period);
        }
        if let Some(side) = self.eat_side() {
            return self.parse_bound(side);
        }
        if self.starts_count() {
            let (count, unit) = self.parse_count()?;
            if self.cursor.eat_word("ago").is_none() {
                return Ok(DateExpr::Past { count, unit });
            }
            let duration = if self.cursor.eat_word("for").is_some() {
                Some(self.parse_count()?)
            } else {
                None
            };
            return Ok(DateExpr::Ago {
                count,
                unit,
                duration,
            });
        }
        if self.cursor.peek_kind() == Some(TokenKind::Number) {
            let start = self.parse_literal()?;
            if self.cursor.eat_word("to").is_none() {
                return Ok(DateExpr::Absolute(start));
            }
            let end = self.parse_literal()?;
            return Ok(DateExpr::Range { start, end });
        }
        if let Some(weekday) = self.eat_weekday() {
            return Ok(DateExpr::Weekday(weekday));
        }
        Err(self.cursor.error("unrecognized date expression"))
    }

    fn parse_period(&mut self, period: Period) -> Result<DateExpr, ParseError> {
        if period == Period::Last && self.starts_count() {
            let (count, unit) = self.parse_count()?;
            return Ok(DateExpr::Past { count, unit });
        }
        let unit = self.parse_unit()?;
        if period == Period::This && self.cursor.eat_word("to").is_some() {
            let end = self.parse_unit()?;
            return Ok(DateExpr::ThisRange { start: unit, end });
        }
        Ok(DateExpr::Relative {
            period,
            unit,
            side: None,
        })
    }

    fn parse_bound(&mut self, side: Side) -> Result<DateExpr, ParseError> {
        if let Some(period) = self.eat_period() {
            let unit = self.parse_unit()?;
            return Ok(DateExpr::Relative {
                period,
                unit,
                side: Some(side),
            });
        }
        let anchor = if self.starts_count() {
            let (count, unit) = self.parse_count()?;
            if self.cursor.eat_word("ago").is_some() {
                DateAnchor::Ago { count, unit }
            } else {
                self.cursor.expect_word("from")?;
                self.cursor.expect_word("now")?;
                DateAnchor::FromNow { count, unit }
            }
        } else {
            DateAnchor::Absolute(self.parse_literal()?)
        };
        Ok(DateExpr::Bound { side, anchor })
    }

    fn eat_period(&mut self) -> Option<Period> {
        [Period::This, Period::Next, Period::Last]
            .into_iter()
            .find(|period| self.cursor.eat_word(period.as_str()).is_some())
    }

    fn eat_side(&mut self) -> Option<Side> {
        [Side::Before, Side::After]
            .into_iter()
            .find(|side| self.cursor.eat_word(side.as_str()).is_some())
    }

    fn eat_weekday(&mut self) -> Option<Weekday> {
        const DAYS: [(&str, Weekday); 7] = [
            ("monday", Weekday::Monday),
            ("tuesday", Weekday::Tuesday),
            ("wednesday", Weekday::Wednesday),
            ("thursday", Weekday::Thursday),
            ("friday", Weekday::Friday),
            ("saturday", Weekday::Saturday),
            ("sunday", Weekday::Sunday),
        ];
        DAYS.into_iter()
            .find(|(name, _)| self.cursor.eat_word(name).is_some())
            .map(|(_, weekday)| weekday)
    }

    // `<count> <unit>` as opposed to the start of an absolute date.
    fn starts_count(&self) -> bool {
        let number = self.cursor.peek_kind() == Some(TokenKind::Number);
        let unit = matches!(
            self.cursor.peek_nth(1),
            Some(token) if token.kind == TokenKind::Word
                && (DateUnit::from_word(token.text).is_some() || token.is_word("fiscal"))
        );
        number && unit
    }

    fn parse_count(&mut self) -> Result<(i64, DateUnit), ParseError> {
        let token = self.cursor.expect(TokenKind::Number, "a count")?;
        let count = token.text.parse::<i64>().map_err(|_| ParseError {
            message: format!("count {:?} is out of range", token.text),
            position: token.span.start,
        })?;
        Ok((count, self.parse_unit()?))
    }

    fn parse_unit(&mut self) -> Result<DateUnit, ParseError> {
        let fiscal = self.cursor.eat_word("fiscal").is_some();
        let unit = match self.cursor.peek() {
            Some(token) if token.kind == TokenKind::Word => DateUnit::from_word(token.text),
            _ => None,
        };
        let unit = if fiscal {
            unit.and_then(DateUnit::fiscal)
        } else {
            unit
        };
        let Some(unit) = unit else {
            return Err(self.cursor.error("expected a date unit"));
        };
        self.cursor.next();
        Ok(unit)
    }

    // YYYY, YYYY[-/]MM, YYYY[-/]MM[-/]DD, then an optional HH:MM[:SS] after a
    // space or an ISO `T`.
    fn parse_literal(&mut self) -> Result<DateLiteral, ParseError> {
        let start = self.cursor.peek().map(|t| t.span).unwrap_or(Span::new(0, 0));
        let year = self.parse_component(4, "a four digit year")?;
        let mut precision = DatePrecision::Year;
        let mut month = 1;
        let mut day = 1;
        if self.eat_date_separator() {
            month = self.parse_component(2, "a month")?;
            precision = DatePrecision::Month;
            if self.eat_date_separator() {
                day = self.parse_component(2, "a day")?;
                precision = DatePrecision::Day;
            }
        }

        let (mut hour, mut minute, mut second) = (0, 0, 0);
        if precision == DatePrecision::Day
            && self.cursor.peek_is_word("t")
            && self.cursor.peek_nth(1).map(|t| t.kind) == Some(TokenKind::Number)
        {
            self.cursor.next();
        }
        if precision == DatePrecision::Day && self.cursor.peek_kind() == Some(TokenKind::Number)
        {
            hour = self.parse_component(2, "an hour")?;
            self.cursor.expect(TokenKind::Colon, "':'")?;
            minute = self.parse_component(2, "minutes")?;
            if self.cursor.eat(TokenKind::Colon).is_some() {
                second = self.parse_component(2, "seconds")?;
            }
            if (hour, minute, second) != (0, 0, 0) {
                precision = DatePrecision::Second;
            }
        }

        let datetime = DateTime::new(
            year,
            month as i8,
            day as i8,
            hour as i8,
            minute as i8,
            second as i8,
            0,
        )
        .map_err(|err| ParseError {
            message: format!("invalid date: {err}"),
            position: start.start,
        })?;
        Ok(DateLiteral {
            datetime,
            precision,
        })
    }

    fn eat_date_separator(&mut self) -> bool {
        let separator = matches!(
            self.cursor.peek_kind(),
            Some(TokenKind::Minus | TokenKind::Slash)
        );
        let followed_by_number =
            self.cursor.peek_nth(1).map(|t| t.kind) == Some(TokenKind::Number);
        if separator && followed_by_number {
            self.cursor.next();
            true
        } else {
            false
        }
    }

    fn parse_component(&mut self, max_digits: usize, what: &str) -> Result<i16, ParseError> {
        let token = self.cursor.expect(TokenKind::Number, what)?;
        let valid_len = if max_digits == 4 {
            token.text.len() == 4
        } else {
            token.text.len() <= max_digits
        };
        if !valid_len {
            return Err(ParseError {
                message: format!("expected {what}, found {:?}", token.text),
                position: token.span.start,
            });
        }
        token.text.parse::<i16>().map_err(|_| ParseError {
            message: format!("expected {what}"),
            position: token.span.start,
        })
    }
}
