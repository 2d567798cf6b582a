//! Concrete windows for date filters.

use jiff::{Timestamp, civil::DateTime};
use sieve_calendar::{DateArithmetic, DateWindow};
use sieve_syntax::{DateAnchor, DateLiteral, DatePrecision, DateUnit, Period, Side};
use tracing::trace;

use crate::{
    Error, TypeFamily,
    ast::{AstNode, NodeKind, Value},
};

impl AstNode {
    /// Resolves a date filter against `provider`, anchored at the instant
    /// captured when the expression was parsed (or the provider's clock).
    ///
    /// `Ok(None)` means the filter has no window: nulls, the fallback and
    /// other families.
    pub fn window(&self, provider: &dyn DateArithmetic) -> Result<Option<DateWindow>, Error> {
        let now = match self.now {
            Some(now) => now,
            None => provider.now()?,
        };
        self.window_at(provider, now)
    }

    pub fn window_at(
        &self,
        provider: &dyn DateArithmetic,
        now: Timestamp,
    ) -> Result<Option<DateWindow>, Error> {
        if self.family != TypeFamily::Date {
            return Ok(None);
        }
        let resolver = Resolver {
            provider,
            local: provider.to_local(now)?,
        };
        let window = match &self.kind {
            NodeKind::Range {
                low: None,
                high: None,
                ..
            } => DateWindow {
                start: None,
                end: None,
            },
            NodeKind::Range {
                low: Some(Value::Date(low)),
                high: Some(Value::Date(high)),
                ..
            } => DateWindow::between(low.datetime, high.datetime),
            NodeKind::Literal {
                value: Value::Date(literal),
            } => resolver.literal(literal)?,
            NodeKind::DateRelative { period, unit, side } => {
                let start = resolver.period_start(*period, *unit)?;
                match side {
                    None => DateWindow::between(start, provider.add(start, *unit, 1)?),
                    Some(Side::Before) => DateWindow::before(start),
                    Some(Side::After) => DateWindow::after(start),
                }
            }
            NodeKind::DateThisRange { start, end } => {
                let from = resolver.current(*start)?;
                let until = provider.add(resolver.current(*end)?, *end, 1)?;
                DateWindow::between(from, until)
            }
            NodeKind::DatePast { count, unit } => {
                let current = resolver.current(*unit)?;
                let start = provider.add(current, *unit, 1 - count)?;
                DateWindow::between(start, provider.add(current, *unit, 1)?)
            }
            NodeKind::DateAgo {
                count,
                unit,
                duration,
            } => {
                let start = resolver.shifted(*unit, -count)?;
                let end = match duration {
                    Some((length, length_unit)) => provider.add(start, *length_unit, *length)?,
                    None => provider.add(start, *unit, 1)?,
                };
                DateWindow::between(start, end)
            }
            NodeKind::DateBound { side, anchor } => {
                let at = match anchor {
                    DateAnchor::Absolute(literal) => literal.datetime,
                    DateAnchor::Ago { count, unit } => resolver.shifted(*unit, -count)?,
                    DateAnchor::FromNow { count, unit } => resolver.shifted(*unit, *count)?,
                };
                match side {
                    Side::Before => DateWindow::before(at),
                    Side::After => DateWindow::after(at),
                }
            }
            NodeKind::Weekday(weekday) => {
                let today = resolver.current(DateUnit::Day)?;
                let back = (today.weekday().to_monday_zero_offset()
                    - weekday.to_monday_zero_offset())
                .rem_euclid(7);
                let start = provider.add(today, DateUnit::Day, -i64::from(back))?;
                DateWindow::between(start, provider.add(start, DateUnit::Day, 1)?)
            }
            _ => return Ok(None),
        };
        trace!(%window, tag = self.operator_tag(), "resolved date window");
        Ok(Some(window))
    }
}

struct Resolver<'a> {
    provider: &'a dyn DateArithmetic,
    local: DateTime,
}

impl Resolver<'_> {
    fn current(&self, unit: DateUnit) -> Result<DateTime, Error> {
        Ok(self.provider.start_of(self.local, unit)?)
    }

    fn shifted(&self, unit: DateUnit, count: i64) -> Result<DateTime, Error> {
        Ok(self.provider.add(self.current(unit)?, unit, count)?)
    }

    fn period_start(&self, period: Period, unit: DateUnit) -> Result<DateTime, Error> {
        let offset = match period {
            Period::This => 0,
            Period::Next => 1,
            Period::Last => -1,
        };
        self.shifted(unit, offset)
    }

    fn literal(&self, literal: &DateLiteral) -> Result<DateWindow, Error> {
        let unit = match literal.precision {
            DatePrecision::Year => DateUnit::Year,
            DatePrecision::Month => DateUnit::Month,
            DatePrecision::Day => DateUnit::Day,
            DatePrecision::Second => DateUnit::Second,
        };
        let end = self.provider.add(literal.datetime, unit, 1)?;
        Ok(DateWindow::between(literal.datetime, end))
    }
}

#[cfg(test)]
mod tests {
    use jiff::{civil::date, tz::TimeZone};
    use sieve_calendar::{Calendar, CalendarConfig};

    use super::*;
    use crate::parse_filter_expression;

    // Wednesday.
    const NOW: &str = "2024-02-14T10:30:00Z";

    fn calendar() -> Calendar {
        Calendar::new(CalendarConfig::default())
            .unwrap()
            .with_time_zone(TimeZone::UTC)
    }

    fn window(input: &str) -> Option<DateWindow> {
        let now: Timestamp = NOW.parse().unwrap();
        parse_filter_expression(TypeFamily::Date, input, Some(now))
            .window(&calendar())
            .unwrap()
    }

    #[test]
    fn this_and_last_week() {
        assert_eq!(
            window("this week"),
            Some(DateWindow::between(
                date(2024, 2, 12).at(0, 0, 0, 0),
                date(2024, 2, 19).at(0, 0, 0, 0),
            ))
        );
        assert_eq!(
            window("last week"),
            Some(DateWindow::between(
                date(2024, 2, 5).at(0, 0, 0, 0),
                date(2024, 2, 12).at(0, 0, 0, 0),
            ))
        );
    }

    #[test]
    fn weekday_looks_back() {
        assert_eq!(
            window("monday"),
            Some(DateWindow::between(
                date(2024, 2, 12).at(0, 0, 0, 0),
                date(2024, 2, 13).at(0, 0, 0, 0),
            ))
        );
        assert_eq!(
            window("wednesday"),
            Some(DateWindow::between(
                date(2024, 2, 14).at(0, 0, 0, 0),
                date(2024, 2, 15).at(0, 0, 0, 0),
            ))
        );
    }

    #[test]
    fn non_dates_have_no_window() {
        assert_eq!(window("null"), None);
        assert_eq!(window("gibberish"), None);
        let number = parse_filter_expression(TypeFamily::Number, "5", None);
        assert_eq!(number.window(&calendar()).unwrap(), None);
    }
}
