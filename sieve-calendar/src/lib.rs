//! Calendar arithmetic behind relative date filters.
//!
//! [`DateArithmetic`] is the seam the `sieve` crate resolves `this week`,
//! `3 months ago` and friends through. [`Calendar`] is the jiff backed
//! implementation: it knows the time zone, the fiscal year start and the first
//! day of the week, and can be pinned to a fixed instant.

use std::fmt;

use jiff::{
    Span, Timestamp,
    civil::{Date, DateTime},
    tz::TimeZone,
};
use serde::{Deserialize, Serialize};
use sieve_syntax::DateUnit;
use tracing::debug;

/// Clock and calendar operations needed to turn a relative date into a
/// concrete window. Implementations must be safe to share between threads.
pub trait DateArithmetic: Send + Sync {
    fn now(&self) -> Result<Timestamp, CalendarError>;

    /// Civil time of `timestamp` in the calendar's zone.
    fn to_local(&self, timestamp: Timestamp) -> Result<DateTime, CalendarError>;

    /// First instant of the `unit` period containing `datetime`.
    fn start_of(&self, datetime: DateTime, unit: DateUnit) -> Result<DateTime, CalendarError>;

    /// Moves `datetime` by `count` units. `count` may be negative.
    fn add(&self, datetime: DateTime, unit: DateUnit, count: i64)
    -> Result<DateTime, CalendarError>;
}

#[derive(Debug)]
pub enum CalendarError {
    UnknownTimeZone { name: String, source: jiff::Error },
    InvalidFiscalYearStart(i8),
    Arithmetic(jiff::Error),
}

impl fmt::Display for CalendarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarError::UnknownTimeZone { name, .. } => {
                write!(f, "unknown time zone {name:?}")
            }
            CalendarError::InvalidFiscalYearStart(month) => {
                write!(f, "fiscal year must start in month 1..=12, got {month}")
            }
            CalendarError::Arithmetic(err) => write!(f, "date arithmetic failed: {err}"),
        }
    }
}

impl std::error::Error for CalendarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CalendarError::UnknownTimeZone { source, .. } => Some(source),
            CalendarError::Arithmetic(err) => Some(err),
            CalendarError::InvalidFiscalYearStart(_) => None,
        }
    }
}

impl From<jiff::Error> for CalendarError {
    fn from(err: jiff::Error) -> Self {
        CalendarError::Arithmetic(err)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirstDayOfWeek {
    #[default]
    Monday,
    Sunday,
}

/// User facing calendar settings. Every field has a default, so `{}` is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// IANA zone name. `None` uses the system zone.
    pub time_zone: Option<String>,
    pub fiscal_year_start_month: i8,
    pub first_day_of_week: FirstDayOfWeek,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            time_zone: None,
            fiscal_year_start_month: 1,
            first_day_of_week: FirstDayOfWeek::Monday,
        }
    }
}

#[derive(Debug, Clone)]
enum Clock {
    System,
    Fixed(Timestamp),
}

#[derive(Debug, Clone)]
pub struct Calendar {
    tz: TimeZone,
    fiscal_year_start_month: i8,
    first_day_of_week: FirstDayOfWeek,
    clock: Clock,
}

impl Calendar {
    pub fn new(config: CalendarConfig) -> Result<Self, CalendarError> {
        if !(1..=12).contains(&config.fiscal_year_start_month) {
            return Err(CalendarError::InvalidFiscalYearStart(
                config.fiscal_year_start_month,
            ));
        }
        let tz = match config.time_zone {
            Some(name) => match TimeZone::get(&name) {
                Ok(tz) => tz,
                Err(source) => return Err(CalendarError::UnknownTimeZone { name, source }),
            },
            None => TimeZone::system(),
        };
        debug!(
            tz = tz.iana_name().unwrap_or("<unnamed>"),
            fiscal_year_start_month = config.fiscal_year_start_month,
            first_day_of_week = ?config.first_day_of_week,
            "calendar configured"
        );
        Ok(Self {
            tz,
            fiscal_year_start_month: config.fiscal_year_start_month,
            first_day_of_week: config.first_day_of_week,
            clock: Clock::System,
        })
    }

    /// Like [`Calendar::new`] but `now()` always returns `now`.
    pub fn fixed(config: CalendarConfig, now: Timestamp) -> Result<Self, CalendarError> {
        let mut calendar = Self::new(config)?;
        calendar.clock = Clock::Fixed(now);
        Ok(calendar)
    }

    /// Replaces the zone picked from the configuration.
    pub fn with_time_zone(mut self, tz: TimeZone) -> Self {
        self.tz = tz;
        self
    }

    fn week_start(&self, date: Date) -> Result<Date, CalendarError> {
        let weekday = date.weekday();
        let offset = match self.first_day_of_week {
            FirstDayOfWeek::Monday => weekday.to_monday_zero_offset(),
            FirstDayOfWeek::Sunday => weekday.to_sunday_zero_offset(),
        };
        Ok(date.checked_sub(Span::new().try_days(i64::from(offset))?)?)
    }
}

impl DateArithmetic for Calendar {
    fn now(&self) -> Result<Timestamp, CalendarError> {
        Ok(match self.clock {
            Clock::System => Timestamp::now(),
            Clock::Fixed(now) => now,
        })
    }

    fn to_local(&self, timestamp: Timestamp) -> Result<DateTime, CalendarError> {
        Ok(timestamp.to_zoned(self.tz.clone()).datetime())
    }

    fn start_of(&self, datetime: DateTime, unit: DateUnit) -> Result<DateTime, CalendarError> {
        let date = datetime.date();
        let start = match unit {
            DateUnit::Second => DateTime::new(
                datetime.year(),
                datetime.month(),
                datetime.day(),
                datetime.hour(),
                datetime.minute(),
                datetime.second(),
                0,
            )?,
            DateUnit::Minute => date.at(datetime.hour(), datetime.minute(), 0, 0),
            DateUnit::Hour => date.at(datetime.hour(), 0, 0, 0),
            DateUnit::Day => date.at(0, 0, 0, 0),
            DateUnit::Week => self.week_start(date)?.at(0, 0, 0, 0),
            DateUnit::Month => month_block_start(date, 1, 1)?,
            DateUnit::Quarter => month_block_start(date, 3, 1)?,
            DateUnit::FiscalQuarter => month_block_start(date, 3, self.fiscal_year_start_month)?,
            DateUnit::Year => month_block_start(date, 12, 1)?,
            DateUnit::FiscalYear => month_block_start(date, 12, self.fiscal_year_start_month)?,
        };
        Ok(start)
    }

    fn add(
        &self,
        datetime: DateTime,
        unit: DateUnit,
        count: i64,
    ) -> Result<DateTime, CalendarError> {
        let span = match unit {
            DateUnit::Second => Span::new().try_seconds(count)?,
            DateUnit::Minute => Span::new().try_minutes(count)?,
            DateUnit::Hour => Span::new().try_hours(count)?,
            DateUnit::Day => Span::new().try_days(count)?,
            DateUnit::Week => Span::new().try_weeks(count)?,
            DateUnit::Month => Span::new().try_months(count)?,
            DateUnit::Quarter | DateUnit::FiscalQuarter => {
                Span::new().try_months(count.saturating_mul(3))?
            }
            DateUnit::Year | DateUnit::FiscalYear => Span::new().try_years(count)?,
        };
        Ok(datetime.checked_add(span)?)
    }
}

// Start of the `months` long block containing `date`, where blocks are aligned
// so one of them begins in `first_month`.
fn month_block_start(date: Date, months: i64, first_month: i8) -> Result<DateTime, CalendarError> {
    let index = i64::from(date.year()) * 12 + i64::from(date.month() - 1);
    let offset = i64::from(first_month - 1);
    let start = (index - offset).div_euclid(months) * months + offset;
    // At most one year before `date`, so the year still fits in i16.
    let year = start.div_euclid(12) as i16;
    let month = (start.rem_euclid(12) + 1) as i8;
    Ok(Date::new(year, month, 1)?.at(0, 0, 0, 0))
}

/// Half-open `[start, end)` span of civil time. A missing end is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: Option<DateTime>,
    pub end: Option<DateTime>,
}

impl DateWindow {
    pub fn between(start: DateTime, end: DateTime) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn before(end: DateTime) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }

    pub fn after(start: DateTime) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    pub fn contains(&self, datetime: DateTime) -> bool {
        self.start.is_none_or(|start| start <= datetime)
            && self.end.is_none_or(|end| datetime < end)
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.start {
            Some(start) => write!(f, "[{start}, ")?,
            None => f.write_str("(-inf, ")?,
        }
        match self.end {
            Some(end) => write!(f, "{end})"),
            None => f.write_str("inf)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    fn utc(config: CalendarConfig) -> Calendar {
        Calendar::new(config).unwrap().with_time_zone(TimeZone::UTC)
    }

    fn fiscal(month: i8) -> Calendar {
        utc(CalendarConfig {
            fiscal_year_start_month: month,
            ..CalendarConfig::default()
        })
    }

    #[test]
    fn week_start_follows_configuration() {
        // 2024-02-14 is a Wednesday.
        let wednesday = date(2024, 2, 14).at(10, 30, 0, 0);
        let monday_first = utc(CalendarConfig::default());
        assert_eq!(
            monday_first.start_of(wednesday, DateUnit::Week).unwrap(),
            date(2024, 2, 12).at(0, 0, 0, 0)
        );

        let sunday_first = utc(CalendarConfig {
            first_day_of_week: FirstDayOfWeek::Sunday,
            ..CalendarConfig::default()
        });
        assert_eq!(
            sunday_first.start_of(wednesday, DateUnit::Week).unwrap(),
            date(2024, 2, 11).at(0, 0, 0, 0)
        );
    }

    #[test]
    fn quarters_and_fiscal_periods() {
        let feb = date(2024, 2, 14).at(10, 30, 0, 0);
        let calendar = fiscal(4);
        assert_eq!(
            calendar.start_of(feb, DateUnit::Quarter).unwrap(),
            date(2024, 1, 1).at(0, 0, 0, 0)
        );
        assert_eq!(
            calendar.start_of(feb, DateUnit::FiscalQuarter).unwrap(),
            date(2024, 1, 1).at(0, 0, 0, 0)
        );
        assert_eq!(
            calendar.start_of(feb, DateUnit::FiscalYear).unwrap(),
            date(2023, 4, 1).at(0, 0, 0, 0)
        );

        let aug = date(2024, 8, 31).at(0, 0, 0, 0);
        assert_eq!(
            fiscal(11).start_of(aug, DateUnit::FiscalQuarter).unwrap(),
            date(2024, 8, 1).at(0, 0, 0, 0)
        );
        assert_eq!(
            fiscal(11).start_of(aug, DateUnit::FiscalYear).unwrap(),
            date(2023, 11, 1).at(0, 0, 0, 0)
        );
    }

    #[test]
    fn truncates_clock_units() {
        let calendar = utc(CalendarConfig::default());
        let dt = date(2024, 2, 14).at(10, 30, 45, 123);
        assert_eq!(
            calendar.start_of(dt, DateUnit::Second).unwrap(),
            date(2024, 2, 14).at(10, 30, 45, 0)
        );
        assert_eq!(
            calendar.start_of(dt, DateUnit::Minute).unwrap(),
            date(2024, 2, 14).at(10, 30, 0, 0)
        );
        assert_eq!(
            calendar.start_of(dt, DateUnit::Hour).unwrap(),
            date(2024, 2, 14).at(10, 0, 0, 0)
        );
        assert_eq!(
            calendar.start_of(dt, DateUnit::Year).unwrap(),
            date(2024, 1, 1).at(0, 0, 0, 0)
        );
    }

    #[test]
    fn adds_calendar_units() {
        let calendar = utc(CalendarConfig::default());
        let start = date(2024, 1, 1).at(0, 0, 0, 0);
        assert_eq!(
            calendar.add(start, DateUnit::Quarter, -1).unwrap(),
            date(2023, 10, 1).at(0, 0, 0, 0)
        );
        assert_eq!(
            calendar.add(start, DateUnit::Week, 2).unwrap(),
            date(2024, 1, 15).at(0, 0, 0, 0)
        );
        assert_eq!(
            calendar.add(start, DateUnit::Hour, 36).unwrap(),
            date(2024, 1, 2).at(12, 0, 0, 0)
        );
        assert!(matches!(
            calendar.add(start, DateUnit::Year, i64::MAX),
            Err(CalendarError::Arithmetic(_))
        ));
    }

    #[test]
    fn fixed_clock_pins_now() {
        let now: Timestamp = "2024-02-14T10:30:00Z".parse().unwrap();
        let calendar = Calendar::fixed(CalendarConfig::default(), now)
            .unwrap()
            .with_time_zone(TimeZone::UTC);
        assert_eq!(calendar.now().unwrap(), now);
        assert_eq!(
            calendar.to_local(now).unwrap(),
            date(2024, 2, 14).at(10, 30, 0, 0)
        );
    }

    #[test]
    fn rejects_bad_configuration() {
        for month in [0, 13, -1] {
            let err = Calendar::new(CalendarConfig {
                fiscal_year_start_month: month,
                ..CalendarConfig::default()
            })
            .unwrap_err();
            assert!(matches!(err, CalendarError::InvalidFiscalYearStart(m) if m == month));
        }

        let err = Calendar::new(CalendarConfig {
            time_zone: Some("Nowhere/Atlantis".into()),
            ..CalendarConfig::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("Nowhere/Atlantis"));
    }

    #[test]
    fn window_is_half_open() {
        let start = date(2024, 1, 1).at(0, 0, 0, 0);
        let end = date(2024, 2, 1).at(0, 0, 0, 0);
        let window = DateWindow::between(start, end);
        assert!(window.contains(start));
        assert!(!window.contains(end));
        assert!(DateWindow::before(end).contains(date(1900, 1, 1).at(0, 0, 0, 0)));
        assert!(!DateWindow::after(end).contains(start));
        assert_eq!(
            window.to_string(),
            "[2024-01-01T00:00:00, 2024-02-01T00:00:00)"
        );
    }
}
