//! Date-range resolution
//!
//! Turns the caller's range token into a concrete, inclusive `[start, end]` window.
//! Calendar boundaries (midnight, Jan 1, end of day) are taken in the dashboard's
//! configured UTC offset; the resulting bounds are plain UTC instants.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::error::{DashboardError, DashboardResult};

/// Inclusive time window every aggregate is computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }
}

/// A caller-supplied range, before it is pinned to "now"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RangeSpec {
    Last24Hours,
    #[default]
    Last7Days,
    Last30Days,
    /// Jan 1 of the current year until now
    YearToDate,
    /// Trailing twelve months
    LastYear,
    /// The whole previous calendar year
    PreviousYear,
    Explicit { start: String, end: String },
}

impl RangeSpec {
    pub fn from_keyword(keyword: &str) -> DashboardResult<Self> {
        match keyword.trim() {
            "24h" => Ok(Self::Last24Hours),
            "7d" => Ok(Self::Last7Days),
            "30d" => Ok(Self::Last30Days),
            "ytd" => Ok(Self::YearToDate),
            "1y" => Ok(Self::LastYear),
            "ly" => Ok(Self::PreviousYear),
            other => Err(DashboardError::InvalidRange(format!("unknown range '{other}'"))),
        }
    }

    /// Build a range from the query-string pieces the dashboard sends.
    ///
    /// An explicit pair wins over a keyword; a lone `startDate` or `endDate` is rejected.
    pub fn from_parts(
        range: Option<&str>,
        start: Option<&str>,
        end: Option<&str>,
    ) -> DashboardResult<Self> {
        let start = start.map(str::trim).filter(|s| !s.is_empty());
        let end = end.map(str::trim).filter(|s| !s.is_empty());
        match (start, end) {
            (Some(start), Some(end)) => Ok(Self::Explicit {
                start: start.to_string(),
                end: end.to_string(),
            }),
            (Some(_), None) | (None, Some(_)) => Err(DashboardError::InvalidRange(
                "startDate and endDate must be given together".to_string(),
            )),
            (None, None) => match range.map(str::trim).filter(|r| !r.is_empty()) {
                Some(keyword) => Self::from_keyword(keyword),
                None => Ok(Self::default()),
            },
        }
    }
}

/// Pin `spec` to a concrete window relative to `now`
pub fn resolve(
    spec: &RangeSpec,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> DashboardResult<DateWindow> {
    let window = match spec {
        RangeSpec::Last24Hours => DateWindow {
            start: now - Duration::hours(24),
            end: now,
        },
        RangeSpec::Last7Days => DateWindow {
            start: now - Duration::days(7),
            end: now,
        },
        RangeSpec::Last30Days => DateWindow {
            start: now - Duration::days(30),
            end: now,
        },
        RangeSpec::YearToDate => {
            let year = now.with_timezone(&offset).year();
            DateWindow {
                start: start_of_day(jan_first(year)?, offset)?,
                end: now,
            }
        }
        RangeSpec::LastYear => DateWindow {
            start: now.checked_sub_months(Months::new(12)).ok_or_else(|| {
                DashboardError::InvalidRange("cannot go back one year".to_string())
            })?,
            end: now,
        },
        RangeSpec::PreviousYear => {
            let year = now.with_timezone(&offset).year() - 1;
            DateWindow {
                start: start_of_day(jan_first(year)?, offset)?,
                end: end_of_day(dec_thirty_first(year)?, offset)?,
            }
        }
        RangeSpec::Explicit { start, end } => {
            let start = parse_start(start, offset)?;
            let end = parse_end(end, offset)?;
            if start > end {
                return Err(DashboardError::InvalidRange(format!(
                    "start {} is after end {}",
                    start.to_rfc3339(),
                    end.to_rfc3339()
                )));
            }
            DateWindow { start, end }
        }
    };
    Ok(window)
}

fn jan_first(year: i32) -> DashboardResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| year_out_of_range(year))
}

fn dec_thirty_first(year: i32) -> DashboardResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(|| year_out_of_range(year))
}

fn year_out_of_range(year: i32) -> DashboardError {
    DashboardError::InvalidRange(format!("year {year} out of range"))
}

fn local_to_utc(local: NaiveDateTime, offset: FixedOffset) -> DashboardResult<DateTime<Utc>> {
    local
        .checked_sub_signed(Duration::seconds(i64::from(offset.local_minus_utc())))
        .map(|utc| utc.and_utc())
        .ok_or_else(|| DashboardError::InvalidRange(format!("{local} is out of range")))
}

fn start_of_day(date: NaiveDate, offset: FixedOffset) -> DashboardResult<DateTime<Utc>> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| DashboardError::InvalidRange(format!("no midnight for {date}")))?;
    local_to_utc(midnight, offset)
}

/// 23:59:59.999 local time on `date`
fn end_of_day(date: NaiveDate, offset: FixedOffset) -> DashboardResult<DateTime<Utc>> {
    let last = date
        .and_hms_milli_opt(23, 59, 59, 999)
        .ok_or_else(|| DashboardError::InvalidRange(format!("no end of day for {date}")))?;
    local_to_utc(last, offset)
}

enum Bound {
    Date(NaiveDate),
    Instant(DateTime<Utc>),
}

fn parse_bound(raw: &str) -> DashboardResult<Bound> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Bound::Date(date));
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Bound::Instant(ts.with_timezone(&Utc)));
    }
    Err(DashboardError::InvalidRange(format!("cannot parse date '{raw}'")))
}

fn parse_start(raw: &str, offset: FixedOffset) -> DashboardResult<DateTime<Utc>> {
    match parse_bound(raw)? {
        Bound::Date(date) => start_of_day(date, offset),
        Bound::Instant(ts) => Ok(ts),
    }
}

/// End bounds always stretch to the end of their calendar day
fn parse_end(raw: &str, offset: FixedOffset) -> DashboardResult<DateTime<Utc>> {
    let date = match parse_bound(raw)? {
        Bound::Date(date) => date,
        Bound::Instant(ts) => ts.with_timezone(&offset).date_naive(),
    };
    end_of_day(date, offset)
}
