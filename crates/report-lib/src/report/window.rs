//! Report window computation
//!
//! Windows always cover a completed calendar period: the previous full
//! Sunday-through-Saturday week or the previous full month, never the
//! period still in progress.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Days in a mean month, used for monthly per-day cost estimates
pub const MEAN_MONTH_DAYS: f64 = 30.4365;

/// Reporting cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Weekly,
    Monthly,
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cadence::Weekly => write!(f, "weekly"),
            Cadence::Monthly => write!(f, "monthly"),
        }
    }
}

/// One closed reporting period
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReportWindow {
    pub cadence: Cadence,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportWindow {
    /// Most recent completed window for a cadence, relative to `now`
    pub fn for_cadence(cadence: Cadence, now: DateTime<Utc>) -> Self {
        match cadence {
            Cadence::Weekly => Self::previous_week(now),
            Cadence::Monthly => Self::previous_month(now),
        }
    }

    /// The previous full calendar week, Sunday through Saturday
    pub fn previous_week(now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let weekday = today.weekday().num_days_from_sunday() as i64;
        let start_date = today - Duration::days(weekday + 7);
        let end_date = today - Duration::days(weekday + 1);
        Self {
            cadence: Cadence::Weekly,
            start: start_of_day(start_date),
            end: end_of_day(end_date),
        }
    }

    /// The previous full calendar month
    pub fn previous_month(now: DateTime<Utc>) -> Self {
        let (prev_year, prev_month) = if now.month() == 1 {
            (now.year() - 1, 12)
        } else {
            (now.year(), now.month() - 1)
        };
        let first = NaiveDate::from_ymd_opt(prev_year, prev_month, 1)
            .expect("month arithmetic stays within 1..=12");
        let first_of_current = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
            .expect("current date has a valid month start");
        let last = first_of_current
            .pred_opt()
            .expect("dates in range have a predecessor");
        Self {
            cadence: Cadence::Monthly,
            start: start_of_day(first),
            end: end_of_day(last),
        }
    }

    /// Window length in hours
    pub fn hours(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 3_600_000.0
    }

    /// Days billed against this window: a fixed seven for weekly reports,
    /// a mean month for monthly ones
    pub fn days(&self) -> f64 {
        match self.cadence {
            Cadence::Weekly => 7.0,
            Cadence::Monthly => MEAN_MONTH_DAYS,
        }
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .expect("constant time components are valid");
    Utc.from_utc_datetime(&midnight)
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let end = date
        .and_hms_nano_opt(23, 59, 59, 999_999_999)
        .expect("constant time components are valid");
    Utc.from_utc_datetime(&end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_previous_week_from_midweek() {
        // Wednesday 2024-01-17
        let now = Utc.with_ymd_and_hms(2024, 1, 17, 15, 30, 0).unwrap();
        let window = ReportWindow::previous_week(now);

        assert_eq!(window.start.date_naive(), NaiveDate::from_ymd_opt(2024, 1, 7).unwrap());
        assert_eq!(window.end.date_naive(), NaiveDate::from_ymd_opt(2024, 1, 13).unwrap());
        assert_eq!(window.start.date_naive().weekday(), chrono::Weekday::Sun);
        assert_eq!(window.end.date_naive().weekday(), chrono::Weekday::Sat);
    }

    #[test]
    fn test_previous_week_from_sunday_excludes_current() {
        // Sunday itself still reports on the week before
        let now = Utc.with_ymd_and_hms(2024, 1, 14, 0, 5, 0).unwrap();
        let window = ReportWindow::previous_week(now);
        assert_eq!(window.start.date_naive(), NaiveDate::from_ymd_opt(2024, 1, 7).unwrap());
        assert_eq!(window.end.date_naive(), NaiveDate::from_ymd_opt(2024, 1, 13).unwrap());
        assert!(window.end < now);
    }

    #[test]
    fn test_previous_month() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap();
        let window = ReportWindow::previous_month(now);
        assert_eq!(window.start.date_naive(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(window.end.date_naive(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_previous_month_january_rolls_to_december() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let window = ReportWindow::previous_month(now);
        assert_eq!(window.start.date_naive(), NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        assert_eq!(window.end.date_naive(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn test_window_hours() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let window = ReportWindow {
            cadence: Cadence::Monthly,
            start,
            end: start + Duration::hours(730),
        };
        assert!((window.hours() - 730.0).abs() < 1e-9);

        let weekly = ReportWindow::previous_week(Utc.with_ymd_and_hms(2024, 1, 17, 0, 0, 0).unwrap());
        assert!((weekly.hours() - 168.0).abs() < 0.001);
    }

    #[test]
    fn test_window_days_by_cadence() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        assert_eq!(ReportWindow::previous_week(now).days(), 7.0);
        assert_eq!(ReportWindow::previous_month(now).days(), MEAN_MONTH_DAYS);
    }
}
