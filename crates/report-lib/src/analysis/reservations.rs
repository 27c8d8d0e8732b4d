//! Reservation fleet summaries and expiration forecasting
//!
//! Reduces the staged reserved-instance inventory into fleet totals and a
//! forward-looking expiration forecast. The forecast horizon is the end of
//! the month two months ahead of the report window's end, so a report for
//! January flags everything ending before the last day of February.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::ReservedInstanceRecord;
use crate::report::ReportWindow;

/// Aggregate totals for the staged reservation fleet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationSummary {
    /// Total reservation units across all records
    pub total_active: i64,
    /// Total invested cost: sum of count times fixed price
    pub total_invested: f64,
    /// Present only when at least one unit ends before the horizon;
    /// `None` is the explicit "nothing expiring" signal
    pub expiring: Option<ExpiringReservations>,
}

/// Reservations ending before the forecast horizon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiringReservations {
    pub horizon: DateTime<Utc>,
    /// Total expiring reservation units
    pub total_count: i64,
    /// Per-type breakdown, ordered by instance type
    pub by_type: Vec<ExpiringByType>,
}

/// Expiring units sharing one instance type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiringByType {
    pub instance_type: String,
    pub count: i64,
    /// Expiring computational power: sum of count times normalization factor
    pub power: f64,
    /// Distinct end dates, ascending, with the units ending on each
    pub dates: Vec<ExpirationDate>,
}

/// Reservation units ending on one calendar day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpirationDate {
    pub date: NaiveDate,
    pub count: i64,
}

/// End of the month two months ahead of the window's end
pub fn expiration_horizon(window_end: DateTime<Utc>) -> DateTime<Utc> {
    let mut year = window_end.year();
    let mut month = window_end.month() + 2;
    if month > 12 {
        month -= 12;
        year += 1;
    }
    // First day of the month two ahead, stepped back one day, at end of day
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .expect("month arithmetic stays within 1..=12");
    let last = first.pred_opt().expect("dates in range have a predecessor");
    let end_of_day = last
        .and_hms_nano_opt(23, 59, 59, 999_999_999)
        .expect("constant time components are valid");
    Utc.from_utc_datetime(&end_of_day)
}

#[derive(Default)]
struct TypeAccumulator {
    count: i64,
    power: f64,
    dates: BTreeMap<NaiveDate, i64>,
}

/// Reduce the reservation inventory for one report window
pub fn summarize_reservations(
    records: &[ReservedInstanceRecord],
    window: &ReportWindow,
) -> ReservationSummary {
    let horizon = expiration_horizon(window.end);

    let mut total_active = 0i64;
    let mut total_invested = 0.0f64;
    let mut expiring_count = 0i64;
    let mut by_type: BTreeMap<String, TypeAccumulator> = BTreeMap::new();

    for record in records {
        total_active += record.instance_count;
        total_invested += record.instance_count as f64 * record.fixed_price;

        if record.end_date < horizon {
            expiring_count += record.instance_count;
            let acc = by_type.entry(record.instance_type.clone()).or_default();
            acc.count += record.instance_count;
            acc.power += record.instance_count as f64 * record.normalization_factor;
            *acc.dates.entry(record.end_date.date_naive()).or_insert(0) +=
                record.instance_count;
        }
    }

    let expiring = (expiring_count > 0).then(|| ExpiringReservations {
        horizon,
        total_count: expiring_count,
        by_type: by_type
            .into_iter()
            .map(|(instance_type, acc)| ExpiringByType {
                instance_type,
                count: acc.count,
                power: acc.power,
                dates: acc
                    .dates
                    .into_iter()
                    .map(|(date, count)| ExpirationDate { date, count })
                    .collect(),
            })
            .collect(),
    });

    ReservationSummary {
        total_active,
        total_invested,
        expiring,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Cadence, ReportWindow};
    use chrono::TimeZone;

    fn record(
        instance_type: &str,
        count: i64,
        fixed_price: f64,
        end: DateTime<Utc>,
    ) -> ReservedInstanceRecord {
        let (family, factor) = crate::normalization::family_and_factor(instance_type);
        ReservedInstanceRecord {
            id: format!("ri-{instance_type}-{count}"),
            instance_type: instance_type.to_string(),
            family,
            normalization_factor: factor,
            instance_count: count,
            fixed_price,
            usage_price: 0.0,
            currency: "USD".to_string(),
            start_date: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            end_date: end,
            state: "active".to_string(),
            offering_class: "standard".to_string(),
            scope: "Region".to_string(),
            availability_zone: String::new(),
            region: "us-east-1".to_string(),
        }
    }

    fn january_window() -> ReportWindow {
        ReportWindow {
            cadence: Cadence::Monthly,
            start: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap(),
        }
    }

    #[test]
    fn test_horizon_is_end_of_month_two_ahead() {
        let end = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();
        let horizon = expiration_horizon(end);
        assert_eq!(horizon.date_naive(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        // Year rollover
        let end = Utc.with_ymd_and_hms(2023, 11, 30, 23, 59, 59).unwrap();
        let horizon = expiration_horizon(end);
        assert_eq!(horizon.date_naive(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());

        let end = Utc.with_ymd_and_hms(2023, 12, 15, 12, 0, 0).unwrap();
        let horizon = expiration_horizon(end);
        assert_eq!(horizon.date_naive(), NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    }

    #[test]
    fn test_totals_cover_full_fleet() {
        let far_end = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let near_end = Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap();
        let records = vec![
            record("m5.xlarge", 3, 1000.0, far_end),
            record("c5.large", 2, 500.0, near_end),
        ];

        let summary = summarize_reservations(&records, &january_window());
        assert_eq!(summary.total_active, 5);
        assert!((summary.total_invested - 4000.0).abs() < 1e-9);

        let expiring = summary.expiring.expect("one reservation expires");
        assert_eq!(expiring.total_count, 2);
        assert!(expiring.total_count <= summary.total_active);
        assert_eq!(expiring.by_type.len(), 1);
        assert_eq!(expiring.by_type[0].instance_type, "c5.large");
        assert!((expiring.by_type[0].power - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_nothing_expiring_is_distinct() {
        let far_end = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let records = vec![record("m5.xlarge", 4, 1000.0, far_end)];

        let summary = summarize_reservations(&records, &january_window());
        assert_eq!(summary.total_active, 4);
        assert!(summary.expiring.is_none());
    }

    #[test]
    fn test_expiration_dates_collapse_duplicates() {
        let end = Utc.with_ymd_and_hms(2024, 2, 10, 8, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 2, 20, 8, 0, 0).unwrap();
        let records = vec![
            record("m5.xlarge", 2, 100.0, end),
            record("m5.xlarge", 1, 100.0, end),
            record("m5.xlarge", 1, 100.0, later),
        ];

        let summary = summarize_reservations(&records, &january_window());
        let expiring = summary.expiring.expect("expiring set present");
        let by_type = &expiring.by_type[0];
        assert_eq!(by_type.count, 4);
        assert_eq!(by_type.dates.len(), 2);
        assert_eq!(by_type.dates[0].date, NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
        assert_eq!(by_type.dates[0].count, 3);
        assert_eq!(by_type.dates[1].count, 1);
    }

    #[test]
    fn test_empty_inventory() {
        let summary = summarize_reservations(&[], &january_window());
        assert_eq!(summary.total_active, 0);
        assert_eq!(summary.total_invested, 0.0);
        assert!(summary.expiring.is_none());
    }
}
