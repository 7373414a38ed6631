use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::daily::{self, DayPolicy, LeaveCover};
use crate::core::workdays;
use crate::model::attendance::RawAttendanceRow;

/// Canonical per-date clock pair after normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DayClocks {
    pub clock_in: Option<NaiveDateTime>,
    pub clock_out: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub present_days: f64,
    pub working_days: u32,
    pub attendance_rate: f64,
    pub full_days: u32,
    pub half_days: u32,
    pub zero_days: u32,
    pub underwork_alerts: u32,
    pub overtime_hours: f64,
}

/// Folds raw rows from both the current and the legacy attendance tables
/// into one clock pair per calendar date.
///
/// Historical rows are messy: the owner may sit in `user_id` or `uid`, and
/// the date may be a string column or only derivable from the creation
/// timestamp. Resolution is deterministic: string date first, timestamp-
/// derived date only when no string date parses, and the first row seen for
/// a date wins (later duplicates only fill a missing clock-out).
pub fn normalize_rows(rows: &[RawAttendanceRow], user_id: u64) -> BTreeMap<NaiveDate, DayClocks> {
    let mut days: BTreeMap<NaiveDate, DayClocks> = BTreeMap::new();

    for row in rows {
        let owner = row.user_id.or(row.uid);
        if owner != Some(user_id) {
            continue;
        }

        let date = row
            .date
            .as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
            .or_else(|| row.created_at.map(|ts| ts.date_naive()));

        let Some(date) = date else {
            // No usable date at all; the row cannot be attributed to a day.
            continue;
        };

        let entry = days.entry(date).or_default();
        if entry.clock_in.is_none() {
            entry.clock_in = row.clock_in;
        }
        if entry.clock_out.is_none() {
            entry.clock_out = row.clock_out;
        }
    }

    days
}

/// Aggregates a month of normalized days into present-day counts and rate,
/// applying leave cover and administrative overrides. Pure: calling it twice
/// over the same inputs returns identical results.
pub fn summarize(
    year: i32,
    month: u32,
    days: &BTreeMap<NaiveDate, DayClocks>,
    leave_cover: &BTreeMap<NaiveDate, LeaveCover>,
    overrides: &BTreeMap<NaiveDate, f64>,
    holidays: &[NaiveDate],
    policy: &DayPolicy,
) -> MonthlySummary {
    let working_days = workdays::working_days(year, month, holidays);

    let in_month = |d: &NaiveDate| d.year() == year && d.month() == month;

    // Union of every date with recorded activity, leave cover, or an
    // override inside the target month.
    let mut dates: Vec<NaiveDate> = days
        .keys()
        .chain(leave_cover.keys())
        .chain(overrides.keys())
        .filter(|d| in_month(d))
        .copied()
        .collect();
    dates.sort();
    dates.dedup();

    let mut summary = MonthlySummary {
        year,
        month,
        present_days: 0.0,
        working_days,
        attendance_rate: 0.0,
        full_days: 0,
        half_days: 0,
        zero_days: 0,
        underwork_alerts: 0,
        overtime_hours: 0.0,
    };

    for date in dates {
        let clocks = days.get(&date).copied().unwrap_or_default();
        let status = daily::daily_status(
            clocks.clock_in,
            clocks.clock_out,
            leave_cover.get(&date).copied(),
            policy,
        );
        let status = daily::apply_override(status, overrides.get(&date).copied());

        summary.present_days += status.day_credit;
        summary.overtime_hours += status.overtime_hours;
        if status.underwork {
            summary.underwork_alerts += 1;
        }
        if status.day_credit >= 1.0 {
            summary.full_days += 1;
        } else if status.day_credit > 0.0 {
            summary.half_days += 1;
        } else {
            summary.zero_days += 1;
        }
    }

    // Documented edge case: a month with zero working days has rate 0, never
    // a division by zero.
    summary.attendance_rate = if working_days == 0 {
        0.0
    } else {
        summary.present_days / working_days as f64 * 100.0
    };

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    fn dt(day: u32, h: u32, m: u32) -> NaiveDateTime {
        d(day).and_hms_opt(h, m, 0).unwrap()
    }

    fn row(
        user_id: Option<u64>,
        uid: Option<u64>,
        date: Option<&str>,
        created_day: Option<u32>,
        clocks: Option<(NaiveDateTime, Option<NaiveDateTime>)>,
    ) -> RawAttendanceRow {
        RawAttendanceRow {
            user_id,
            uid,
            date: date.map(str::to_string),
            created_at: created_day
                .map(|day| Utc.with_ymd_and_hms(2026, 1, day, 9, 0, 0).unwrap()),
            clock_in: clocks.map(|(i, _)| i),
            clock_out: clocks.and_then(|(_, o)| o),
        }
    }

    #[test]
    fn normalize_prefers_string_date_over_timestamp() {
        // String date says the 5th even though the row was created the 6th.
        let rows = vec![row(
            Some(7),
            None,
            Some("2026-01-05"),
            Some(6),
            Some((dt(5, 9, 0), Some(dt(5, 17, 0)))),
        )];
        let days = normalize_rows(&rows, 7);
        assert!(days.contains_key(&d(5)));
        assert!(!days.contains_key(&d(6)));
    }

    #[test]
    fn normalize_falls_back_to_creation_timestamp() {
        let rows = vec![row(Some(7), None, None, Some(12), Some((dt(12, 9, 0), None)))];
        let days = normalize_rows(&rows, 7);
        assert!(days.contains_key(&d(12)));
    }

    #[test]
    fn normalize_accepts_legacy_uid_rows() {
        let rows = vec![
            row(Some(7), None, Some("2026-01-05"), None, Some((dt(5, 9, 0), None))),
            row(None, Some(7), Some("2026-01-06"), None, Some((dt(6, 9, 0), None))),
            row(None, Some(99), Some("2026-01-07"), None, Some((dt(7, 9, 0), None))),
        ];
        let days = normalize_rows(&rows, 7);
        assert_eq!(days.len(), 2);
        assert!(days.contains_key(&d(5)));
        assert!(days.contains_key(&d(6)));
    }

    #[test]
    fn duplicate_rows_for_a_date_count_once() {
        let rows = vec![
            row(Some(7), None, Some("2026-01-05"), None, Some((dt(5, 9, 0), None))),
            // Later duplicate fills in the missing clock-out only.
            row(Some(7), None, Some("2026-01-05"), None, Some((dt(5, 10, 0), Some(dt(5, 17, 0))))),
        ];
        let days = normalize_rows(&rows, 7);
        assert_eq!(days.len(), 1);
        let clocks = days[&d(5)];
        assert_eq!(clocks.clock_in, Some(dt(5, 9, 0)));
        assert_eq!(clocks.clock_out, Some(dt(5, 17, 0)));
    }

    #[test]
    fn undated_rows_are_dropped() {
        let rows = vec![row(Some(7), None, Some("not-a-date"), None, Some((dt(5, 9, 0), None)))];
        assert!(normalize_rows(&rows, 7).is_empty());
    }

    fn worked(day: u32, from: (u32, u32), to: (u32, u32)) -> (NaiveDate, DayClocks) {
        (
            d(day),
            DayClocks {
                clock_in: Some(dt(day, from.0, from.1)),
                clock_out: Some(dt(day, to.0, to.1)),
            },
        )
    }

    #[test]
    fn summarize_counts_credits_and_rate() {
        let days: BTreeMap<_, _> = vec![
            worked(5, (9, 0), (17, 0)),  // full
            worked(6, (9, 0), (13, 0)),  // half (4h, at threshold)
            worked(7, (9, 0), (19, 30)), // full + 2.5h overtime
        ]
        .into_iter()
        .collect();

        let s = summarize(
            2026,
            1,
            &days,
            &BTreeMap::new(),
            &BTreeMap::new(),
            &[],
            &DayPolicy::default(),
        );

        assert_eq!(s.present_days, 2.5);
        assert_eq!(s.working_days, 31);
        assert_eq!(s.full_days, 2);
        assert_eq!(s.half_days, 1);
        assert_eq!(s.zero_days, 0);
        assert!((s.overtime_hours - 2.5).abs() < 1e-9);
        assert!((s.attendance_rate - 2.5 / 31.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn summarize_is_idempotent() {
        let days: BTreeMap<_, _> = vec![worked(5, (9, 0), (17, 0))].into_iter().collect();
        let cover: BTreeMap<_, _> = vec![(d(8), LeaveCover::Paid)].into_iter().collect();
        let overrides: BTreeMap<_, _> = vec![(d(9), 0.5)].into_iter().collect();

        let a = summarize(2026, 1, &days, &cover, &overrides, &[], &DayPolicy::default());
        let b = summarize(2026, 1, &days, &cover, &overrides, &[], &DayPolicy::default());
        assert_eq!(a, b);
    }

    #[test]
    fn paid_leave_days_count_without_clocks() {
        let cover: BTreeMap<_, _> =
            vec![(d(8), LeaveCover::Paid), (d(9), LeaveCover::Unpaid)].into_iter().collect();
        let s = summarize(
            2026,
            1,
            &BTreeMap::new(),
            &cover,
            &BTreeMap::new(),
            &[],
            &DayPolicy::default(),
        );
        assert_eq!(s.present_days, 1.0);
        assert_eq!(s.full_days, 1);
        assert_eq!(s.zero_days, 1);
        assert_eq!(s.underwork_alerts, 0);
    }

    #[test]
    fn override_replaces_computed_credit() {
        let days: BTreeMap<_, _> = vec![worked(5, (9, 0), (17, 0))].into_iter().collect();
        let overrides: BTreeMap<_, _> = vec![(d(5), 0.0)].into_iter().collect();
        let s = summarize(2026, 1, &days, &BTreeMap::new(), &overrides, &[], &DayPolicy::default());
        assert_eq!(s.present_days, 0.0);
        assert_eq!(s.zero_days, 1);
    }

    #[test]
    fn cover_outside_the_month_is_ignored() {
        let cover: BTreeMap<_, _> = vec![(
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            LeaveCover::Paid,
        )]
        .into_iter()
        .collect();
        let s = summarize(
            2026,
            1,
            &BTreeMap::new(),
            &cover,
            &BTreeMap::new(),
            &[],
            &DayPolicy::default(),
        );
        assert_eq!(s.present_days, 0.0);
    }

    #[test]
    fn zero_working_days_never_divides() {
        let s = summarize(
            2026,
            13,
            &BTreeMap::new(),
            &BTreeMap::new(),
            &BTreeMap::new(),
            &[],
            &DayPolicy::default(),
        );
        assert_eq!(s.working_days, 0);
        assert_eq!(s.attendance_rate, 0.0);
    }
}
