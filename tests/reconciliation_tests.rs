//! End-to-end properties of the reconciliation engine: raw clock pairs,
//! leave cover and overrides folded into monthly summaries and payroll.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};

use wfm::core::daily::DayPolicy;
use wfm::core::leave_policy::{ApprovedSpan, leave_cover_map};
use wfm::core::payroll;
use wfm::core::summary::{DayClocks, summarize};
use wfm::core::workdays;
use wfm::model::leave::PaymentType;
use wfm::model::user::SalaryType;

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
}

fn dt(day: u32, h: u32, m: u32) -> NaiveDateTime {
    d(day).and_hms_opt(h, m, 0).unwrap()
}

fn shift(day: u32, from: (u32, u32), to: (u32, u32)) -> (NaiveDate, DayClocks) {
    (
        d(day),
        DayClocks {
            clock_in: Some(dt(day, from.0, from.1)),
            clock_out: Some(dt(day, to.0, to.1)),
        },
    )
}

/// A worked week: four full days and a half day.
fn week_of_clocks() -> BTreeMap<NaiveDate, DayClocks> {
    vec![
        shift(5, (9, 0), (17, 0)),
        shift(6, (9, 0), (17, 30)),
        shift(7, (9, 0), (18, 30)), // 1.5h overtime
        shift(8, (9, 0), (17, 0)),
        shift(9, (9, 0), (14, 0)), // half day
    ]
    .into_iter()
    .collect()
}

#[test]
fn approval_then_deletion_restores_present_days() {
    let clocks = week_of_clocks();
    let policy = DayPolicy::default();
    let no_overrides = BTreeMap::new();

    let before = summarize(2026, 1, &clocks, &BTreeMap::new(), &no_overrides, &[], &policy);

    // Approve two days of paid leave on days with no attendance.
    let span = ApprovedSpan {
        start: d(12),
        end: d(13),
        payment: PaymentType::Paid,
    };
    let cover = leave_cover_map(&[span], 2026, 1);
    let with_leave = summarize(2026, 1, &clocks, &cover, &no_overrides, &[], &policy);
    assert_eq!(with_leave.present_days, before.present_days + 2.0);

    // Deleting the approved request removes its cover; the next summary
    // recomputes from the raw attendance alone.
    let reverted = summarize(2026, 1, &clocks, &BTreeMap::new(), &no_overrides, &[], &policy);
    assert_eq!(reverted, before);
}

#[test]
fn reapplying_the_same_approval_does_not_double_credit() {
    let clocks = week_of_clocks();
    let policy = DayPolicy::default();
    let span = ApprovedSpan {
        start: d(12),
        end: d(13),
        payment: PaymentType::Paid,
    };

    let once = summarize(
        2026,
        1,
        &clocks,
        &leave_cover_map(&[span], 2026, 1),
        &BTreeMap::new(),
        &[],
        &policy,
    );
    let twice = summarize(
        2026,
        1,
        &clocks,
        &leave_cover_map(&[span, span], 2026, 1),
        &BTreeMap::new(),
        &[],
        &policy,
    );

    assert_eq!(once, twice);
}

#[test]
fn unpaid_leave_reduces_pay_but_not_penalties() {
    let clocks = week_of_clocks();
    let policy = DayPolicy::default();
    let span = ApprovedSpan {
        start: d(12),
        end: d(12),
        payment: PaymentType::Unpaid,
    };
    let cover = leave_cover_map(&[span], 2026, 1);

    let s = summarize(2026, 1, &clocks, &cover, &BTreeMap::new(), &[], &policy);
    let baseline = summarize(2026, 1, &clocks, &BTreeMap::new(), &BTreeMap::new(), &[], &policy);

    assert_eq!(s.present_days, baseline.present_days);
    assert_eq!(s.zero_days, baseline.zero_days + 1);
    assert_eq!(s.underwork_alerts, baseline.underwork_alerts);
}

#[test]
fn paid_leave_flows_through_to_payroll() {
    let clocks = week_of_clocks();
    let policy = DayPolicy::default();
    let holidays: Vec<NaiveDate> = Vec::new();

    let working_days = workdays::working_days(2026, 1, &holidays);
    assert_eq!(working_days, 31);

    let span = ApprovedSpan {
        start: d(12),
        end: d(13),
        payment: PaymentType::Paid,
    };
    let cover = leave_cover_map(&[span], 2026, 1);
    let summary = summarize(2026, 1, &clocks, &cover, &BTreeMap::new(), &holidays, &policy);

    // 4 full + 1 half + 2 paid leave days
    assert_eq!(summary.present_days, 6.5);

    let figures = payroll::compute(
        SalaryType::Monthly,
        3100.0,
        summary.present_days,
        working_days,
        0.0,
        0.0,
    );
    assert_eq!(figures.salary_paid, 650.00);
}

#[test]
fn documented_payroll_scenario() {
    // monthly salary 3000, 25 working days, 20 present -> 2400.00
    let figures = payroll::compute(SalaryType::Monthly, 3000.0, 20.0, 25, 0.0, 0.0);
    assert_eq!(figures.salary_paid, 2400.00);
}

#[test]
fn override_wins_over_leave_cover() {
    let policy = DayPolicy::default();
    let cover = leave_cover_map(
        &[ApprovedSpan {
            start: d(12),
            end: d(12),
            payment: PaymentType::Paid,
        }],
        2026,
        1,
    );
    let overrides: BTreeMap<NaiveDate, f64> = vec![(d(12), 0.0)].into_iter().collect();

    let s = summarize(2026, 1, &BTreeMap::new(), &cover, &overrides, &[], &policy);
    assert_eq!(s.present_days, 0.0);
}

#[test]
fn holidays_shrink_the_denominator_not_the_credits() {
    let clocks = week_of_clocks();
    let policy = DayPolicy::default();
    let holidays = vec![d(1), d(26)];

    let s = summarize(2026, 1, &clocks, &BTreeMap::new(), &BTreeMap::new(), &holidays, &policy);
    assert_eq!(s.working_days, 29);
    assert_eq!(s.present_days, 4.5);
    assert!((s.attendance_rate - 4.5 / 29.0 * 100.0).abs() < 1e-9);
}
