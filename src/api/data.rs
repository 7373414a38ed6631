//! Shared fetch helpers for the reconciliation read paths. Everything that
//! tolerates the heterogeneous historical tables lives here, so the business
//! rules in `core` only ever see canonical shapes.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::MySqlPool;

use crate::config::Config;
use crate::core::access::{self, Target, Viewer};
use crate::core::leave_policy::ApprovedSpan;
use crate::core::summary::{self, DayClocks, MonthlySummary};
use crate::core::workdays;
use crate::error::ApiError;
use crate::model::attendance::RawAttendanceRow;
use crate::model::leave::PaymentType;
use crate::model::role::Role;
use crate::model::user::UserScopeRow;

pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), ApiError> {
    let dates = workdays::month_dates(year, month);
    match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => Ok((*first, *last)),
        _ => Err(ApiError::validation("Invalid year/month")),
    }
}

pub async fn fetch_scope_row(pool: &MySqlPool, user_id: u64) -> Result<UserScopeRow, ApiError> {
    let row = sqlx::query_as::<_, UserScopeRow>(
        "SELECT id, username, role_id, manager_id FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.ok_or_else(|| ApiError::not_found("User not found"))
}

pub fn target_of(row: &UserScopeRow) -> Result<Target, ApiError> {
    let role = Role::from_id(row.role_id)
        .ok_or_else(|| ApiError::validation("User record carries an unknown role"))?;
    Ok(Target {
        id: row.id,
        role,
        manager_id: row.manager_id,
    })
}

pub fn require_attendance_scope(viewer: Viewer, target: Target) -> Result<(), ApiError> {
    if access::can_view_attendance(viewer, target) {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "Your role cannot view this user's attendance",
        ))
    }
}

pub fn require_payroll_scope(viewer: Viewer, target: Target) -> Result<(), ApiError> {
    if access::can_view_payroll(viewer, target) {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "Your role cannot view this user's payroll",
        ))
    }
}

/// Current attendance table: dated rows keyed by `user_id`.
#[derive(sqlx::FromRow)]
struct CurrentRow {
    user_id: u64,
    date: Option<String>,
    clock_in: Option<NaiveDateTime>,
    clock_out: Option<NaiveDateTime>,
}

/// Legacy table: rows keyed by `uid` with no date column of their own.
#[derive(sqlx::FromRow)]
struct LegacyRow {
    uid: u64,
    created_at: Option<DateTime<Utc>>,
    clock_in: Option<NaiveDateTime>,
    clock_out: Option<NaiveDateTime>,
}

/// One canonical clock pair per calendar date for the month, merged from the
/// current and legacy tables.
pub async fn fetch_month_clocks(
    pool: &MySqlPool,
    user_id: u64,
    year: i32,
    month: u32,
) -> Result<BTreeMap<NaiveDate, DayClocks>, ApiError> {
    let (first, last) = month_bounds(year, month)?;

    let current = sqlx::query_as::<_, CurrentRow>(
        r#"
        SELECT user_id, DATE_FORMAT(date, '%Y-%m-%d') AS date, clock_in, clock_out
        FROM attendance
        WHERE user_id = ? AND date BETWEEN ? AND ?
        ORDER BY id
        "#,
    )
    .bind(user_id)
    .bind(first)
    .bind(last)
    .fetch_all(pool)
    .await?;

    let legacy = sqlx::query_as::<_, LegacyRow>(
        r#"
        SELECT uid, created_at, clock_in, clock_out
        FROM attendance_records
        WHERE uid = ? AND created_at >= ? AND created_at < DATE_ADD(?, INTERVAL 1 DAY)
        ORDER BY id
        "#,
    )
    .bind(user_id)
    .bind(first)
    .bind(last)
    .fetch_all(pool)
    .await?;

    let mut raw: Vec<RawAttendanceRow> = Vec::with_capacity(current.len() + legacy.len());
    raw.extend(current.into_iter().map(|r| RawAttendanceRow {
        user_id: Some(r.user_id),
        uid: None,
        date: r.date,
        created_at: None,
        clock_in: r.clock_in,
        clock_out: r.clock_out,
    }));
    raw.extend(legacy.into_iter().map(|r| RawAttendanceRow {
        user_id: None,
        uid: Some(r.uid),
        date: None,
        created_at: r.created_at,
        clock_in: r.clock_in,
        clock_out: r.clock_out,
    }));

    Ok(summary::normalize_rows(&raw, user_id))
}

pub async fn fetch_overrides(
    pool: &MySqlPool,
    user_id: u64,
    year: i32,
    month: u32,
) -> Result<BTreeMap<NaiveDate, f64>, ApiError> {
    let (first, last) = month_bounds(year, month)?;

    let rows = sqlx::query_as::<_, (NaiveDate, f64)>(
        r#"
        SELECT date, day_credit
        FROM attendance_overrides
        WHERE user_id = ? AND date BETWEEN ? AND ?
        "#,
    )
    .bind(user_id)
    .bind(first)
    .bind(last)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().collect())
}

/// Approved leave spans overlapping the month, ready for cover expansion.
pub async fn fetch_approved_spans(
    pool: &MySqlPool,
    user_id: u64,
    year: i32,
    month: u32,
) -> Result<Vec<ApprovedSpan>, ApiError> {
    let (first, last) = month_bounds(year, month)?;

    let rows = sqlx::query_as::<_, (NaiveDate, NaiveDate, Option<String>)>(
        r#"
        SELECT start_date, end_date, payment_type
        FROM leave_requests
        WHERE user_id = ? AND status = 'approved'
          AND start_date <= ? AND end_date >= ?
        "#,
    )
    .bind(user_id)
    .bind(last)
    .bind(first)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(start, end, payment)| {
            let payment = payment?.parse::<PaymentType>().ok()?;
            Some(ApprovedSpan { start, end, payment })
        })
        .collect())
}

/// The full reconciled month: raw clocks, leave cover, and overrides folded
/// into one summary.
pub async fn monthly_summary(
    pool: &MySqlPool,
    config: &Config,
    user_id: u64,
    year: i32,
    month: u32,
) -> Result<MonthlySummary, ApiError> {
    let clocks = fetch_month_clocks(pool, user_id, year, month).await?;
    let overrides = fetch_overrides(pool, user_id, year, month).await?;
    let spans = fetch_approved_spans(pool, user_id, year, month).await?;
    let cover = crate::core::leave_policy::leave_cover_map(&spans, year, month);

    Ok(summary::summarize(
        year,
        month,
        &clocks,
        &cover,
        &overrides,
        &config.holidays,
        &config.day_policy(),
    ))
}
