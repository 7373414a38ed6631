use chrono::{Datelike, NaiveDate};

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match next {
        Some(first_of_next) => first_of_next.pred_opt().map(|d| d.day()).unwrap_or(0),
        None => 0,
    }
}

/// Every calendar date of the month, in order. Empty for an invalid month.
pub fn month_dates(year: i32, month: u32) -> Vec<NaiveDate> {
    (1..=days_in_month(year, month))
        .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .collect()
}

/// Number of official working days in a month: calendar days minus
/// configured holidays. Deterministic, no I/O.
pub fn working_days(year: i32, month: u32, holidays: &[NaiveDate]) -> u32 {
    month_dates(year, month)
        .into_iter()
        .filter(|d| !holidays.contains(d))
        .count() as u32
}
