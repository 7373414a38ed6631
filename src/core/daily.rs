use chrono::NaiveDateTime;

/// Day-credit policy knobs. Defaults mirror the standard 8h shift with a 4h
/// underwork threshold.
#[derive(Debug, Clone, Copy)]
pub struct DayPolicy {
    pub full_day_hours: f64,
    pub half_day_hours: f64,
}

impl Default for DayPolicy {
    fn default() -> Self {
        Self {
            full_day_hours: 8.0,
            half_day_hours: 4.0,
        }
    }
}

/// How an approved leave request covers a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveCover {
    /// Counts as a full present day without requiring a clock-in.
    Paid,
    /// Zero credit, but excluded from absence/underwork penalty flags.
    Unpaid,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyStatus {
    pub day_credit: f64,
    pub underwork: bool,
    pub overtime_hours: f64,
}

/// Worked hours between a clock-in/clock-out pair. Clamped at zero so a
/// corrupted pair (out before in) never produces negative hours.
pub fn shift_hours(clock_in: NaiveDateTime, clock_out: NaiveDateTime) -> f64 {
    let secs = (clock_out - clock_in).num_seconds();
    (secs.max(0) as f64) / 3600.0
}

/// Splits a shift into the regular and potential-overtime portions recorded
/// at clock-out time.
pub fn split_hours(total_hours: f64, policy: &DayPolicy) -> (f64, f64) {
    let regular = total_hours.min(policy.full_day_hours);
    let overtime = (total_hours - policy.full_day_hours).max(0.0);
    (regular, overtime)
}

/// Converts a day's raw clock pair (or lack of one) into a credit.
///
/// Resolved policy for the ambiguous cases:
/// - an open shift (clock-in without clock-out) earns 0 until the clock-out
///   is recorded, so incomplete shifts are never paid;
/// - a completed shift shorter than a full day earns 0.5, flagged underwork
///   when it is also shorter than the half-day threshold.
///
/// Leave cover applies when there is no full shift of its own; an
/// administrative override, applied by `apply_override`, beats everything.
pub fn daily_status(
    clock_in: Option<NaiveDateTime>,
    clock_out: Option<NaiveDateTime>,
    leave: Option<LeaveCover>,
    policy: &DayPolicy,
) -> DailyStatus {
    match leave {
        Some(LeaveCover::Paid) => {
            // Paid leave is a full day; hours worked on top of it still
            // count toward overtime.
            let overtime = match (clock_in, clock_out) {
                (Some(i), Some(o)) => split_hours(shift_hours(i, o), policy).1,
                _ => 0.0,
            };
            return DailyStatus {
                day_credit: 1.0,
                underwork: false,
                overtime_hours: overtime,
            };
        }
        Some(LeaveCover::Unpaid) => {
            return DailyStatus {
                day_credit: 0.0,
                underwork: false,
                overtime_hours: 0.0,
            };
        }
        None => {}
    }

    let (clock_in, clock_out) = match (clock_in, clock_out) {
        (Some(i), Some(o)) => (i, o),
        // Open shift or no activity at all.
        _ => {
            return DailyStatus {
                day_credit: 0.0,
                underwork: false,
                overtime_hours: 0.0,
            };
        }
    };

    let hours = shift_hours(clock_in, clock_out);

    if hours >= policy.full_day_hours {
        DailyStatus {
            day_credit: 1.0,
            underwork: false,
            overtime_hours: hours - policy.full_day_hours,
        }
    } else if hours > 0.0 {
        DailyStatus {
            day_credit: 0.5,
            underwork: hours < policy.half_day_hours,
            overtime_hours: 0.0,
        }
    } else {
        DailyStatus {
            day_credit: 0.0,
            underwork: false,
            overtime_hours: 0.0,
        }
    }
}

/// An admin override replaces the computed credit unconditionally and clears
/// the underwork flag (the correction is authoritative).
pub fn apply_override(status: DailyStatus, override_credit: Option<f64>) -> DailyStatus {
    match override_credit {
        Some(credit) => DailyStatus {
            day_credit: credit,
            underwork: false,
            overtime_hours: status.overtime_hours,
        },
        None => status,
    }
}
