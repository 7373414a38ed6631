use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::core::daily::LeaveCover;
use crate::error::ApiError;
use crate::model::leave::{LeaveStatus, LeaveType, PaymentType};
use crate::model::role::Role;

/// Fixed allocation of monthly-type leave days per calendar month.
pub const DEFAULT_MONTHLY_QUOTA: u32 = 2;

/// Who may decide whose leave. Admin decides for anyone; HR for everyone
/// below Admin/Sub-Admin; Sub-Admin only for the rank and file.
pub fn can_approve(approver: Role, target: Role) -> bool {
    match approver {
        Role::Admin => true,
        Role::Hr => !target.is_privileged(),
        Role::SubAdmin => matches!(target, Role::Employee | Role::TeamLead),
        Role::TeamLead | Role::Employee => false,
    }
}

/// Inclusive day count of a leave span.
pub fn span_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Days of `[start, end]` that fall inside the given calendar month.
pub fn days_in_month_span(start: NaiveDate, end: NaiveDate, year: i32, month: u32) -> u32 {
    let mut count = 0;
    let mut day = start;
    while day <= end {
        if day.year() == year && day.month() == month {
            count += 1;
        }
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    count
}

pub fn validate_dates(today: NaiveDate, start: NaiveDate, end: NaiveDate) -> Result<(), ApiError> {
    if start < today {
        return Err(ApiError::validation("start_date cannot be in the past"));
    }
    if end < start {
        return Err(ApiError::validation("end_date cannot be before start_date"));
    }
    Ok(())
}

/// Monthly-type quota check. Only `approved` requests are counted against
/// the allocation; pending ones do not reserve days. Every calendar month
/// the new span touches must stay within quota.
pub fn check_monthly_quota(
    leave_type: LeaveType,
    start: NaiveDate,
    end: NaiveDate,
    approved_monthly: &[(NaiveDate, NaiveDate)],
    quota: u32,
) -> Result<(), ApiError> {
    if leave_type != LeaveType::Monthly {
        return Ok(());
    }

    let mut month_cursor = (start.year(), start.month());
    let last = (end.year(), end.month());

    loop {
        let (year, month) = month_cursor;

        let requested = days_in_month_span(start, end, year, month);
        let already: u32 = approved_monthly
            .iter()
            .map(|(s, e)| days_in_month_span(*s, *e, year, month))
            .sum();

        if already + requested > quota {
            return Err(ApiError::validation("Monthly leave limit exceeded"));
        }

        if month_cursor == last {
            break;
        }
        month_cursor = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    }

    Ok(())
}

/// Approve/reject preconditions: only pending requests move, an approval
/// carries a payment type, a rejection carries a reason, and the approver's
/// role must dominate the requester's.
pub fn validate_decision(
    current: LeaveStatus,
    decision: LeaveStatus,
    approver: Role,
    requester: Role,
    payment_type: Option<PaymentType>,
    rejection_reason: Option<&str>,
) -> Result<(), ApiError> {
    if !can_approve(approver, requester) {
        return Err(ApiError::forbidden(
            "Your role cannot decide this leave request",
        ));
    }
    if current != LeaveStatus::Pending {
        return Err(ApiError::conflict("Leave request already processed"));
    }
    match decision {
        LeaveStatus::Approved => {
            if payment_type.is_none() {
                return Err(ApiError::validation(
                    "payment_type (paid or unpaid) is required for approval",
                ));
            }
        }
        LeaveStatus::Rejected => {
            if rejection_reason.map(str::trim).unwrap_or("").is_empty() {
                return Err(ApiError::validation(
                    "rejection_reason is required for rejection",
                ));
            }
        }
        LeaveStatus::Pending => {
            return Err(ApiError::validation("Decision must approve or reject"));
        }
    }
    Ok(())
}

/// `approved_at` is the approval timestamp; a rejection records the decider
/// in `approved_by` but leaves the timestamp unset.
pub fn records_approval_time(decision: LeaveStatus) -> bool {
    decision == LeaveStatus::Approved
}

/// Deletion is allowed for Admin/HR, or for the request owner, and only
/// while the request is still pending. (Deleting an approved request is an
/// Admin/HR reversion; see `delete_allows_reversion`.)
pub fn validate_delete(
    status: LeaveStatus,
    actor_role: Role,
    actor_id: u64,
    owner_id: u64,
) -> Result<(), ApiError> {
    let privileged = matches!(actor_role, Role::Admin | Role::Hr);

    match status {
        LeaveStatus::Pending => {
            if privileged || actor_id == owner_id {
                Ok(())
            } else {
                Err(ApiError::forbidden("Only the owner may delete this request"))
            }
        }
        LeaveStatus::Approved if privileged => Ok(()),
        _ => Err(ApiError::conflict("Only pending requests can be deleted")),
    }
}

/// An approved span plus how it pays out, the unit of reconciliation.
#[derive(Debug, Clone, Copy)]
pub struct ApprovedSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub payment: PaymentType,
}

/// Expands approved leave requests into a per-date cover map for one month.
///
/// Reconciliation is recompute-on-read: approval, rejection, and deletion
/// all just change the request rows, and this map is rebuilt from whatever
/// is approved right now. Re-applying the same approval can never
/// double-credit a day, and deleting an approved request reverts its days to
/// the raw attendance automatically. Paid cover wins where spans overlap.
pub fn leave_cover_map(
    spans: &[ApprovedSpan],
    year: i32,
    month: u32,
) -> BTreeMap<NaiveDate, LeaveCover> {
    let mut cover = BTreeMap::new();

    for span in spans {
        let mut day = span.start;
        while day <= span.end {
            if day.year() == year && day.month() == month {
                let value = match span.payment {
                    PaymentType::Paid => LeaveCover::Paid,
                    PaymentType::Unpaid => LeaveCover::Unpaid,
                };
                cover
                    .entry(day)
                    .and_modify(|existing| {
                        if value == LeaveCover::Paid {
                            *existing = LeaveCover::Paid;
                        }
                    })
                    .or_insert(value);
            }
            day = match day.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }
    }

    cover
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn approval_matrix_matches_policy() {
        use Role::*;
        let cases = [
            (Admin, Admin, true),
            (Admin, SubAdmin, true),
            (Admin, Hr, true),
            (Admin, TeamLead, true),
            (Admin, Employee, true),
            (SubAdmin, Admin, false),
            (SubAdmin, SubAdmin, false),
            (SubAdmin, Hr, false),
            (SubAdmin, TeamLead, true),
            (SubAdmin, Employee, true),
            (Hr, Admin, false),
            (Hr, SubAdmin, false),
            (Hr, Hr, true),
            (Hr, TeamLead, true),
            (Hr, Employee, true),
            (TeamLead, Employee, false),
            (Employee, Employee, false),
        ];
        for (approver, target, expected) in cases {
            assert_eq!(
                can_approve(approver, target),
                expected,
                "{approver:?} -> {target:?}"
            );
        }
    }

    #[test]
    fn span_days_is_inclusive() {
        assert_eq!(span_days(d(2026, 1, 5), d(2026, 1, 5)), 1);
        assert_eq!(span_days(d(2026, 1, 5), d(2026, 1, 7)), 3);
    }

    #[test]
    fn month_span_clamps_to_month() {
        assert_eq!(days_in_month_span(d(2026, 1, 30), d(2026, 2, 2), 2026, 1), 2);
        assert_eq!(days_in_month_span(d(2026, 1, 30), d(2026, 2, 2), 2026, 2), 2);
        assert_eq!(days_in_month_span(d(2026, 1, 30), d(2026, 2, 2), 2026, 3), 0);
    }

    #[test]
    fn past_start_date_is_rejected() {
        let today = d(2026, 1, 10);
        assert!(validate_dates(today, d(2026, 1, 9), d(2026, 1, 11)).is_err());
        assert!(validate_dates(today, d(2026, 1, 10), d(2026, 1, 9)).is_err());
        assert!(validate_dates(today, d(2026, 1, 10), d(2026, 1, 10)).is_ok());
    }

    #[test]
    fn three_day_monthly_request_exceeds_quota() {
        let err = check_monthly_quota(
            LeaveType::Monthly,
            d(2026, 1, 5),
            d(2026, 1, 7),
            &[],
            DEFAULT_MONTHLY_QUOTA,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Monthly leave limit exceeded"));
    }

    #[test]
    fn quota_counts_only_approved_days() {
        // Two days already approved in January: a one-day request must fail.
        let approved = vec![(d(2026, 1, 12), d(2026, 1, 13))];
        assert!(check_monthly_quota(
            LeaveType::Monthly,
            d(2026, 1, 20),
            d(2026, 1, 20),
            &approved,
            DEFAULT_MONTHLY_QUOTA,
        )
        .is_err());

        // With nothing approved, up to two days pass.
        assert!(check_monthly_quota(
            LeaveType::Monthly,
            d(2026, 1, 20),
            d(2026, 1, 21),
            &[],
            DEFAULT_MONTHLY_QUOTA,
        )
        .is_ok());
    }

    #[test]
    fn quota_applies_per_touched_month() {
        // One day in January and one in February: both months within quota.
        assert!(check_monthly_quota(
            LeaveType::Monthly,
            d(2026, 1, 31),
            d(2026, 2, 1),
            &[],
            DEFAULT_MONTHLY_QUOTA,
        )
        .is_ok());

        // February side already full.
        let approved = vec![(d(2026, 2, 10), d(2026, 2, 11))];
        assert!(check_monthly_quota(
            LeaveType::Monthly,
            d(2026, 1, 31),
            d(2026, 2, 1),
            &approved,
            DEFAULT_MONTHLY_QUOTA,
        )
        .is_err());
    }

    #[test]
    fn emergency_leave_skips_quota() {
        assert!(check_monthly_quota(
            LeaveType::Emergency,
            d(2026, 1, 1),
            d(2026, 1, 20),
            &[],
            DEFAULT_MONTHLY_QUOTA,
        )
        .is_ok());
    }

    #[test]
    fn decision_requires_pending_status() {
        let err = validate_decision(
            LeaveStatus::Approved,
            LeaveStatus::Rejected,
            Role::Admin,
            Role::Employee,
            None,
            Some("late"),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn hr_cannot_decide_for_admin() {
        let err = validate_decision(
            LeaveStatus::Pending,
            LeaveStatus::Approved,
            Role::Hr,
            Role::Admin,
            Some(PaymentType::Paid),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn approval_needs_payment_type_and_rejection_needs_reason() {
        assert!(validate_decision(
            LeaveStatus::Pending,
            LeaveStatus::Approved,
            Role::Admin,
            Role::Employee,
            None,
            None,
        )
        .is_err());

        assert!(validate_decision(
            LeaveStatus::Pending,
            LeaveStatus::Rejected,
            Role::Admin,
            Role::Employee,
            None,
            Some("  "),
        )
        .is_err());

        assert!(validate_decision(
            LeaveStatus::Pending,
            LeaveStatus::Approved,
            Role::Admin,
            Role::Employee,
            Some(PaymentType::Unpaid),
            None,
        )
        .is_ok());
    }

    #[test]
    fn only_approvals_carry_an_approval_timestamp() {
        assert!(records_approval_time(LeaveStatus::Approved));
        assert!(!records_approval_time(LeaveStatus::Rejected));
        assert!(!records_approval_time(LeaveStatus::Pending));
    }

    #[test]
    fn delete_rules() {
        // Owner may delete while pending.
        assert!(validate_delete(LeaveStatus::Pending, Role::Employee, 7, 7).is_ok());
        // A stranger may not.
        assert!(validate_delete(LeaveStatus::Pending, Role::Employee, 8, 7).is_err());
        // Admin/HR may delete pending unconditionally.
        assert!(validate_delete(LeaveStatus::Pending, Role::Hr, 1, 7).is_ok());
        // Approved requests revert only via Admin/HR.
        assert!(validate_delete(LeaveStatus::Approved, Role::Admin, 1, 7).is_ok());
        assert!(validate_delete(LeaveStatus::Approved, Role::Employee, 7, 7).is_err());
        // Rejected requests are immutable.
        assert!(validate_delete(LeaveStatus::Rejected, Role::Admin, 1, 7).is_err());
    }

    #[test]
    fn cover_map_expands_and_clamps_spans() {
        let spans = vec![ApprovedSpan {
            start: d(2026, 1, 30),
            end: d(2026, 2, 2),
            payment: PaymentType::Paid,
        }];
        let cover = leave_cover_map(&spans, 2026, 1);
        assert_eq!(cover.len(), 2);
        assert_eq!(cover[&d(2026, 1, 30)], LeaveCover::Paid);
        assert_eq!(cover[&d(2026, 1, 31)], LeaveCover::Paid);
    }

    #[test]
    fn cover_map_is_idempotent_under_duplicate_spans() {
        let span = ApprovedSpan {
            start: d(2026, 1, 5),
            end: d(2026, 1, 6),
            payment: PaymentType::Paid,
        };
        let once = leave_cover_map(&[span], 2026, 1);
        let twice = leave_cover_map(&[span, span], 2026, 1);
        assert_eq!(once, twice);
    }

    #[test]
    fn paid_cover_wins_over_unpaid_overlap() {
        let spans = vec![
            ApprovedSpan {
                start: d(2026, 1, 5),
                end: d(2026, 1, 5),
                payment: PaymentType::Unpaid,
            },
            ApprovedSpan {
                start: d(2026, 1, 5),
                end: d(2026, 1, 5),
                payment: PaymentType::Paid,
            },
        ];
        assert_eq!(leave_cover_map(&spans, 2026, 1)[&d(2026, 1, 5)], LeaveCover::Paid);
    }
}
