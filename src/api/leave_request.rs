use crate::api::data;
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::core::access::{self, Target};
use crate::core::leave_policy;
use crate::error::ApiError;
use crate::model::leave::{
    LeaveBalance, LeaveBucket, LeaveRequest, LeaveStatus, LeaveType, PaymentType,
};
use crate::model::role::Role;
use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "monthly")]
    pub leave_type: LeaveType,
    #[schema(example = "2026-02-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-02-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "family visit")]
    pub reason: String,
}

#[derive(Deserialize, ToSchema)]
pub struct DecideLeave {
    #[schema(example = "approved")]
    pub status: LeaveStatus,
    #[schema(example = "paid")]
    pub payment_type: Option<PaymentType>,
    #[schema(example = "staffing too thin that week")]
    pub rejection_reason: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by requester
    #[schema(example = 7)]
    pub user_id: Option<u64>,
    /// Filter by leave status
    #[schema(example = "pending")]
    pub status: Option<String>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u64>,
    /// Pagination per page number
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: usize,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

/// Approved monthly-type spans of this user that touch the months the new
/// request spans; input to the quota check.
async fn approved_monthly_spans(
    pool: &MySqlPool,
    user_id: u64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<(NaiveDate, NaiveDate)>, ApiError> {
    let (window_start, _) = data::month_bounds(
        chrono::Datelike::year(&start),
        chrono::Datelike::month(&start),
    )?;
    let (_, window_end) =
        data::month_bounds(chrono::Datelike::year(&end), chrono::Datelike::month(&end))?;

    let rows = sqlx::query_as::<_, (NaiveDate, NaiveDate)>(
        r#"
        SELECT start_date, end_date
        FROM leave_requests
        WHERE user_id = ? AND leave_type = 'monthly' AND status = 'approved'
          AND start_date <= ? AND end_date >= ?
        "#,
    )
    .bind(user_id)
    .bind(window_end)
    .bind(window_start)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/* =========================
Submit leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body = CreateLeave,
    responses(
        (status = 200, description = "Leave request submitted", body = Object, example = json!({
            "message": "Leave request submitted",
            "status": "pending"
        })),
        (status = 400, description = "Bad dates or quota exceeded"),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Store unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let today = Utc::now().date_naive();
    leave_policy::validate_dates(today, payload.start_date, payload.end_date)?;

    if payload.reason.trim().is_empty() {
        return Err(ApiError::validation("A reason is required").into());
    }

    let approved =
        approved_monthly_spans(pool.get_ref(), auth.user_id, payload.start_date, payload.end_date)
            .await?;
    leave_policy::check_monthly_quota(
        payload.leave_type,
        payload.start_date,
        payload.end_date,
        &approved,
        config.monthly_leave_quota,
    )?;

    sqlx::query(
        r#"
        INSERT INTO leave_requests
            (user_id, user_name, role_id, leave_type, start_date, end_date, reason, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, 'pending')
        "#,
    )
    .bind(auth.user_id)
    .bind(&auth.username)
    .bind(auth.role.id())
    .bind(payload.leave_type.as_str())
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.reason.trim())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id = auth.user_id, "Failed to create leave request");
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave request submitted",
        "status": "pending"
    })))
}

async fn fetch_request(pool: &MySqlPool, id: u64) -> Result<LeaveRequest, ApiError> {
    let request = sqlx::query_as::<_, LeaveRequest>(
        r#"
        SELECT id, user_id, user_name, role_id, leave_type, start_date, end_date,
               reason, status, payment_type, rejection_reason,
               approved_by, approved_at, requested_at
        FROM leave_requests
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    request.ok_or_else(|| ApiError::not_found("Leave request not found"))
}

fn requester_role(request: &LeaveRequest) -> Result<Role, ApiError> {
    Role::from_id(request.role_id)
        .ok_or_else(|| ApiError::validation("Leave request carries an unknown role"))
}

/* =========================
Decide leave (approve/reject)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/decide",
    params(("leave_id" = u64, Path, description = "ID of the leave request")),
    request_body = DecideLeave,
    responses(
        (status = 200, description = "Decision recorded"),
        (status = 400, description = "Missing payment type or rejection reason"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Approver role cannot decide for this requester"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn decide_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: web::Json<DecideLeave>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();
    let request = fetch_request(pool.get_ref(), leave_id).await?;
    let current = request
        .status
        .parse::<LeaveStatus>()
        .map_err(|_| ApiError::validation("Leave request carries an unknown status"))?;

    leave_policy::validate_decision(
        current,
        payload.status,
        auth.role,
        requester_role(&request)?,
        payload.payment_type,
        payload.rejection_reason.as_deref(),
    )?;

    // The submit-time quota check only sees what was approved back then, so
    // two pending monthly requests could both pass it. Re-checking against
    // the approved set here keeps the monthly allocation a hard ceiling.
    if payload.status == LeaveStatus::Approved {
        if let Ok(leave_type) = request.leave_type.parse::<LeaveType>() {
            let approved = approved_monthly_spans(
                pool.get_ref(),
                request.user_id,
                request.start_date,
                request.end_date,
            )
            .await?;
            leave_policy::check_monthly_quota(
                leave_type,
                request.start_date,
                request.end_date,
                &approved,
                config.monthly_leave_quota,
            )?;
        }
    }

    // status = 'pending' in the WHERE clause is the race guard: two
    // concurrent decisions cannot both pass it. approved_at is the approval
    // timestamp, so a rejection leaves it NULL.
    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?, payment_type = ?, rejection_reason = ?,
            approved_by = ?, approved_at = IF(?, NOW(), NULL)
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(payload.status.as_str())
    .bind(payload.payment_type.map(|p| p.as_str()))
    .bind(payload.rejection_reason.as_deref().map(str::trim))
    .bind(auth.user_id)
    .bind(leave_policy::records_approval_time(payload.status))
    .bind(leave_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Leave decision failed");
        ApiError::from(e)
    })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::conflict("Leave request already processed").into());
    }

    tracing::info!(
        leave_id,
        decision = payload.status.as_str(),
        approver = auth.user_id,
        "Leave decision recorded"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Leave {}", payload.status.as_str())
    })))
}

/* =========================
Delete leave (owner while pending; Admin/HR may revert approved)
========================= */
#[utoipa::path(
    delete,
    path = "/api/leave/{leave_id}",
    params(("leave_id" = u64, Path, description = "ID of the leave request")),
    responses(
        (status = 200, description = "Leave request deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Not pending")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn delete_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();
    let request = fetch_request(pool.get_ref(), leave_id).await?;
    let status = request
        .status
        .parse::<LeaveStatus>()
        .map_err(|_| ApiError::validation("Leave request carries an unknown status"))?;

    leave_policy::validate_delete(status, auth.role, auth.user_id, request.user_id)?;

    sqlx::query("DELETE FROM leave_requests WHERE id = ?")
        .bind(leave_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Leave delete failed");
            ApiError::from(e)
        })?;

    // Leave cover is recomputed from approved requests on every summary
    // read, so deleting an approved request reverts the affected days to
    // their raw attendance without any further write.
    if status == LeaveStatus::Approved {
        tracing::info!(
            leave_id,
            user_id = request.user_id,
            "Approved leave deleted; attendance reverts to raw records"
        );
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave request deleted"
    })))
}

/* =========================
Get one leave request
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(("leave_id" = u64, Path, description = "ID of the leave request")),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Out of scope for this role"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request = fetch_request(pool.get_ref(), path.into_inner()).await?;

    let row = data::fetch_scope_row(pool.get_ref(), request.user_id).await?;
    data::require_attendance_scope(auth.viewer(), data::target_of(&row)?)?;

    Ok(HttpResponse::Ok().json(request))
}

/* =========================
List leave requests (role-scoped)
========================= */
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated scoped leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(user_id) = query.user_id {
        where_sql.push_str(" AND lr.user_id = ?");
        args.push(FilterValue::U64(user_id));
    }

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND lr.status = ?");
        args.push(FilterValue::Str(status));
    }

    // The role scope needs the requester's role and reporting line, so the
    // rows are joined against users and filtered in memory; lists here are
    // small and the scope rule is one predicate, not SQL.
    let data_sql = format!(
        r#"
        SELECT lr.id, lr.user_id, lr.user_name, lr.role_id, lr.leave_type,
               lr.start_date, lr.end_date, lr.reason, lr.status,
               lr.payment_type, lr.rejection_reason, lr.approved_by,
               lr.approved_at, lr.requested_at, u.manager_id
        FROM leave_requests lr
        JOIN users u ON u.id = lr.user_id
        {}
        ORDER BY lr.requested_at DESC
        "#,
        where_sql
    );

    #[derive(sqlx::FromRow)]
    struct LeaveWithManager {
        #[sqlx(flatten)]
        request: LeaveRequest,
        manager_id: Option<u64>,
    }

    let mut data_q = sqlx::query_as::<_, LeaveWithManager>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let rows = data_q.fetch_all(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch leave list");
        ApiError::from(e)
    })?;

    let viewer = auth.viewer();
    let visible: Vec<LeaveRequest> = rows
        .into_iter()
        .filter(|row| {
            let Some(role) = Role::from_id(row.request.role_id) else {
                return false;
            };
            access::can_view_attendance(
                viewer,
                Target {
                    id: row.request.user_id,
                    role,
                    manager_id: row.manager_id,
                },
            )
        })
        .map(|row| row.request)
        .collect();

    let total = visible.len();
    let start = ((page - 1) * per_page) as usize;
    let page_rows: Vec<LeaveRequest> =
        visible.into_iter().skip(start).take(per_page as usize).collect();

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: page_rows,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/* =========================
Leave balance (derived, never stored)
========================= */
#[derive(Deserialize, IntoParams, ToSchema)]
pub struct BalanceQuery {
    /// Defaults to the requester
    #[schema(example = 7)]
    pub user_id: Option<u64>,
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 1)]
    pub month: u32,
}

#[utoipa::path(
    get,
    path = "/api/leave/balance",
    params(BalanceQuery),
    responses(
        (status = 200, description = "Per-month leave balance", body = LeaveBalance),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Out of scope for this role")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<BalanceQuery>,
) -> actix_web::Result<impl Responder> {
    let target_id = query.user_id.unwrap_or(auth.user_id);

    // A self-read is always in scope, so it needs no user lookup and stays
    // on the degraded-default path even when the store is flaky. Reading
    // someone else's balance requires the scope row and fails loudly if it
    // cannot be fetched.
    if target_id != auth.user_id {
        let row = data::fetch_scope_row(pool.get_ref(), target_id).await?;
        data::require_attendance_scope(auth.viewer(), data::target_of(&row)?)?;
    }

    let (first, last) = data::month_bounds(query.year, query.month)?;

    // Read path degrades to the default allocation instead of failing the
    // whole request when the store is flaky.
    let rows = match sqlx::query_as::<_, (String, String, NaiveDate, NaiveDate)>(
        r#"
        SELECT leave_type, status, start_date, end_date
        FROM leave_requests
        WHERE user_id = ? AND status IN ('approved', 'pending')
          AND start_date <= ? AND end_date >= ?
        "#,
    )
    .bind(target_id)
    .bind(last)
    .bind(first)
    .fetch_all(pool.get_ref())
    .await
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(error = %e, user_id = target_id, "Balance read degraded to default");
            return Ok(HttpResponse::Ok().json(LeaveBalance::empty(config.monthly_leave_quota)));
        }
    };

    let mut used = [0u32; 3];
    let mut pending = [0u32; 3];
    for (leave_type, status, start, end) in rows {
        let Ok(leave_type) = leave_type.parse::<LeaveType>() else {
            continue;
        };
        let days = leave_policy::days_in_month_span(start, end, query.year, query.month);
        if days == 0 {
            continue;
        }
        let idx = match leave_type {
            LeaveType::Monthly => 0,
            LeaveType::Emergency => 1,
            LeaveType::Miscellaneous => 2,
        };
        match status.parse::<LeaveStatus>() {
            Ok(LeaveStatus::Approved) => used[idx] += days,
            Ok(LeaveStatus::Pending) => pending[idx] += days,
            _ => {}
        }
    }

    Ok(HttpResponse::Ok().json(LeaveBalance {
        monthly: LeaveBucket::limited(config.monthly_leave_quota, used[0], pending[0]),
        emergency: LeaveBucket::unlimited(used[1], pending[1]),
        miscellaneous: LeaveBucket::unlimited(used[2], pending[2]),
    }))
}
