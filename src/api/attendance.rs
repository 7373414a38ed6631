use crate::api::data;
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::core::daily;
use crate::core::geofence;
use crate::core::summary::MonthlySummary;
use crate::error::ApiError;
use crate::model::attendance::{AttendanceEvent, OvertimeApproval, VerificationStatus};
use crate::utils::{device_filter, office_cache};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct ClockInReq {
    #[schema(example = 23.8103)]
    pub latitude: f64,
    #[schema(example = 90.4125)]
    pub longitude: f64,
    #[schema(example = "tablet-entrance-01")]
    pub device_id: String,
    #[schema(example = "photos/2026-01-05/u7.jpg")]
    pub photo_url: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ClockOutReq {
    #[schema(example = 23.8103)]
    pub latitude: f64,
    #[schema(example = 90.4125)]
    pub longitude: f64,
    #[schema(example = "tablet-entrance-01")]
    pub device_id: String,
    #[schema(example = "release deployment ran long")]
    pub overtime_reason: Option<String>,
}

fn client_ip(req: &HttpRequest) -> String {
    req.connection_info()
        .realip_remote_addr()
        .map(|addr| addr.split(':').next().unwrap_or(addr).to_string())
        .unwrap_or_default()
}

/// Clock-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body = ClockInReq,
    responses(
        (status = 200, description = "Clocked in", body = Object, example = json!({
            "message": "Clocked in",
            "verification_status": "Verified"
        })),
        (status = 400, description = "Outside geofence (enforcing mode)"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Already clocked in today"),
        (status = 503, description = "Store unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    req: HttpRequest,
    payload: web::Json<ClockInReq>,
) -> actix_web::Result<impl Responder> {
    let ip = client_ip(&req);
    let offices = office_cache::active_offices(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    let known_device = device_filter::is_known(&payload.device_id);
    let check = geofence::verify(
        payload.latitude,
        payload.longitude,
        &ip,
        &offices,
        known_device,
    );

    // Configurable policy: by default a failed check is recorded and
    // flagged; in enforcing mode it blocks the write.
    if config.geofence_enforce && check.status != VerificationStatus::Verified {
        return Err(ApiError::validation(format!(
            "Clock-in rejected: {}",
            check.status.as_str()
        ))
        .into());
    }

    let now = Utc::now().naive_utc();
    let today = now.date();

    let result = sqlx::query(
        r#"
        INSERT INTO attendance
            (user_id, date, clock_in, clock_in_lat, clock_in_lng,
             verification_status, matched_office_id, device_id, photo_url,
             overtime_approval)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'N/A')
        "#,
    )
    .bind(auth.user_id)
    .bind(today)
    .bind(now)
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(check.status.as_str())
    .bind(check.matched_office_id)
    .bind(&payload.device_id)
    .bind(&payload.photo_url)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            device_filter::register(&payload.device_id);
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "message": "Clocked in",
                "verification_status": check.status.as_str(),
                "matched_office_id": check.matched_office_id
            })))
        }
        Err(e) => {
            // UNIQUE (user_id, date) is the race guard: a second clock-in
            // for the same day dies here, not on a read check.
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Err(ApiError::conflict("Already clocked in today").into());
                }
            }
            tracing::error!(error = %e, user_id = auth.user_id, "Clock-in failed");
            Err(ApiError::from(e).into())
        }
    }
}

/// Clock-out endpoint
#[utoipa::path(
    put,
    path = "/api/attendance/check-out",
    request_body = ClockOutReq,
    responses(
        (status = 200, description = "Clocked out", body = Object, example = json!({
            "message": "Clocked out",
            "total_hours": 9.5,
            "regular_hours": 8.0,
            "overtime_hours": 1.5,
            "overtime_approval": "Pending"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "No open clock-in record for today"),
        (status = 503, description = "Store unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<ClockOutReq>,
) -> actix_web::Result<impl Responder> {
    let now = Utc::now().naive_utc();
    let today = now.date();

    let open = sqlx::query_as::<_, (u64, chrono::NaiveDateTime)>(
        r#"
        SELECT id, clock_in
        FROM attendance
        WHERE user_id = ? AND date = ? AND clock_out IS NULL
        "#,
    )
    .bind(auth.user_id)
    .bind(today)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(ApiError::from)?;

    let (event_id, clock_in) =
        open.ok_or_else(|| ApiError::conflict("No open clock-in record for today"))?;

    let policy = config.day_policy();
    let total_hours = daily::shift_hours(clock_in, now);
    let (regular_hours, overtime_hours) = daily::split_hours(total_hours, &policy);
    let overtime_approval = if overtime_hours > 0.0 {
        OvertimeApproval::Pending
    } else {
        OvertimeApproval::NotApplicable
    };

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET clock_out = ?, clock_out_lat = ?, clock_out_lng = ?,
            total_hours = ?, regular_hours = ?, overtime_hours = ?,
            overtime_approval = ?, overtime_reason = ?
        WHERE id = ? AND clock_out IS NULL
        "#,
    )
    .bind(now)
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(total_hours)
    .bind(regular_hours)
    .bind(overtime_hours)
    .bind(match overtime_approval {
        OvertimeApproval::Pending => "Pending",
        _ => "N/A",
    })
    .bind(&payload.overtime_reason)
    .bind(event_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id = auth.user_id, "Clock-out failed");
        ApiError::from(e)
    })?;

    // The clock_out IS NULL predicate makes the close a guarded
    // read-modify-write; a concurrent double clock-out loses here.
    if result.rows_affected() == 0 {
        return Err(ApiError::conflict("Already clocked out today").into());
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Clocked out",
        "total_hours": total_hours,
        "regular_hours": regular_hours,
        "overtime_hours": overtime_hours,
        "overtime_approval": match overtime_approval {
            OvertimeApproval::Pending => "Pending",
            _ => "N/A",
        }
    })))
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct SummaryQuery {
    /// Defaults to the requester
    #[schema(example = 7)]
    pub user_id: Option<u64>,
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 1)]
    pub month: u32,
}

/// Monthly attendance summary (leave-reconciled, overrides applied)
#[utoipa::path(
    get,
    path = "/api/attendance/summary",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Monthly summary", body = MonthlySummary),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Out of scope for this role"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<SummaryQuery>,
) -> actix_web::Result<impl Responder> {
    let target_id = query.user_id.unwrap_or(auth.user_id);
    let row = data::fetch_scope_row(pool.get_ref(), target_id).await?;
    data::require_attendance_scope(auth.viewer(), data::target_of(&row)?)?;

    let summary =
        data::monthly_summary(pool.get_ref(), &config, target_id, query.year, query.month).await?;

    Ok(HttpResponse::Ok().json(summary))
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct EventsQuery {
    #[schema(example = 7)]
    pub user_id: Option<u64>,
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 1)]
    pub month: u32,
}

/// Raw attendance events for a month
#[utoipa::path(
    get,
    path = "/api/attendance/events",
    params(EventsQuery),
    responses(
        (status = 200, description = "Events", body = [AttendanceEvent]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Out of scope for this role")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_events(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EventsQuery>,
) -> actix_web::Result<impl Responder> {
    let target_id = query.user_id.unwrap_or(auth.user_id);
    let row = data::fetch_scope_row(pool.get_ref(), target_id).await?;
    data::require_attendance_scope(auth.viewer(), data::target_of(&row)?)?;

    let (first, last) = data::month_bounds(query.year, query.month)?;

    let events = sqlx::query_as::<_, AttendanceEvent>(
        r#"
        SELECT id, user_id, date, clock_in, clock_in_lat, clock_in_lng,
               clock_out, clock_out_lat, clock_out_lng,
               verification_status, matched_office_id, device_id, photo_url,
               total_hours, regular_hours, overtime_hours,
               overtime_approval, overtime_reason
        FROM attendance
        WHERE user_id = ? AND date BETWEEN ? AND ?
        ORDER BY date
        "#,
    )
    .bind(target_id)
    .bind(first)
    .bind(last)
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(events))
}

#[derive(Deserialize, ToSchema)]
pub struct OverrideReq {
    #[schema(example = 7)]
    pub user_id: u64,
    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = 1.0)]
    pub day_credit: f64,
}

/// Administrative day-credit correction (Admin/HR)
#[utoipa::path(
    post,
    path = "/api/attendance/override",
    request_body = OverrideReq,
    responses(
        (status = 200, description = "Override stored"),
        (status = 400, description = "Invalid day credit"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin/HR only, within attendance scope"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn set_override(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<OverrideReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    // The role gate alone is not enough: HR must not reach Admin/Sub-Admin
    // records, so the target is scoped like every other attendance path.
    let row = data::fetch_scope_row(pool.get_ref(), payload.user_id).await?;
    data::require_attendance_scope(auth.viewer(), data::target_of(&row)?)?;

    if ![0.0, 0.5, 1.0].contains(&payload.day_credit) {
        return Err(ApiError::validation("day_credit must be 0, 0.5 or 1").into());
    }
    if payload.date.year() < 2000 {
        return Err(ApiError::validation("Implausible override date").into());
    }

    sqlx::query(
        r#"
        INSERT INTO attendance_overrides (user_id, date, day_credit)
        VALUES (?, ?, ?)
        ON DUPLICATE KEY UPDATE day_credit = VALUES(day_credit)
        "#,
    )
    .bind(payload.user_id)
    .bind(payload.date)
    .bind(payload.day_credit)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id = payload.user_id, "Override write failed");
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Override stored"
    })))
}
