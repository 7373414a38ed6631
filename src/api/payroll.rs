use crate::api::data;
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::core::access::{self, Target};
use crate::core::payroll as payroll_math;
use crate::core::workdays;
use crate::error::ApiError;
use crate::model::payroll::PayrollRecord;
use crate::model::role::Role;
use crate::model::user::{SalaryConfigRow, SalaryType};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PayrollQuery {
    /// Defaults to the requester
    #[schema(example = 7)]
    pub user_id: Option<u64>,
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 1)]
    pub month: u32,
}

#[derive(Deserialize, ToSchema)]
pub struct RegenerateReq {
    #[schema(example = 7)]
    pub user_id: u64,
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 1)]
    pub month: u32,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PayrollListQuery {
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 1)]
    pub month: u32,
    #[schema(example = 1)]
    pub page: Option<u32>,
    #[schema(example = 10)]
    pub per_page: Option<u32>,
}

async fn fetch_stored(
    pool: &MySqlPool,
    user_id: u64,
    year: i32,
    month: u32,
) -> Result<Option<PayrollRecord>, ApiError> {
    let record = sqlx::query_as::<_, PayrollRecord>(
        r#"
        SELECT id, user_id, month, year, present_days, total_working_days,
               salary_type, salary_amount, allowances_total, deductions_total,
               salary_paid, net_pay, status, pdf_path
        FROM payroll
        WHERE user_id = ? AND year = ? AND month = ?
        "#,
    )
    .bind(user_id)
    .bind(year)
    .bind(month)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

struct ComputedPayroll {
    present_days: f64,
    total_working_days: u32,
    salary_type: SalaryType,
    salary_amount: f64,
    figures: payroll_math::PayrollFigures,
}

async fn compute_figures(
    pool: &MySqlPool,
    config: &Config,
    user_id: u64,
    year: i32,
    month: u32,
) -> Result<ComputedPayroll, ApiError> {
    let salary = sqlx::query_as::<_, SalaryConfigRow>(
        "SELECT salary_type, salary_amount FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("User not found"))?;

    let salary_type = salary
        .salary_type
        .parse::<SalaryType>()
        .map_err(|_| ApiError::validation("User carries an unknown salary type"))?;

    let total_working_days = workdays::working_days(year, month, &config.holidays);
    let summary = data::monthly_summary(pool, config, user_id, year, month).await?;

    // Allowances/deductions default to 0 without further configuration.
    let figures = payroll_math::compute(
        salary_type,
        salary.salary_amount,
        summary.present_days,
        total_working_days,
        0.0,
        0.0,
    );

    Ok(ComputedPayroll {
        present_days: summary.present_days,
        total_working_days,
        salary_type,
        salary_amount: salary.salary_amount,
        figures,
    })
}

/// Fetch-or-compute payroll for a user+month. Stored figures are frozen;
/// they are only recomputed through the explicit regenerate action.
#[utoipa::path(
    get,
    path = "/api/payroll",
    params(PayrollQuery),
    responses(
        (status = 200, description = "Payroll record", body = PayrollRecord),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Out of scope for this role"),
        (status = 404, description = "User not found"),
        (status = 503, description = "Store unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<PayrollQuery>,
) -> actix_web::Result<impl Responder> {
    let target_id = query.user_id.unwrap_or(auth.user_id);
    let row = data::fetch_scope_row(pool.get_ref(), target_id).await?;
    data::require_payroll_scope(auth.viewer(), data::target_of(&row)?)?;

    if let Some(existing) = fetch_stored(pool.get_ref(), target_id, query.year, query.month).await? {
        return Ok(HttpResponse::Ok().json(existing));
    }

    let computed =
        compute_figures(pool.get_ref(), &config, target_id, query.year, query.month).await?;

    // Lazy creation. A concurrent first request may race the insert; the
    // UNIQUE (user_id, year, month) key makes one of them lose, and the
    // loser re-reads the winner's frozen record.
    let inserted = sqlx::query(
        r#"
        INSERT INTO payroll
            (user_id, month, year, present_days, total_working_days,
             salary_type, salary_amount, allowances_total, deductions_total,
             salary_paid, net_pay, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, 0, 0, ?, ?, 'Unpaid')
        "#,
    )
    .bind(target_id)
    .bind(query.month)
    .bind(query.year)
    .bind(computed.present_days)
    .bind(computed.total_working_days)
    .bind(computed.salary_type.to_string().to_lowercase())
    .bind(computed.salary_amount)
    .bind(computed.figures.salary_paid)
    .bind(computed.figures.net_pay)
    .execute(pool.get_ref())
    .await;

    if let Err(e) = inserted {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.code().as_deref() != Some("23000") {
                tracing::error!(error = %db_err, user_id = target_id, "Payroll insert failed");
                return Err(ApiError::from(e).into());
            }
        } else {
            return Err(ApiError::from(e).into());
        }
    }

    let record = fetch_stored(pool.get_ref(), target_id, query.year, query.month)
        .await?
        .ok_or_else(|| ApiError::Upstream("Payroll record vanished after insert".into()))?;

    Ok(HttpResponse::Ok().json(record))
}

/// Explicit regeneration (Admin/HR): recomputes a stored record's figures
/// from the current reconciled attendance. Payment status is preserved.
#[utoipa::path(
    post,
    path = "/api/payroll/regenerate",
    request_body = RegenerateReq,
    responses(
        (status = 200, description = "Payroll regenerated", body = PayrollRecord),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin/HR only, within payroll scope"),
        (status = 404, description = "No stored payroll for that period")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn regenerate_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<RegenerateReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let row = data::fetch_scope_row(pool.get_ref(), payload.user_id).await?;
    data::require_payroll_scope(auth.viewer(), data::target_of(&row)?)?;

    let existing = fetch_stored(pool.get_ref(), payload.user_id, payload.year, payload.month)
        .await?
        .ok_or_else(|| ApiError::not_found("No stored payroll for that period"))?;

    let computed =
        compute_figures(pool.get_ref(), &config, payload.user_id, payload.year, payload.month)
            .await?;

    sqlx::query(
        r#"
        UPDATE payroll
        SET present_days = ?, total_working_days = ?,
            salary_type = ?, salary_amount = ?, salary_paid = ?, net_pay = ?
        WHERE id = ?
        "#,
    )
    .bind(computed.present_days)
    .bind(computed.total_working_days)
    .bind(computed.salary_type.to_string().to_lowercase())
    .bind(computed.salary_amount)
    .bind(computed.figures.salary_paid)
    .bind(computed.figures.net_pay)
    .bind(existing.id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, payroll_id = existing.id, "Payroll regeneration failed");
        ApiError::from(e)
    })?;

    let record = fetch_stored(pool.get_ref(), payload.user_id, payload.year, payload.month)
        .await?
        .ok_or_else(|| ApiError::Upstream("Payroll record vanished after update".into()))?;

    tracing::info!(payroll_id = record.id, actor = auth.user_id, "Payroll regenerated");

    Ok(HttpResponse::Ok().json(record))
}

/// Mark a payroll record paid (Admin/HR)
#[utoipa::path(
    put,
    path = "/api/payroll/{payroll_id}/paid",
    params(("payroll_id" = u64, Path, description = "Payroll record ID")),
    responses(
        (status = 200, description = "Marked paid"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin/HR only, within payroll scope"),
        (status = 404, description = "Payroll not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn mark_paid(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let payroll_id = path.into_inner();

    // Resolve the record's owner so the payroll scope applies to this write
    // the same way it does to reads; HR must not touch Admin payroll.
    let owner = sqlx::query_as::<_, (u64,)>("SELECT user_id FROM payroll WHERE id = ?")
        .bind(payroll_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found("Payroll not found"))?;

    let row = data::fetch_scope_row(pool.get_ref(), owner.0).await?;
    data::require_payroll_scope(auth.viewer(), data::target_of(&row)?)?;

    let result = sqlx::query("UPDATE payroll SET status = 'Paid' WHERE id = ?")
        .bind(payroll_id)
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Payroll not found").into());
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Marked paid"
    })))
}

/// Scoped payroll listing for a period
#[utoipa::path(
    get,
    path = "/api/payroll/list",
    params(PayrollListQuery),
    responses(
        (status = 200, description = "Scoped payroll records", body = [PayrollRecord]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_payrolls(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PayrollListQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);

    #[derive(sqlx::FromRow)]
    struct PayrollWithScope {
        #[sqlx(flatten)]
        record: PayrollRecord,
        role_id: u8,
        manager_id: Option<u64>,
    }

    let rows = sqlx::query_as::<_, PayrollWithScope>(
        r#"
        SELECT p.id, p.user_id, p.month, p.year, p.present_days,
               p.total_working_days, p.salary_type, p.salary_amount,
               p.allowances_total, p.deductions_total, p.salary_paid,
               p.net_pay, p.status, p.pdf_path,
               u.role_id, u.manager_id
        FROM payroll p
        JOIN users u ON u.id = p.user_id
        WHERE p.year = ? AND p.month = ?
        ORDER BY p.user_id
        "#,
    )
    .bind(query.year)
    .bind(query.month)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch payroll list");
        ApiError::from(e)
    })?;

    let viewer = auth.viewer();
    let visible: Vec<PayrollRecord> = rows
        .into_iter()
        .filter(|row| {
            let Some(role) = Role::from_id(row.role_id) else {
                return false;
            };
            access::can_view_payroll(
                viewer,
                Target {
                    id: row.record.user_id,
                    role,
                    manager_id: row.manager_id,
                },
            )
        })
        .map(|row| row.record)
        .collect();

    let start = ((page - 1) * per_page) as usize;
    let total = visible.len();
    let page_rows: Vec<PayrollRecord> =
        visible.into_iter().skip(start).take(per_page as usize).collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "data": page_rows,
        "page": page,
        "per_page": per_page,
        "total": total
    })))
}
