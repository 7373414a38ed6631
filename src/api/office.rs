use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::office::{OfficeLocation, OfficeLocationRow};
use crate::utils::db_utils::{build_update_sql, execute_update};
use crate::utils::office_cache;
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::Value;
use sqlx::MySqlPool;
use utoipa::ToSchema;

/// Columns an admin may touch through the sparse update endpoint.
const UPDATABLE_COLUMNS: &[&str] = &[
    "name",
    "latitude",
    "longitude",
    "radius_meters",
    "whitelisted_ips",
    "is_active",
];

#[derive(Deserialize, ToSchema)]
pub struct CreateOffice {
    #[schema(example = "Dhaka HQ")]
    pub name: String,
    #[schema(example = 23.8103)]
    pub latitude: f64,
    #[schema(example = 90.4125)]
    pub longitude: f64,
    #[schema(example = 150.0)]
    pub radius_meters: f64,
    /// Comma-separated; empty means any IP passes
    #[schema(example = "203.0.113.9,203.0.113.10")]
    pub whitelisted_ips: Option<String>,
}

/// List office locations
#[utoipa::path(
    get,
    path = "/api/office",
    responses(
        (status = 200, description = "All office locations", body = [OfficeLocation]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Office"
)]
pub async fn list_offices(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let rows = sqlx::query_as::<_, OfficeLocationRow>(
        r#"
        SELECT id, name, latitude, longitude, radius_meters, whitelisted_ips, is_active
        FROM office_locations
        ORDER BY id
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::from)?;

    let offices: Vec<OfficeLocation> = rows.into_iter().map(OfficeLocation::from).collect();
    Ok(HttpResponse::Ok().json(offices))
}

/// Create an office location (Admin)
#[utoipa::path(
    post,
    path = "/api/office",
    request_body = CreateOffice,
    responses(
        (status = 201, description = "Office created"),
        (status = 400, description = "Invalid geometry"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Office"
)]
pub async fn create_office(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateOffice>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Office name is required").into());
    }
    if !(-90.0..=90.0).contains(&payload.latitude)
        || !(-180.0..=180.0).contains(&payload.longitude)
    {
        return Err(ApiError::validation("Coordinates out of range").into());
    }
    if payload.radius_meters <= 0.0 {
        return Err(ApiError::validation("radius_meters must be positive").into());
    }

    sqlx::query(
        r#"
        INSERT INTO office_locations (name, latitude, longitude, radius_meters, whitelisted_ips, is_active)
        VALUES (?, ?, ?, ?, ?, TRUE)
        "#,
    )
    .bind(payload.name.trim())
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(payload.radius_meters)
    .bind(&payload.whitelisted_ips)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Office create failed");
        ApiError::from(e)
    })?;

    office_cache::invalidate().await;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Office created"
    })))
}

/// Sparse update of an office location (Admin)
#[utoipa::path(
    put,
    path = "/api/office/{office_id}",
    params(("office_id" = u64, Path, description = "Office location ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Office updated"),
        (status = 400, description = "Unknown column or empty payload"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Office not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Office"
)]
pub async fn update_office(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let office_id = path.into_inner();
    let update = build_update_sql(
        "office_locations",
        &payload,
        UPDATABLE_COLUMNS,
        "id",
        office_id as i64,
    )?;

    let affected = execute_update(pool.get_ref(), update).await.map_err(|e| {
        tracing::error!(error = %e, office_id, "Office update failed");
        ApiError::from(e)
    })?;

    if affected == 0 {
        return Err(ApiError::not_found("Office not found").into());
    }

    office_cache::invalidate().await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Office updated"
    })))
}

/// Deactivate an office location (Admin). Soft delete: historical events
/// keep their matched_office_id.
#[utoipa::path(
    delete,
    path = "/api/office/{office_id}",
    params(("office_id" = u64, Path, description = "Office location ID")),
    responses(
        (status = 200, description = "Office deactivated"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Office not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Office"
)]
pub async fn deactivate_office(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let office_id = path.into_inner();
    let result = sqlx::query("UPDATE office_locations SET is_active = FALSE WHERE id = ?")
        .bind(office_id)
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Office not found").into());
    }

    office_cache::invalidate().await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Office deactivated"
    })))
}
