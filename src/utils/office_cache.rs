use anyhow::Result;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::Arc;
use std::time::Duration;

use crate::model::office::{OfficeLocation, OfficeLocationRow};

const ACTIVE_OFFICES_KEY: &str = "active";

/// Geofence config changes rarely but is read on every clock-in/out, so the
/// active office list lives behind a short-TTL cache keyed by a single slot.
static OFFICE_CACHE: Lazy<Cache<&'static str, Arc<Vec<OfficeLocation>>>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(4)
        .time_to_live(Duration::from_secs(300)) // 5 min TTL
        .build()
});

async fn fetch_active(pool: &MySqlPool) -> Result<Vec<OfficeLocation>, sqlx::Error> {
    let rows = sqlx::query_as::<_, OfficeLocationRow>(
        r#"
        SELECT id, name, latitude, longitude, radius_meters, whitelisted_ips, is_active
        FROM office_locations
        WHERE is_active = TRUE
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(OfficeLocation::from).collect())
}

/// Active offices, cached. Falls through to the database on a cold or
/// expired slot.
pub async fn active_offices(pool: &MySqlPool) -> Result<Arc<Vec<OfficeLocation>>, sqlx::Error> {
    if let Some(cached) = OFFICE_CACHE.get(ACTIVE_OFFICES_KEY).await {
        return Ok(cached);
    }

    let offices = Arc::new(fetch_active(pool).await?);
    OFFICE_CACHE.insert(ACTIVE_OFFICES_KEY, offices.clone()).await;
    Ok(offices)
}

/// Drops the cached list after an admin edit so the next clock-in sees the
/// new geofence config.
pub async fn invalidate() {
    OFFICE_CACHE.invalidate(ACTIVE_OFFICES_KEY).await;
}

/// Primes the cache at startup.
pub async fn warmup_office_cache(pool: &MySqlPool) -> Result<()> {
    let offices = Arc::new(fetch_active(pool).await?);
    let count = offices.len();
    OFFICE_CACHE.insert(ACTIVE_OFFICES_KEY, offices).await;

    log::info!("Office cache warmup complete: {} active locations", count);
    Ok(())
}
