use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
/// Tune these based on real device counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// Membership filter over device ids that have clocked in before. A miss is
/// authoritative (definitely a new device) and downgrades the clock-in's
/// verification to Pending Review; a hit may be a false positive, which only
/// skips the downgrade, so no DB confirmation is needed on this path.
static DEVICE_FILTER: Lazy<RwLock<CuckooFilter<String>>> = Lazy::new(|| {
    RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE))
});

#[inline]
fn normalize(device_id: &str) -> String {
    device_id.trim().to_lowercase()
}

/// Check if a device might be known (false positives possible)
pub fn is_known(device_id: &str) -> bool {
    let device_id = normalize(device_id);
    DEVICE_FILTER
        .read()
        .expect("device filter poisoned")
        .contains(&device_id)
}

/// Register a device after a successful clock-in
pub fn register(device_id: &str) {
    let device_id = normalize(device_id);
    DEVICE_FILTER
        .write()
        .expect("device filter poisoned")
        .add(&device_id);
}

/// Warm up the device filter using streaming + batching
pub async fn warmup_device_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>(
        "SELECT DISTINCT device_id FROM attendance WHERE device_id IS NOT NULL",
    )
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (device_id,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize(&device_id));
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    log::info!("Device filter warmup complete: {} devices", total);
    Ok(())
}

fn insert_batch(device_ids: &[String]) {
    let mut filter = DEVICE_FILTER.write().expect("device filter poisoned");

    for device_id in device_ids {
        filter.add(device_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_device_is_known() {
        register("tablet-entrance-01");
        assert!(is_known("tablet-entrance-01"));
        assert!(is_known("  TABLET-ENTRANCE-01 ")); // normalized
    }
}
