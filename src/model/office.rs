use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Admin-managed geofence configuration. Read-only from the attendance path.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OfficeLocation {
    pub id: u64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
    /// Empty whitelist means any caller IP is acceptable for this office.
    pub whitelisted_ips: Vec<String>,
    pub is_active: bool,
}

/// Row shape: the IP whitelist is stored as a comma-separated column.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OfficeLocationRow {
    pub id: u64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
    pub whitelisted_ips: Option<String>,
    pub is_active: bool,
}

impl From<OfficeLocationRow> for OfficeLocation {
    fn from(row: OfficeLocationRow) -> Self {
        let whitelisted_ips = row
            .whitelisted_ips
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            id: row.id,
            name: row.name,
            latitude: row.latitude,
            longitude: row.longitude,
            radius_meters: row.radius_meters,
            whitelisted_ips,
            is_active: row.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitelist_column_is_split_and_trimmed() {
        let row = OfficeLocationRow {
            id: 1,
            name: "HQ".into(),
            latitude: 0.0,
            longitude: 0.0,
            radius_meters: 100.0,
            whitelisted_ips: Some(" 10.0.0.1, 10.0.0.2 ,".into()),
            is_active: true,
        };
        let office = OfficeLocation::from(row);
        assert_eq!(office.whitelisted_ips, vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn null_whitelist_means_open() {
        let row = OfficeLocationRow {
            id: 1,
            name: "HQ".into(),
            latitude: 0.0,
            longitude: 0.0,
            radius_meters: 100.0,
            whitelisted_ips: None,
            is_active: true,
        };
        assert!(OfficeLocation::from(row).whitelisted_ips.is_empty());
    }
}
