use crate::model::attendance::VerificationStatus;
use crate::model::office::OfficeLocation;

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct GeofenceCheck {
    pub is_location_verified: bool,
    pub is_ip_verified: bool,
    pub status: VerificationStatus,
    pub matched_office_id: Option<u64>,
}

/// Great-circle distance between two coordinates, in meters.
pub fn haversine_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Checks a clock-in coordinate and caller IP against the active offices.
/// The first office within its radius wins; its IP whitelist then applies
/// (an empty whitelist accepts any IP). The result is advisory by default,
/// the caller decides whether to block (see `Config::geofence_enforce`).
///
/// `known_device` comes from the device registry filter; an otherwise
/// verified clock-in from an unknown device is downgraded to Pending Review.
pub fn verify(
    latitude: f64,
    longitude: f64,
    client_ip: &str,
    offices: &[OfficeLocation],
    known_device: bool,
) -> GeofenceCheck {
    let matched = offices.iter().filter(|o| o.is_active).find(|office| {
        haversine_m(latitude, longitude, office.latitude, office.longitude) <= office.radius_meters
    });

    let office = match matched {
        Some(o) => o,
        None => {
            return GeofenceCheck {
                is_location_verified: false,
                is_ip_verified: false,
                status: VerificationStatus::LocationMismatch,
                matched_office_id: None,
            };
        }
    };

    let ip_ok =
        office.whitelisted_ips.is_empty() || office.whitelisted_ips.iter().any(|ip| ip == client_ip);

    let status = if !ip_ok {
        VerificationStatus::IpMismatch
    } else if !known_device {
        VerificationStatus::PendingReview
    } else {
        VerificationStatus::Verified
    };

    GeofenceCheck {
        is_location_verified: true,
        is_ip_verified: ip_ok,
        status,
        matched_office_id: Some(office.id),
    }
}
