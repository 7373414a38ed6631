use chrono::NaiveDate;
use dotenvy::dotenv;
use std::env;

use crate::core::daily::DayPolicy;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Attendance/leave/payroll policy
    pub full_day_hours: f64,
    pub half_day_hours: f64,
    pub monthly_leave_quota: u32,
    /// When true a failed geofence check rejects the clock-in; when false
    /// the event is recorded and flagged (the legacy behavior).
    pub geofence_enforce: bool,
    /// Static list of non-working dates, comma-separated YYYY-MM-DD.
    pub holidays: Vec<NaiveDate>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            access_token_ttl: env::var("ACCESS_TOKEN_TTL")
                .unwrap_or_else(|_| "900".to_string()) // default 15 min
                .parse()
                .unwrap(),
            refresh_token_ttl: env::var("REFRESH_TOKEN_TTL")
                .unwrap_or_else(|_| "604800".to_string()) // default 7 days
                .parse()
                .unwrap(),

            rate_login_per_min: env::var("RATE_LOGIN_PER_MIN")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap(),
            rate_register_per_min: env::var("RATE_REGISTER_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),
            rate_refresh_per_min: env::var("RATE_REFRESH_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),
            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            full_day_hours: env::var("FULL_DAY_HOURS")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .unwrap(),
            half_day_hours: env::var("HALF_DAY_HOURS")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .unwrap(),
            monthly_leave_quota: env::var("MONTHLY_LEAVE_QUOTA")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .unwrap(),
            geofence_enforce: env::var("GEOFENCE_ENFORCE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            holidays: env::var("HOLIDAYS")
                .unwrap_or_default()
                .split(',')
                .filter_map(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
                .collect(),
        }
    }

    pub fn day_policy(&self) -> DayPolicy {
        DayPolicy {
            full_day_hours: self.full_day_hours,
            half_day_hours: self.half_day_hours,
        }
    }
}
