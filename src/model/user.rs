use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SalaryType {
    Monthly,
    Daily,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub password: String,
    pub role_id: u8,
    /// Team lead this user reports to, if any.
    pub manager_id: Option<u64>,
    pub salary_type: String,
    pub salary_amount: f64,
    pub is_active: bool,
}

/// Slim projection used by scope checks and leave approval: the requester
/// needs the target's role and reporting line, nothing else.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserScopeRow {
    pub id: u64,
    pub username: String,
    pub role_id: u8,
    pub manager_id: Option<u64>,
}

/// Salary columns pulled for payroll computation.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SalaryConfigRow {
    pub salary_type: String,
    pub salary_amount: f64,
}
