use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Payroll figures for one user and one month. Created lazily on first
/// request and frozen afterwards; regeneration is an explicit action.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PayrollRecord {
    pub id: u64,
    pub user_id: u64,
    pub month: u32,
    pub year: i32,
    pub present_days: f64,
    pub total_working_days: u32,
    pub salary_type: String,
    pub salary_amount: f64,
    pub allowances_total: f64,
    pub deductions_total: f64,
    pub salary_paid: f64,
    pub net_pay: f64,
    pub status: String,
    pub pdf_path: Option<String>,
}
