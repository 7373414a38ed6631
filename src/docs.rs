use crate::api::attendance::{ClockInReq, ClockOutReq, EventsQuery, OverrideReq, SummaryQuery};
use crate::api::leave_request::{
    BalanceQuery, CreateLeave, DecideLeave, LeaveFilter, LeaveListResponse,
};
use crate::api::office::CreateOffice;
use crate::api::payroll::{PayrollListQuery, PayrollQuery, RegenerateReq};
use crate::core::summary::MonthlySummary;
use crate::model::attendance::AttendanceEvent;
use crate::model::leave::{LeaveBalance, LeaveBucket, LeaveRequest};
use crate::model::office::OfficeLocation;
use crate::model::payroll::PayrollRecord;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Workforce Management API",
        version = "1.0.0",
        description = r#"
## Workforce attendance, leave & payroll reconciliation

This API records geofenced clock-in/clock-out events, reconciles leave
approvals against attendance, and derives monthly payroll from the result.

### Key features
- **Attendance**
  - Geofence- and IP-verified clock-in/clock-out with overtime tracking
  - Monthly summaries (day credits, attendance rate, underwork/overtime)
  - Administrative day-credit overrides
- **Leave**
  - Self-service requests with monthly quota enforcement
  - Role-gated approval/rejection with paid/unpaid payment types
  - Automatic attendance reconciliation on approval and reversion on delete
- **Payroll**
  - Lazily generated, frozen-once payroll records with explicit regeneration
- **Office geofences**
  - Admin-managed locations, radii and IP whitelists

### Security
All business endpoints require **JWT Bearer authentication**; visibility is
scoped by role (Admin, Sub-Admin, HR, Team Lead, Employee).

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::summary,
        crate::api::attendance::list_events,
        crate::api::attendance::set_override,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::decide_leave,
        crate::api::leave_request::delete_leave,
        crate::api::leave_request::leave_balance,

        crate::api::payroll::get_payroll,
        crate::api::payroll::regenerate_payroll,
        crate::api::payroll::mark_paid,
        crate::api::payroll::list_payrolls,

        crate::api::office::list_offices,
        crate::api::office::create_office,
        crate::api::office::update_office,
        crate::api::office::deactivate_office
    ),
    components(
        schemas(
            ClockInReq,
            ClockOutReq,
            SummaryQuery,
            EventsQuery,
            OverrideReq,
            AttendanceEvent,
            MonthlySummary,
            CreateLeave,
            DecideLeave,
            LeaveFilter,
            BalanceQuery,
            LeaveRequest,
            LeaveListResponse,
            LeaveBalance,
            LeaveBucket,
            PayrollQuery,
            PayrollListQuery,
            RegenerateReq,
            PayrollRecord,
            CreateOffice,
            OfficeLocation
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Attendance recording and summaries"),
        (name = "Leave", description = "Leave lifecycle and balances"),
        (name = "Payroll", description = "Payroll generation APIs"),
        (name = "Office", description = "Office geofence configuration"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
