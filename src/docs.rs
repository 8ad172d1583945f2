use crate::api::payroll::{
    GenerateRequest, GenerateResponse, PaginatedPayrollResponse, PayrollQuery, StatusUpdate,
};
use crate::api::attendance::{AttendanceQuery, PaginatedAttendanceResponse};
use crate::model::attendance::{AttendanceEntry, AttendanceRecord, AttendanceStatus};
use crate::model::payroll::{PayrollFields, PayrollRecord, PayrollStatus};
use crate::payroll::payslip::PayslipSummary;
use crate::payroll::service::GeneratedPayroll;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Home Care Payroll API",
        version = "1.0.0",
        description = r#"
## Home Care Payroll

Monthly payroll for home-healthcare staff, computed from daily attendance and completed care tasks.

### Key Features
- **Attendance**
  - Daily check-in / check-out and overtime check-in / check-out
- **Payroll**
  - Generate (or regenerate) one payslip per employee and month
  - Overtime at 1.5x the hourly base, completed-task allowances, flat 10% deduction
  - Review, approve, mark paid, delete

### Security
Every endpoint requires a **JWT Bearer** access token issued by the auth service.
Payroll generation and administration are **Admin** only; employees read their own payslips.

### Response Format
- JSON; money and hours are decimal strings with two places
- Errors are `{"error": "..."}`
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::ot_check_in,
        crate::api::attendance::ot_check_out,
        crate::api::attendance::today,
        crate::api::attendance::employee_today,
        crate::api::attendance::employee_attendance,
        crate::api::attendance::list_attendance,

        crate::api::payroll::generate_payroll,
        crate::api::payroll::list_payrolls,
        crate::api::payroll::employee_payslips,
        crate::api::payroll::get_payslip,
        crate::api::payroll::update_status,
        crate::api::payroll::delete_payroll
    ),
    components(
        schemas(
            AttendanceRecord,
            AttendanceEntry,
            AttendanceStatus,
            AttendanceQuery,
            PaginatedAttendanceResponse,
            GenerateRequest,
            GenerateResponse,
            GeneratedPayroll,
            PayslipSummary,
            PayrollRecord,
            PayrollFields,
            PayrollStatus,
            PaginatedPayrollResponse,
            StatusUpdate,
            PayrollQuery
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Attendance ledger APIs"),
        (name = "Payroll", description = "Payroll generation and payslip APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
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
