use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::error::PayrollError;
use crate::model::payroll::{PayrollRecord, PayrollStatus};
use crate::payroll::service::{GeneratedPayroll, PayrollService};

#[derive(Deserialize, ToSchema)]
pub struct GenerateRequest {
    #[schema(example = 1001)]
    pub employee_id: u64,

    #[schema(example = 3)]
    pub month: i64,

    #[schema(example = 2025)]
    pub year: i64,
}

#[derive(Serialize, ToSchema)]
pub struct GenerateResponse {
    #[schema(example = "Payroll generated successfully")]
    pub message: String,
    #[serde(flatten)]
    pub generated: GeneratedPayroll,
}

#[derive(Deserialize, ToSchema)]
pub struct StatusUpdate {
    #[schema(example = "approved")]
    pub status: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PayrollQuery {
    #[schema(example = 1)]
    pub page: Option<u32>,

    #[schema(example = 10)]
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedPayrollResponse {
    pub data: Vec<PayrollRecord>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[utoipa::path(
    post,
    path = "/api/payroll/generate",
    request_body = GenerateRequest,
    responses(
        (status = 201, description = "Payroll generated", body = GenerateResponse),
        (status = 400, description = "Invalid pay period"),
        (status = 401),
        (status = 403),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Concurrent generation for the same period"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn generate_payroll(
    auth: AuthUser,
    service: web::Data<PayrollService>,
    payload: web::Json<GenerateRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    info!(
        user_id = auth.user_id,
        username = %auth.username,
        employee_id = payload.employee_id,
        month = payload.month,
        year = payload.year,
        "Payroll generation requested"
    );

    let today = Utc::now().date_naive();
    let generated = service
        .generate(payload.employee_id, payload.month, payload.year, today)
        .await?;

    Ok(HttpResponse::Created().json(GenerateResponse {
        message: "Payroll generated successfully".to_string(),
        generated,
    }))
}

#[utoipa::path(
    get,
    path = "/api/payroll",
    params(PayrollQuery),
    responses(
        (status = 200, body = PaginatedPayrollResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_payrolls(
    auth: AuthUser,
    service: web::Data<PayrollService>,
    query: web::Query<PayrollQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);

    let (data, total) = service.list(page, per_page).await?;

    Ok(HttpResponse::Ok().json(PaginatedPayrollResponse {
        data,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/payroll/employee/{employee_id}",
    params(
        ("employee_id", description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Payslips, newest period first", body = Object, example = json!({
            "payslips": []
        })),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn employee_payslips(
    auth: AuthUser,
    service: web::Data<PayrollService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    auth.require_self_or_admin(employee_id)?;

    let payslips = service.for_employee(employee_id).await?;

    Ok(HttpResponse::Ok().json(json!({ "payslips": payslips })))
}

#[utoipa::path(
    get,
    path = "/api/payroll/{payroll_id}",
    params(
        ("payroll_id", description = "Payroll ID")
    ),
    responses(
        (status = 200, body = PayrollRecord),
        (status = 403, description = "Not the caller's payslip, or no such payslip for a non-admin"),
        (status = 404, description = "Payroll not found (admins only)")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_payslip(
    auth: AuthUser,
    service: web::Data<PayrollService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let payroll_id = path.into_inner();

    // non-admins get the same 403 whether the id is missing or belongs to someone else
    let payslip = match service.get(payroll_id).await {
        Err(PayrollError::PayrollNotFound(_)) if !auth.is_admin() => None,
        other => Some(other?),
    };
    match payslip {
        Some(payslip) if auth.is_self_or_admin(payslip.employee_id) => {
            Ok(HttpResponse::Ok().json(json!({ "payslip": payslip })))
        }
        _ => Err(actix_web::error::ErrorForbidden("Not allowed to access this payslip")),
    }
}

#[utoipa::path(
    put,
    path = "/api/payroll/{payroll_id}/status",
    request_body = StatusUpdate,
    params(
        ("payroll_id", description = "Payroll ID")
    ),
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Unknown status"),
        (status = 404, description = "Payroll not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn update_status(
    auth: AuthUser,
    service: web::Data<PayrollService>,
    path: web::Path<u64>,
    body: web::Json<StatusUpdate>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let payroll_id = path.into_inner();
    let status: PayrollStatus = match body.status.parse() {
        Ok(s) => s,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "error": format!("Unknown payroll status {:?}", body.status)
            })));
        }
    };

    let payroll = service.set_status(payroll_id, status).await?;
    info!(user_id = auth.user_id, username = %auth.username, payroll_id, %status, "Payroll status changed");

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Payroll marked as {status}"),
        "payroll": payroll
    })))
}

#[utoipa::path(
    delete,
    path = "/api/payroll/{payroll_id}",
    params(
        ("payroll_id", description = "Payroll ID")
    ),
    responses(
        (status = 200, description = "Payroll deleted"),
        (status = 404, description = "Payroll not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn delete_payroll(
    auth: AuthUser,
    service: web::Data<PayrollService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, actix_web::Error> {
    auth.require_admin()?;

    let payroll_id = path.into_inner();
    service.delete(payroll_id).await?;
    info!(user_id = auth.user_id, username = %auth.username, payroll_id, "Payroll deleted");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Payroll deleted successfully"
    })))
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use serde_json::Value;
    use std::sync::Arc;

    use crate::api::test_support::{self, ADMIN, bearer};
    use crate::model::attendance::{AttendanceRecord, AttendanceStatus, at};
    use crate::model::task::TaskStatus;
    use crate::repo::memory::MemoryRepository;

    fn seeded() -> Arc<MemoryRepository> {
        let repo = Arc::new(MemoryRepository::default());
        repo.add_employee(1, dec!(32000), Some("Amina Yusuf"));
        repo.add_employee(2, dec!(28000), None);

        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        repo.add_attendance(AttendanceRecord {
            id: 0,
            employee_id: 1,
            date: day,
            check_in: Some(at(day, 9, 0)),
            check_out: Some(at(day, 17, 0)),
            ot_check_in: Some(at(day, 18, 0)),
            ot_check_out: Some(at(day, 20, 0)),
            status: AttendanceStatus::Present,
        });
        repo.add_task(1, TaskStatus::Completed, Some(dec!(500)));
        repo
    }

    fn generate(employee_id: u64, month: i64, year: i64) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/payroll/generate")
            .set_json(serde_json::json!({
                "employee_id": employee_id,
                "month": month,
                "year": year
            }))
    }

    #[actix_web::test]
    async fn admin_generates_payslip() {
        let repo = seeded();
        let app = test::init_service(
            App::new().configure(|cfg| test_support::configure(cfg, repo.clone())),
        )
        .await;

        let req = generate(1, 3, 2025).insert_header(bearer(ADMIN, None)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["summary"]["netSalary"], "29790.00");
        assert_eq!(body["summary"]["regularHours"], "8.00");
        assert_eq!(body["summary"]["otHours"], "2.00");
        assert_eq!(body["summary"]["employeeName"], "Amina Yusuf");
        assert_eq!(body["payroll"]["status"], "generated");
        assert_eq!(body["payroll"]["net_salary"], "29790.00");
        assert_eq!(repo.payrolls().len(), 1);
    }

    #[actix_web::test]
    async fn generation_errors_map_to_status_codes() {
        let repo = seeded();
        let app = test::init_service(
            App::new().configure(|cfg| test_support::configure(cfg, repo.clone())),
        )
        .await;

        let req = generate(1, 13, 2025).insert_header(bearer(ADMIN, None)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("month 13"));

        let req = generate(77, 3, 2025).insert_header(bearer(ADMIN, None)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        assert!(repo.payrolls().is_empty());
    }

    #[actix_web::test]
    async fn only_admins_generate() {
        let repo = seeded();
        let app = test::init_service(
            App::new().configure(|cfg| test_support::configure(cfg, repo.clone())),
        )
        .await;

        let resp = test::call_service(&app, generate(1, 3, 2025).to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = generate(1, 3, 2025)
            .insert_header(bearer(test_support::EMPLOYEE, Some(1)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert!(repo.payrolls().is_empty());
    }

    #[actix_web::test]
    async fn employees_see_only_their_payslips() {
        let repo = seeded();
        let app = test::init_service(
            App::new().configure(|cfg| test_support::configure(cfg, repo.clone())),
        )
        .await;

        let req = generate(1, 3, 2025).insert_header(bearer(ADMIN, None)).to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let id = created["payroll"]["id"].as_u64().unwrap();

        let own = bearer(test_support::EMPLOYEE, Some(1));
        let other = bearer(test_support::EMPLOYEE, Some(2));

        let req = test::TestRequest::get()
            .uri("/api/payroll/employee/1")
            .insert_header(own.clone())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["payslips"].as_array().unwrap().len(), 1);

        let req = test::TestRequest::get()
            .uri(&format!("/api/payroll/{id}"))
            .insert_header(own)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["payslip"]["employee_id"], 1);
        assert_eq!(body["payslip"]["employee_name"], "Amina Yusuf");

        let req = test::TestRequest::get()
            .uri(&format!("/api/payroll/{id}"))
            .insert_header(other.clone())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri("/api/payroll/employee/1")
            .insert_header(other)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn missing_payslip_looks_forbidden_to_employees() {
        let repo = seeded();
        let app = test::init_service(
            App::new().configure(|cfg| test_support::configure(cfg, repo.clone())),
        )
        .await;

        let req = generate(1, 3, 2025).insert_header(bearer(ADMIN, None)).to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let id = created["payroll"]["id"].as_u64().unwrap();
        let missing = id + 100;

        let someone_elses = test::TestRequest::get()
            .uri(&format!("/api/payroll/{id}"))
            .insert_header(bearer(test_support::EMPLOYEE, Some(2)))
            .to_request();
        let resp = test::call_service(&app, someone_elses).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let someone_elses_body = test::read_body(resp).await;

        let nonexistent = test::TestRequest::get()
            .uri(&format!("/api/payroll/{missing}"))
            .insert_header(bearer(test_support::EMPLOYEE, Some(2)))
            .to_request();
        let resp = test::call_service(&app, nonexistent).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(test::read_body(resp).await, someone_elses_body);

        let req = test::TestRequest::get()
            .uri(&format!("/api/payroll/{missing}"))
            .insert_header(bearer(ADMIN, None))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn list_is_paginated() {
        let repo = seeded();
        let app = test::init_service(
            App::new().configure(|cfg| test_support::configure(cfg, repo.clone())),
        )
        .await;

        for (employee_id, month) in [(1, 1), (1, 2), (2, 2)] {
            let req = generate(employee_id, month, 2025)
                .insert_header(bearer(ADMIN, None))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::get()
            .uri("/api/payroll?page=2&per_page=2")
            .insert_header(bearer(ADMIN, None))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 3);
        assert_eq!(body["page"], 2);
        assert_eq!(body["per_page"], 2);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["month"], 1);
        assert_eq!(body["data"][0]["employee_name"], "Amina Yusuf");

        let req = test::TestRequest::get()
            .uri("/api/payroll")
            .insert_header(bearer(ADMIN, None))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let unnamed = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["employee_id"] == 2)
            .unwrap();
        assert!(unnamed["employee_name"].is_null());

        let req = test::TestRequest::get()
            .uri("/api/payroll?per_page=500")
            .insert_header(bearer(ADMIN, None))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["per_page"], 100);
    }

    #[actix_web::test]
    async fn status_update_and_delete() {
        let repo = seeded();
        let app = test::init_service(
            App::new().configure(|cfg| test_support::configure(cfg, repo.clone())),
        )
        .await;

        let req = generate(1, 3, 2025).insert_header(bearer(ADMIN, None)).to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let id = created["payroll"]["id"].as_u64().unwrap();

        let req = test::TestRequest::put()
            .uri(&format!("/api/payroll/{id}/status"))
            .insert_header(bearer(ADMIN, None))
            .set_json(serde_json::json!({ "status": "archived" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::put()
            .uri(&format!("/api/payroll/{id}/status"))
            .insert_header(bearer(ADMIN, None))
            .set_json(serde_json::json!({ "status": "paid" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["payroll"]["status"], "paid");

        let delete = || {
            test::TestRequest::delete()
                .uri(&format!("/api/payroll/{id}"))
                .insert_header(bearer(ADMIN, None))
                .to_request()
        };
        assert_eq!(test::call_service(&app, delete()).await.status(), StatusCode::OK);

        let resp = test::call_service(&app, delete()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], format!("Payroll {id} not found"));
        assert!(repo.payrolls().is_empty());
    }
}
