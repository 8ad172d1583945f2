use actix_web::{HttpResponse, Responder, web};
use chrono::{Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::model::attendance::{AttendanceEntry, AttendanceRecord, Stamp};
use crate::payroll::hours::aggregate_hours;
use crate::payroll::payslip::fixed2;
use crate::repo::AttendanceRepository;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AttendanceQuery {
    #[schema(example = 1)]
    pub page: Option<u32>,

    #[schema(example = 10)]
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedAttendanceResponse {
    pub data: Vec<AttendanceEntry>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Validates `stamp` against today's record, then writes it with the current time.
async fn clock(
    store: &dyn AttendanceRepository,
    auth: &AuthUser,
    stamp: Stamp,
) -> actix_web::Result<AttendanceRecord> {
    let employee_id = auth.own_employee_id()?;

    // DATETIME columns keep whole seconds
    let now = Utc::now().naive_utc();
    let now = now.with_nanosecond(0).unwrap_or(now);
    let today = now.date();

    let current = store.attendance_on(employee_id, today).await?;
    stamp.validate(current.as_ref())?;

    let record = store
        .stamp(employee_id, today, stamp, now)
        .await?
        .ok_or_else(|| stamp.lost_race())?;

    info!(
        employee_id,
        user_id = auth.user_id,
        username = %auth.username,
        %stamp,
        at = %now,
        "Attendance stamped"
    );
    Ok(record)
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully"
        })),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "error": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    store: web::Data<dyn AttendanceRepository>,
) -> actix_web::Result<impl Responder> {
    let attendance = clock(store.get_ref(), &auth, Stamp::CheckIn).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Checked in successfully",
        "attendance": attendance
    })))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully",
            "regularHours": "8.00"
        })),
        (status = 400, description = "No active check-in found for today", body = Object, example = json!({
            "error": "No active check-in found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    store: web::Data<dyn AttendanceRepository>,
) -> actix_web::Result<impl Responder> {
    let attendance = clock(store.get_ref(), &auth, Stamp::CheckOut).await?;
    let worked = aggregate_hours(std::slice::from_ref(&attendance));

    Ok(HttpResponse::Ok().json(json!({
        "message": "Checked out successfully",
        "regularHours": fixed2(worked.regular_hours()),
        "attendance": attendance
    })))
}

#[utoipa::path(
    post,
    path = "/api/attendance/ot-check-in",
    responses(
        (status = 200, description = "OT check-in successful"),
        (status = 400, description = "Regular shift still open, or OT already started"),
        (status = 401),
        (status = 403)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn ot_check_in(
    auth: AuthUser,
    store: web::Data<dyn AttendanceRepository>,
) -> actix_web::Result<impl Responder> {
    let attendance = clock(store.get_ref(), &auth, Stamp::OtCheckIn).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "OT check-in successful",
        "attendance": attendance
    })))
}

#[utoipa::path(
    post,
    path = "/api/attendance/ot-check-out",
    responses(
        (status = 200, description = "OT check-out successful", body = Object, example = json!({
            "message": "OT check-out successful",
            "otHours": "2.00"
        })),
        (status = 400, description = "No active OT check-in found for today"),
        (status = 401),
        (status = 403)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn ot_check_out(
    auth: AuthUser,
    store: web::Data<dyn AttendanceRepository>,
) -> actix_web::Result<impl Responder> {
    let attendance = clock(store.get_ref(), &auth, Stamp::OtCheckOut).await?;
    let worked = aggregate_hours(std::slice::from_ref(&attendance));

    Ok(HttpResponse::Ok().json(json!({
        "message": "OT check-out successful",
        "otHours": fixed2(worked.overtime_hours()),
        "attendance": attendance
    })))
}

/// Today's record with the hours it counts for so far.
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, body = Object, example = json!({
            "attendance": null,
            "regularHours": "0.00",
            "otHours": "0.00"
        })),
        (status = 401),
        (status = 403)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today(
    auth: AuthUser,
    store: web::Data<dyn AttendanceRepository>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.own_employee_id()?;
    day_summary(store.get_ref(), employee_id).await
}

/// Any employee's record for today. Admins, or the employee themself.
#[utoipa::path(
    get,
    path = "/api/attendance/today/{employee_id}",
    params(
        ("employee_id", description = "Employee ID")
    ),
    responses(
        (status = 200, body = Object, example = json!({
            "attendance": null,
            "regularHours": "0.00",
            "otHours": "0.00"
        })),
        (status = 401),
        (status = 403)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn employee_today(
    auth: AuthUser,
    store: web::Data<dyn AttendanceRepository>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    auth.require_self_or_admin(employee_id)?;
    day_summary(store.get_ref(), employee_id).await
}

async fn day_summary(
    store: &dyn AttendanceRepository,
    employee_id: u64,
) -> actix_web::Result<HttpResponse> {
    let date = Utc::now().date_naive();
    let attendance = store.attendance_on(employee_id, date).await?;
    let worked = aggregate_hours(attendance.as_slice());

    Ok(HttpResponse::Ok().json(json!({
        "attendance": attendance,
        "regularHours": fixed2(worked.regular_hours()),
        "otHours": fixed2(worked.overtime_hours())
    })))
}

/// Every employee's attendance, newest day first.
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, body = PaginatedAttendanceResponse),
        (status = 401),
        (status = 403)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    store: web::Data<dyn AttendanceRepository>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);

    let (data, total) = store.list_attendance(page, per_page).await?;

    Ok(HttpResponse::Ok().json(PaginatedAttendanceResponse {
        data,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/attendance/employee/{employee_id}",
    params(
        ("employee_id", description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Attendance history, newest day first", body = [AttendanceRecord]),
        (status = 403)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn employee_attendance(
    auth: AuthUser,
    store: web::Data<dyn AttendanceRepository>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    auth.require_self_or_admin(employee_id)?;

    let attendance = store.attendance_for(employee_id).await?;

    Ok(HttpResponse::Ok().json(attendance))
}
