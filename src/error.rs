use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::model::attendance::ClockError;
use crate::model::payroll::PeriodKey;
use crate::repo::StoreError;

#[derive(Debug, Error)]
pub enum PayrollError {
    #[error("Invalid pay period: month {month}, year {year}")]
    InvalidPeriod { month: i64, year: i64 },
    #[error("Employee {0} not found")]
    EmployeeNotFound(u64),
    #[error("Payroll {0} not found")]
    PayrollNotFound(u64),
    #[error("Payroll for {0} was written by a concurrent request, retry")]
    ConcurrentGenerationConflict(PeriodKey),
    #[error("Dependency failure: {0}")]
    DependencyFailure(#[from] StoreError),
}

impl ResponseError for PayrollError {
    fn status_code(&self) -> StatusCode {
        match self {
            PayrollError::InvalidPeriod { .. } => StatusCode::BAD_REQUEST,
            PayrollError::EmployeeNotFound(_) | PayrollError::PayrollNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            PayrollError::ConcurrentGenerationConflict(_) => StatusCode::CONFLICT,
            PayrollError::DependencyFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            PayrollError::DependencyFailure(e) => e.error_response(),
            _ => HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() })),
        }
    }
}

impl ResponseError for StoreError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        error!(error = %self, "Store call failed");
        HttpResponse::InternalServerError().json(json!({ "error": "Internal Server Error" }))
    }
}

impl ResponseError for ClockError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::BadRequest().json(json!({ "error": self.to_string() }))
    }
}
