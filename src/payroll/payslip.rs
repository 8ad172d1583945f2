use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::employee::Employee;
use crate::payroll::calculator::{PayrollComputation, round_money};
use crate::utils::period::PayPeriod;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayslipSummary {
    #[schema(example = "Jane Doe", nullable = true)]
    pub employee_name: Option<String>,
    #[schema(example = 3)]
    pub month: u8,
    #[schema(example = 2025)]
    pub year: u16,
    #[schema(example = "8.00")]
    pub regular_hours: String,
    #[schema(example = "2.00")]
    pub ot_hours: String,
    #[schema(example = "500.00")]
    pub task_allowances: String,
    #[schema(example = "29790.00")]
    pub net_salary: String,
}

impl PayslipSummary {
    pub fn new(employee: &Employee, period: PayPeriod, computation: &PayrollComputation) -> Self {
        Self {
            employee_name: employee.name.clone(),
            month: period.month(),
            year: period.year(),
            regular_hours: fixed2(computation.regular_hours),
            ot_hours: fixed2(computation.ot_hours),
            task_allowances: fixed2(computation.task_allowances),
            net_salary: fixed2(computation.net_salary),
        }
    }
}

pub fn fixed2(value: Decimal) -> String {
    format!("{:.2}", round_money(value))
}
