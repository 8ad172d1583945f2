use chrono::NaiveDate;
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PayrollStatus {
    Generated,
    Approved,
    Paid,
}

/// Natural key of a payroll record: at most one record per employee and month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[display(fmt = "employee {} {}-{:02}", employee_id, year, month)]
pub struct PeriodKey {
    pub employee_id: u64,
    pub month: u8,
    pub year: u16,
}

/// Everything a generation run writes, stored at two decimal places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PayrollFields {
    #[schema(value_type = String, example = "32000.00")]
    pub basic_salary: Decimal,
    #[schema(value_type = String, example = "8.00")]
    pub regular_hours: Decimal,
    #[schema(value_type = String, example = "2.00")]
    pub ot_hours: Decimal,
    #[schema(value_type = String, example = "300.00")]
    pub ot_rate: Decimal,
    #[schema(value_type = String, example = "600.00")]
    pub ot_pay: Decimal,
    #[schema(value_type = String, example = "500.00")]
    pub task_allowances: Decimal,
    #[schema(value_type = String, example = "500.00")]
    pub total_allowances: Decimal,
    #[schema(value_type = String, example = "33100.00")]
    pub gross_salary: Decimal,
    #[schema(value_type = String, example = "3310.00")]
    pub deductions: Decimal,
    #[schema(value_type = String, example = "29790.00")]
    pub net_salary: Decimal,
    #[schema(value_type = String, format = "date", example = "2025-04-01")]
    pub payment_date: NaiveDate,
    pub status: PayrollStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PayrollRecord {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1001)]
    pub employee_id: u64,
    #[schema(example = 3)]
    pub month: u8,
    #[schema(example = 2025)]
    pub year: u16,
    /// Display name from the employee's user profile, when one is linked.
    #[schema(example = "Amina Yusuf", nullable = true)]
    pub employee_name: Option<String>,
    #[serde(flatten)]
    pub fields: PayrollFields,
}

impl PayrollRecord {
    pub fn key(&self) -> PeriodKey {
        PeriodKey {
            employee_id: self.employee_id,
            month: self.month,
            year: self.year,
        }
    }
}
