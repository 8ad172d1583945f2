use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What payroll needs to know about an employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: u64,
    pub salary: Decimal,
    /// Display name from the linked user profile, if there is one.
    pub name: Option<String>,
}
