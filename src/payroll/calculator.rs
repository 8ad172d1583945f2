use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::PayrollPolicy;
use crate::model::attendance::AttendanceRecord;
use crate::model::payroll::{PayrollFields, PayrollStatus};
use crate::model::task::Task;
use crate::payroll::allowance::aggregate_allowances;
use crate::payroll::hours::{aggregate_hours, pay_for};

/// Unrounded result of one payroll computation.
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollComputation {
    pub basic_salary: Decimal,
    pub regular_hours: Decimal,
    pub ot_hours: Decimal,
    pub ot_rate: Decimal,
    pub ot_pay: Decimal,
    pub task_allowances: Decimal,
    pub total_allowances: Decimal,
    pub gross_salary: Decimal,
    pub deductions: Decimal,
    pub net_salary: Decimal,
}

pub fn compute(
    policy: &PayrollPolicy,
    basic_salary: Decimal,
    attendance: &[AttendanceRecord],
    tasks: &[Task],
) -> PayrollComputation {
    let worked = aggregate_hours(attendance);

    let ot_rate = basic_salary / policy.standard_hours * policy.ot_multiplier;
    let ot_pay = pay_for(worked.overtime, ot_rate);

    let task_allowances = aggregate_allowances(tasks);
    // other allowance kinds would be added here
    let total_allowances = task_allowances;

    let gross_salary = basic_salary + ot_pay + total_allowances;
    let deductions = gross_salary * policy.deduction_rate;
    let net_salary = gross_salary - deductions;

    PayrollComputation {
        basic_salary,
        regular_hours: worked.regular_hours(),
        ot_hours: worked.overtime_hours(),
        ot_rate,
        ot_pay,
        task_allowances,
        total_allowances,
        gross_salary,
        deductions,
        net_salary,
    }
}

impl PayrollComputation {
    /// Storable fields for a freshly (re)generated record.
    pub fn to_fields(&self, payment_date: NaiveDate) -> PayrollFields {
        PayrollFields {
            basic_salary: round_money(self.basic_salary),
            regular_hours: round_money(self.regular_hours),
            ot_hours: round_money(self.ot_hours),
            ot_rate: round_money(self.ot_rate),
            ot_pay: round_money(self.ot_pay),
            task_allowances: round_money(self.task_allowances),
            total_allowances: round_money(self.total_allowances),
            gross_salary: round_money(self.gross_salary),
            deductions: round_money(self.deductions),
            net_salary: round_money(self.net_salary),
            payment_date,
            status: PayrollStatus::Generated,
        }
    }
}

/// Two decimal places, half away from zero, always carrying scale 2.
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}
