use rust_decimal::Decimal;

use crate::model::task::{Task, TaskStatus};

/// Sum of allowances over completed tasks. Amounts are taken as stored, sign included.
pub fn aggregate_allowances(tasks: &[Task]) -> Decimal {
    tasks
        .iter()
        .filter(|task| task.status == TaskStatus::Completed)
        .map(|task| task.allowances.unwrap_or_default())
        .sum()
}
