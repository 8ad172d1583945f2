use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::config::PayrollPolicy;
use crate::error::PayrollError;
use crate::model::payroll::{PayrollFields, PayrollRecord, PayrollStatus, PeriodKey};
use crate::payroll::calculator::compute;
use crate::payroll::locks::PeriodLocks;
use crate::payroll::payslip::PayslipSummary;
use crate::repo::{PayrollRepository, StoreError};
use crate::utils::period::PayPeriod;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GeneratedPayroll {
    pub payroll: PayrollRecord,
    pub summary: PayslipSummary,
}

pub struct PayrollService {
    repo: Arc<dyn PayrollRepository>,
    policy: PayrollPolicy,
    locks: PeriodLocks,
}

impl PayrollService {
    pub fn new(repo: Arc<dyn PayrollRepository>, policy: PayrollPolicy, lock_idle: Duration) -> Self {
        Self {
            repo,
            policy,
            locks: PeriodLocks::new(lock_idle),
        }
    }

    /// Computes the employee's pay for the month and upserts it under
    /// `(employee_id, month, year)`. Every call writes; `payment_date` becomes `today`.
    #[instrument(skip(self))]
    pub async fn generate(
        &self,
        employee_id: u64,
        month: i64,
        year: i64,
        today: NaiveDate,
    ) -> Result<GeneratedPayroll, PayrollError> {
        let period = PayPeriod::new(month, year)?;

        let employee = self
            .repo
            .find_employee(employee_id)
            .await?
            .ok_or(PayrollError::EmployeeNotFound(employee_id))?;

        let (start, end) = period.bounds()?;
        let attendance = self.repo.attendance_between(employee_id, start, end).await?;
        let tasks = self.repo.completed_tasks(employee_id).await?;

        let computation = compute(&self.policy, employee.salary, &attendance, &tasks);
        let fields = computation.to_fields(today);

        let key = PeriodKey {
            employee_id,
            month: period.month(),
            year: period.year(),
        };
        let payroll = self.upsert(key, fields).await?;

        info!(
            payroll_id = payroll.id,
            net_salary = %payroll.fields.net_salary,
            "Payroll generated for {}", key
        );

        Ok(GeneratedPayroll {
            summary: PayslipSummary::new(&employee, period, &computation),
            payroll,
        })
    }

    async fn upsert(&self, key: PeriodKey, fields: PayrollFields) -> Result<PayrollRecord, PayrollError> {
        let lock = self.locks.lock_for(key).await;
        let _guard = lock.lock().await;

        if let Some(existing) = self.repo.find_payroll_period(key).await? {
            return Ok(self.repo.update_payroll(existing.id, fields).await?);
        }

        match self.repo.insert_payroll(key, fields.clone()).await {
            Ok(record) => Ok(record),
            Err(StoreError::Duplicate) => {
                // another process inserted the period first
                warn!("Insert raced for {}, updating instead", key);
                let winner = self
                    .repo
                    .find_payroll_period(key)
                    .await?
                    .ok_or(PayrollError::ConcurrentGenerationConflict(key))?;
                Ok(self.repo.update_payroll(winner.id, fields).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list(&self, page: u32, per_page: u32) -> Result<(Vec<PayrollRecord>, i64), PayrollError> {
        Ok(self.repo.list_payrolls(page, per_page).await?)
    }

    pub async fn for_employee(&self, employee_id: u64) -> Result<Vec<PayrollRecord>, PayrollError> {
        Ok(self.repo.employee_payrolls(employee_id).await?)
    }

    pub async fn get(&self, id: u64) -> Result<PayrollRecord, PayrollError> {
        self.repo
            .get_payroll(id)
            .await?
            .ok_or(PayrollError::PayrollNotFound(id))
    }

    pub async fn set_status(&self, id: u64, status: PayrollStatus) -> Result<PayrollRecord, PayrollError> {
        let record = self
            .repo
            .set_payroll_status(id, status)
            .await?
            .ok_or(PayrollError::PayrollNotFound(id))?;
        info!(payroll_id = id, status = %status, "Payroll status updated");
        Ok(record)
    }

    pub async fn delete(&self, id: u64) -> Result<(), PayrollError> {
        if !self.repo.delete_payroll(id).await? {
            return Err(PayrollError::PayrollNotFound(id));
        }
        info!(payroll_id = id, "Payroll deleted");
        Ok(())
    }
}
