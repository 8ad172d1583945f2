//! Storage collaborators of the payroll engine and the attendance ledger.
//!
//! The traits are object safe so handlers can take `web::Data<dyn ...>`; every method
//! returns a boxed future borrowing only `self`.

use chrono::{NaiveDate, NaiveDateTime};
use futures::future::LocalBoxFuture;
use thiserror::Error;

use crate::model::attendance::{AttendanceEntry, AttendanceRecord, Stamp};
use crate::model::employee::Employee;
use crate::model::payroll::{PayrollFields, PayrollRecord, PayrollStatus, PeriodKey};
use crate::model::task::Task;

pub mod mysql;

#[cfg(test)]
pub mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("a record with the same natural key already exists")]
    Duplicate,
    #[error("malformed row: {0}")]
    InvalidRow(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
pub type StoreFuture<'a, T> = LocalBoxFuture<'a, StoreResult<T>>;

pub trait PayrollRepository: Send + Sync {
    fn find_employee(&self, employee_id: u64) -> StoreFuture<'_, Option<Employee>>;

    /// Attendance days with `start <= date <= end`.
    fn attendance_between(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreFuture<'_, Vec<AttendanceRecord>>;

    /// Tasks assigned to the employee whose status is `completed`.
    fn completed_tasks(&self, employee_id: u64) -> StoreFuture<'_, Vec<Task>>;

    fn find_payroll_period(&self, key: PeriodKey) -> StoreFuture<'_, Option<PayrollRecord>>;

    /// Fails with [`StoreError::Duplicate`] when the period already has a record.
    fn insert_payroll(&self, key: PeriodKey, fields: PayrollFields) -> StoreFuture<'_, PayrollRecord>;

    fn update_payroll(&self, id: u64, fields: PayrollFields) -> StoreFuture<'_, PayrollRecord>;

    fn get_payroll(&self, id: u64) -> StoreFuture<'_, Option<PayrollRecord>>;

    /// One page, newest period first, plus the total number of records.
    fn list_payrolls(&self, page: u32, per_page: u32) -> StoreFuture<'_, (Vec<PayrollRecord>, i64)>;

    fn employee_payrolls(&self, employee_id: u64) -> StoreFuture<'_, Vec<PayrollRecord>>;

    fn set_payroll_status(
        &self,
        id: u64,
        status: PayrollStatus,
    ) -> StoreFuture<'_, Option<PayrollRecord>>;

    fn delete_payroll(&self, id: u64) -> StoreFuture<'_, bool>;
}

pub trait AttendanceRepository: Send + Sync {
    fn attendance_on(&self, employee_id: u64, date: NaiveDate)
    -> StoreFuture<'_, Option<AttendanceRecord>>;

    /// Whole history, newest day first.
    fn attendance_for(&self, employee_id: u64) -> StoreFuture<'_, Vec<AttendanceRecord>>;

    /// One page across all employees, newest day first, plus the total number of records.
    fn list_attendance(&self, page: u32, per_page: u32)
    -> StoreFuture<'_, (Vec<AttendanceEntry>, i64)>;

    /// Writes `stamp = at` on the day's record if the stamp is still empty and its
    /// prerequisite stamp is set. `None` means the condition no longer held.
    fn stamp(
        &self,
        employee_id: u64,
        date: NaiveDate,
        stamp: Stamp,
        at: NaiveDateTime,
    ) -> StoreFuture<'_, Option<AttendanceRecord>>;
}
