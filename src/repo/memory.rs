//! In-process stand-in for MySQL used by the tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::{NaiveDate, NaiveDateTime};

use super::{AttendanceRepository, PayrollRepository, StoreError, StoreFuture, StoreResult};
use crate::model::attendance::{AttendanceEntry, AttendanceRecord, AttendanceStatus, Stamp};
use crate::model::employee::Employee;
use crate::model::payroll::{PayrollFields, PayrollRecord, PayrollStatus, PeriodKey};
use crate::model::task::{Task, TaskStatus};

#[derive(Default)]
struct State {
    employees: BTreeMap<u64, Employee>,
    attendance: Vec<AttendanceRecord>,
    tasks: Vec<Task>,
    payrolls: BTreeMap<u64, PayrollRecord>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
    /// Makes the next `find_payroll_period` miss, as if a concurrent insert had not landed yet.
    pub miss_next_period_lookup: AtomicBool,
    /// Makes task reads fail.
    pub fail_task_reads: AtomicBool,
    pub payroll_writes: AtomicUsize,
}

impl MemoryRepository {
    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn add_employee(&self, id: u64, salary: rust_decimal::Decimal, name: Option<&str>) {
        self.with_state(|s| {
            s.employees.insert(
                id,
                Employee {
                    id,
                    salary,
                    name: name.map(str::to_string),
                },
            );
        });
    }

    pub fn set_salary(&self, id: u64, salary: rust_decimal::Decimal) {
        self.with_state(|s| {
            if let Some(e) = s.employees.get_mut(&id) {
                e.salary = salary;
            }
        });
    }

    pub fn add_attendance(&self, mut record: AttendanceRecord) {
        self.with_state(|s| {
            record.id = s.next_id();
            s.attendance.push(record);
        });
    }

    pub fn add_task(&self, assigned_to: u64, status: TaskStatus, allowances: Option<rust_decimal::Decimal>) {
        self.with_state(|s| {
            let id = s.next_id();
            s.tasks.push(Task {
                id,
                assigned_to,
                status,
                allowances,
            });
        });
    }

    pub fn payrolls(&self) -> Vec<PayrollRecord> {
        self.with_state(|s| s.payrolls.values().cloned().collect())
    }

    fn sorted_newest_first(mut records: Vec<PayrollRecord>) -> Vec<PayrollRecord> {
        records.sort_by(|a, b| (b.year, b.month, b.id).cmp(&(a.year, a.month, a.id)));
        records
    }
}

fn ready<'a, T: 'a>(result: StoreResult<T>) -> StoreFuture<'a, T> {
    Box::pin(futures::future::ready(result))
}

impl PayrollRepository for MemoryRepository {
    fn find_employee(&self, employee_id: u64) -> StoreFuture<'_, Option<Employee>> {
        ready(Ok(self.with_state(|s| s.employees.get(&employee_id).cloned())))
    }

    fn attendance_between(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreFuture<'_, Vec<AttendanceRecord>> {
        ready(Ok(self.with_state(|s| {
            s.attendance
                .iter()
                .filter(|a| a.employee_id == employee_id && a.date >= start && a.date <= end)
                .cloned()
                .collect()
        })))
    }

    fn completed_tasks(&self, employee_id: u64) -> StoreFuture<'_, Vec<Task>> {
        if self.fail_task_reads.load(Ordering::SeqCst) {
            return ready(Err(StoreError::InvalidRow("tasks table unavailable".to_string())));
        }
        ready(Ok(self.with_state(|s| {
            s.tasks
                .iter()
                .filter(|t| t.assigned_to == employee_id && t.status == TaskStatus::Completed)
                .cloned()
                .collect()
        })))
    }

    fn find_payroll_period(&self, key: PeriodKey) -> StoreFuture<'_, Option<PayrollRecord>> {
        if self.miss_next_period_lookup.swap(false, Ordering::SeqCst) {
            return ready(Ok(None));
        }
        ready(Ok(self.with_state(|s| {
            s.payrolls.values().find(|p| p.key() == key).cloned()
        })))
    }

    fn insert_payroll(&self, key: PeriodKey, fields: PayrollFields) -> StoreFuture<'_, PayrollRecord> {
        let result = self.with_state(|s| {
            if s.payrolls.values().any(|p| p.key() == key) {
                return Err(StoreError::Duplicate);
            }
            let record = PayrollRecord {
                id: s.next_id(),
                employee_id: key.employee_id,
                month: key.month,
                year: key.year,
                employee_name: s
                    .employees
                    .get(&key.employee_id)
                    .and_then(|e| e.name.clone()),
                fields,
            };
            s.payrolls.insert(record.id, record.clone());
            Ok(record)
        });
        if result.is_ok() {
            self.payroll_writes.fetch_add(1, Ordering::SeqCst);
        }
        ready(result)
    }

    fn update_payroll(&self, id: u64, fields: PayrollFields) -> StoreFuture<'_, PayrollRecord> {
        let result = self.with_state(|s| match s.payrolls.get_mut(&id) {
            Some(record) => {
                record.fields = fields;
                Ok(record.clone())
            }
            None => Err(StoreError::InvalidRow(format!("payroll {id} vanished during update"))),
        });
        if result.is_ok() {
            self.payroll_writes.fetch_add(1, Ordering::SeqCst);
        }
        ready(result)
    }

    fn get_payroll(&self, id: u64) -> StoreFuture<'_, Option<PayrollRecord>> {
        ready(Ok(self.with_state(|s| s.payrolls.get(&id).cloned())))
    }

    fn list_payrolls(&self, page: u32, per_page: u32) -> StoreFuture<'_, (Vec<PayrollRecord>, i64)> {
        let all = Self::sorted_newest_first(self.payrolls());
        let total = all.len() as i64;
        let skip = page.saturating_sub(1) as usize * per_page as usize;
        let data = all.into_iter().skip(skip).take(per_page as usize).collect();
        ready(Ok((data, total)))
    }

    fn employee_payrolls(&self, employee_id: u64) -> StoreFuture<'_, Vec<PayrollRecord>> {
        let mine = self
            .payrolls()
            .into_iter()
            .filter(|p| p.employee_id == employee_id)
            .collect();
        ready(Ok(Self::sorted_newest_first(mine)))
    }

    fn set_payroll_status(
        &self,
        id: u64,
        status: PayrollStatus,
    ) -> StoreFuture<'_, Option<PayrollRecord>> {
        ready(Ok(self.with_state(|s| {
            s.payrolls.get_mut(&id).map(|record| {
                record.fields.status = status;
                record.clone()
            })
        })))
    }

    fn delete_payroll(&self, id: u64) -> StoreFuture<'_, bool> {
        ready(Ok(self.with_state(|s| s.payrolls.remove(&id).is_some())))
    }
}

impl AttendanceRepository for MemoryRepository {
    fn attendance_on(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> StoreFuture<'_, Option<AttendanceRecord>> {
        ready(Ok(self.with_state(|s| {
            s.attendance
                .iter()
                .find(|a| a.employee_id == employee_id && a.date == date)
                .cloned()
        })))
    }

    fn attendance_for(&self, employee_id: u64) -> StoreFuture<'_, Vec<AttendanceRecord>> {
        let mut mine: Vec<AttendanceRecord> = self.with_state(|s| {
            s.attendance
                .iter()
                .filter(|a| a.employee_id == employee_id)
                .cloned()
                .collect()
        });
        mine.sort_by(|a, b| b.date.cmp(&a.date));
        ready(Ok(mine))
    }

    fn list_attendance(
        &self,
        page: u32,
        per_page: u32,
    ) -> StoreFuture<'_, (Vec<AttendanceEntry>, i64)> {
        ready(Ok(self.with_state(|s| {
            let mut all: Vec<AttendanceEntry> = s
                .attendance
                .iter()
                .map(|a| AttendanceEntry {
                    record: a.clone(),
                    employee_name: s.employees.get(&a.employee_id).and_then(|e| e.name.clone()),
                })
                .collect();
            all.sort_by(|a, b| (b.record.date, b.record.id).cmp(&(a.record.date, a.record.id)));

            let total = all.len() as i64;
            let skip = page.saturating_sub(1) as usize * per_page as usize;
            let data = all.into_iter().skip(skip).take(per_page as usize).collect();
            (data, total)
        })))
    }

    fn stamp(
        &self,
        employee_id: u64,
        date: NaiveDate,
        stamp: Stamp,
        at: NaiveDateTime,
    ) -> StoreFuture<'_, Option<AttendanceRecord>> {
        ready(Ok(self.with_state(|s| {
            let existing = s
                .attendance
                .iter()
                .position(|a| a.employee_id == employee_id && a.date == date);

            let index = match (stamp, existing) {
                (Stamp::CheckIn, None) => {
                    let id = s.next_id();
                    s.attendance.push(AttendanceRecord {
                        id,
                        employee_id,
                        date,
                        check_in: None,
                        check_out: None,
                        ot_check_in: None,
                        ot_check_out: None,
                        status: AttendanceStatus::Present,
                    });
                    s.attendance.len() - 1
                }
                (_, Some(index)) => index,
                (_, None) => return None,
            };

            let record = &mut s.attendance[index];
            let (slot, prerequisite) = match stamp {
                Stamp::CheckIn => (&mut record.check_in, true),
                Stamp::CheckOut => (&mut record.check_out, record.check_in.is_some()),
                Stamp::OtCheckIn => (&mut record.ot_check_in, record.check_out.is_some()),
                Stamp::OtCheckOut => (&mut record.ot_check_out, record.ot_check_in.is_some()),
            };
            if slot.is_some() || !prerequisite {
                return None;
            }
            *slot = Some(at);
            if stamp == Stamp::CheckIn {
                record.status = AttendanceStatus::Present;
            }
            Some(record.clone())
        })))
    }
}
