use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::{FromRow, MySqlPool};
use tracing::debug;

use super::{AttendanceRepository, PayrollRepository, StoreError, StoreFuture, StoreResult};
use crate::model::attendance::{AttendanceEntry, AttendanceRecord, AttendanceStatus, Stamp};
use crate::model::employee::Employee;
use crate::model::payroll::{PayrollFields, PayrollRecord, PayrollStatus, PeriodKey};
use crate::model::task::{Task, TaskStatus};

// callers append WHERE / ORDER BY against the `p` alias
const PAYROLL_SELECT: &str = r#"
    SELECT p.id, p.employee_id, p.month, p.year, p.basic_salary, p.regular_hours, p.ot_hours,
           p.ot_rate, p.ot_pay, p.task_allowances, p.total_allowances, p.gross_salary,
           p.deductions, p.net_salary, p.payment_date, p.status, u.name AS employee_name
    FROM payroll p
    LEFT JOIN employees e ON e.id = p.employee_id
    LEFT JOIN users u ON u.id = e.user_id
"#;

const ATTENDANCE_COLUMNS: &str =
    "id, employee_id, date, check_in, check_out, ot_check_in, ot_check_out, status";

#[derive(FromRow)]
struct EmployeeRow {
    id: u64,
    salary: Decimal,
    name: Option<String>,
}

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    employee_id: u64,
    date: NaiveDate,
    check_in: Option<NaiveDateTime>,
    check_out: Option<NaiveDateTime>,
    ot_check_in: Option<NaiveDateTime>,
    ot_check_out: Option<NaiveDateTime>,
    status: String,
}

#[derive(FromRow)]
struct TaskRow {
    id: u64,
    assigned_to: u64,
    status: String,
    allowances: Option<Decimal>,
}

#[derive(FromRow)]
struct PayrollRow {
    id: u64,
    employee_id: u64,
    month: u8,
    year: u16,
    basic_salary: Decimal,
    regular_hours: Decimal,
    ot_hours: Decimal,
    ot_rate: Decimal,
    ot_pay: Decimal,
    task_allowances: Decimal,
    total_allowances: Decimal,
    gross_salary: Decimal,
    deductions: Decimal,
    net_salary: Decimal,
    payment_date: NaiveDate,
    status: String,
    employee_name: Option<String>,
}

#[derive(FromRow)]
struct AttendanceEntryRow {
    #[sqlx(flatten)]
    attendance: AttendanceRow,
    employee_name: Option<String>,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Employee {
            id: row.id,
            salary: row.salary,
            name: row.name,
        }
    }
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> StoreResult<Self> {
        let status: AttendanceStatus = row.status.parse().map_err(|_| {
            StoreError::InvalidRow(format!("attendance {} has status {:?}", row.id, row.status))
        })?;

        Ok(AttendanceRecord {
            id: row.id,
            employee_id: row.employee_id,
            date: row.date,
            check_in: row.check_in,
            check_out: row.check_out,
            ot_check_in: row.ot_check_in,
            ot_check_out: row.ot_check_out,
            status,
        })
    }
}

impl TryFrom<TaskRow> for Task {
    type Error = StoreError;

    fn try_from(row: TaskRow) -> StoreResult<Self> {
        let status: TaskStatus = row.status.parse().map_err(|_| {
            StoreError::InvalidRow(format!("task {} has status {:?}", row.id, row.status))
        })?;

        Ok(Task {
            id: row.id,
            assigned_to: row.assigned_to,
            status,
            allowances: row.allowances,
        })
    }
}

impl TryFrom<PayrollRow> for PayrollRecord {
    type Error = StoreError;

    fn try_from(row: PayrollRow) -> StoreResult<Self> {
        let status: PayrollStatus = row.status.parse().map_err(|_| {
            StoreError::InvalidRow(format!("payroll {} has status {:?}", row.id, row.status))
        })?;

        Ok(PayrollRecord {
            id: row.id,
            employee_id: row.employee_id,
            month: row.month,
            year: row.year,
            employee_name: row.employee_name,
            fields: PayrollFields {
                basic_salary: row.basic_salary,
                regular_hours: row.regular_hours,
                ot_hours: row.ot_hours,
                ot_rate: row.ot_rate,
                ot_pay: row.ot_pay,
                task_allowances: row.task_allowances,
                total_allowances: row.total_allowances,
                gross_salary: row.gross_salary,
                deductions: row.deductions,
                net_salary: row.net_salary,
                payment_date: row.payment_date,
                status,
            },
        })
    }
}

impl TryFrom<AttendanceEntryRow> for AttendanceEntry {
    type Error = StoreError;

    fn try_from(row: AttendanceEntryRow) -> StoreResult<Self> {
        Ok(AttendanceEntry {
            record: row.attendance.try_into()?,
            employee_name: row.employee_name,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

fn is_duplicate_key(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// MySQL-backed implementation of both repositories.
#[derive(Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn payroll_by_id(&self, id: u64) -> StoreResult<Option<PayrollRecord>> {
        let sql = format!("{PAYROLL_SELECT} WHERE p.id = ?");
        sqlx::query_as::<_, PayrollRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(PayrollRecord::try_from)
            .transpose()
    }

    async fn attendance_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = ? AND date = ?");
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?
            .map(AttendanceRecord::try_from)
            .transpose()
    }
}

impl PayrollRepository for MySqlRepository {
    fn find_employee(&self, employee_id: u64) -> StoreFuture<'_, Option<Employee>> {
        Box::pin(async move {
            let row = sqlx::query_as::<_, EmployeeRow>(
                r#"
                SELECT e.id, e.salary, u.name
                FROM employees e
                LEFT JOIN users u ON u.id = e.user_id
                WHERE e.id = ?
                "#,
            )
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await?;

            Ok(row.map(Employee::from))
        })
    }

    fn attendance_between(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreFuture<'_, Vec<AttendanceRecord>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
                 WHERE employee_id = ? AND date >= ? AND date <= ? ORDER BY date"
            );
            let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
                .bind(employee_id)
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool)
                .await?;

            convert_all(rows)
        })
    }

    fn completed_tasks(&self, employee_id: u64) -> StoreFuture<'_, Vec<Task>> {
        Box::pin(async move {
            let rows = sqlx::query_as::<_, TaskRow>(
                r#"
                SELECT id, assigned_to, status, allowances
                FROM tasks
                WHERE assigned_to = ? AND status = 'completed'
                "#,
            )
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;

            convert_all(rows)
        })
    }

    fn find_payroll_period(&self, key: PeriodKey) -> StoreFuture<'_, Option<PayrollRecord>> {
        Box::pin(async move {
            let sql = format!("{PAYROLL_SELECT} WHERE p.employee_id = ? AND p.month = ? AND p.year = ?");
            sqlx::query_as::<_, PayrollRow>(&sql)
                .bind(key.employee_id)
                .bind(key.month)
                .bind(key.year)
                .fetch_optional(&self.pool)
                .await?
                .map(PayrollRecord::try_from)
                .transpose()
        })
    }

    fn insert_payroll(&self, key: PeriodKey, fields: PayrollFields) -> StoreFuture<'_, PayrollRecord> {
        Box::pin(async move {
            let result = sqlx::query(
                r#"
                INSERT INTO payroll
                (employee_id, month, year, basic_salary, regular_hours, ot_hours, ot_rate, ot_pay,
                 task_allowances, total_allowances, gross_salary, deductions, net_salary,
                 payment_date, status)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(key.employee_id)
            .bind(key.month)
            .bind(key.year)
            .bind(fields.basic_salary)
            .bind(fields.regular_hours)
            .bind(fields.ot_hours)
            .bind(fields.ot_rate)
            .bind(fields.ot_pay)
            .bind(fields.task_allowances)
            .bind(fields.total_allowances)
            .bind(fields.gross_salary)
            .bind(fields.deductions)
            .bind(fields.net_salary)
            .bind(fields.payment_date)
            .bind(fields.status.as_ref())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    StoreError::Duplicate
                } else {
                    StoreError::Database(e)
                }
            })?;

            let id = result.last_insert_id();
            debug!(payroll_id = id, period = %key, "Inserted payroll");

            self.payroll_by_id(id)
                .await?
                .ok_or_else(|| StoreError::InvalidRow(format!("payroll {id} missing after insert")))
        })
    }

    fn update_payroll(&self, id: u64, fields: PayrollFields) -> StoreFuture<'_, PayrollRecord> {
        Box::pin(async move {
            sqlx::query(
                r#"
                UPDATE payroll
                SET basic_salary = ?, regular_hours = ?, ot_hours = ?, ot_rate = ?, ot_pay = ?,
                    task_allowances = ?, total_allowances = ?, gross_salary = ?, deductions = ?,
                    net_salary = ?, payment_date = ?, status = ?
                WHERE id = ?
                "#,
            )
            .bind(fields.basic_salary)
            .bind(fields.regular_hours)
            .bind(fields.ot_hours)
            .bind(fields.ot_rate)
            .bind(fields.ot_pay)
            .bind(fields.task_allowances)
            .bind(fields.total_allowances)
            .bind(fields.gross_salary)
            .bind(fields.deductions)
            .bind(fields.net_salary)
            .bind(fields.payment_date)
            .bind(fields.status.as_ref())
            .bind(id)
            .execute(&self.pool)
            .await?;

            self.payroll_by_id(id)
                .await?
                .ok_or_else(|| StoreError::InvalidRow(format!("payroll {id} vanished during update")))
        })
    }

    fn get_payroll(&self, id: u64) -> StoreFuture<'_, Option<PayrollRecord>> {
        Box::pin(self.payroll_by_id(id))
    }

    fn list_payrolls(&self, page: u32, per_page: u32) -> StoreFuture<'_, (Vec<PayrollRecord>, i64)> {
        Box::pin(async move {
            let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM payroll")
                .fetch_one(&self.pool)
                .await?;

            let offset = page.saturating_sub(1) as i64 * per_page as i64;
            let sql = format!("{PAYROLL_SELECT} ORDER BY p.year DESC, p.month DESC, p.id DESC LIMIT ? OFFSET ?");
            let rows = sqlx::query_as::<_, PayrollRow>(&sql)
                .bind(per_page as i64)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;

            Ok((convert_all(rows)?, total))
        })
    }

    fn employee_payrolls(&self, employee_id: u64) -> StoreFuture<'_, Vec<PayrollRecord>> {
        Box::pin(async move {
            let sql = format!("{PAYROLL_SELECT} WHERE p.employee_id = ? ORDER BY p.year DESC, p.month DESC");
            let rows = sqlx::query_as::<_, PayrollRow>(&sql)
                .bind(employee_id)
                .fetch_all(&self.pool)
                .await?;

            convert_all(rows)
        })
    }

    fn set_payroll_status(
        &self,
        id: u64,
        status: PayrollStatus,
    ) -> StoreFuture<'_, Option<PayrollRecord>> {
        Box::pin(async move {
            // a missing id shows up as None on the re-read
            sqlx::query("UPDATE payroll SET status = ? WHERE id = ?")
                .bind(status.as_ref())
                .bind(id)
                .execute(&self.pool)
                .await?;

            self.payroll_by_id(id).await
        })
    }

    fn delete_payroll(&self, id: u64) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM payroll WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?;

            Ok(result.rows_affected() > 0)
        })
    }
}

impl AttendanceRepository for MySqlRepository {
    fn attendance_on(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> StoreFuture<'_, Option<AttendanceRecord>> {
        Box::pin(self.attendance_day(employee_id, date))
    }

    fn attendance_for(&self, employee_id: u64) -> StoreFuture<'_, Vec<AttendanceRecord>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = ? ORDER BY date DESC"
            );
            let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
                .bind(employee_id)
                .fetch_all(&self.pool)
                .await?;

            convert_all(rows)
        })
    }

    fn list_attendance(
        &self,
        page: u32,
        per_page: u32,
    ) -> StoreFuture<'_, (Vec<AttendanceEntry>, i64)> {
        Box::pin(async move {
            let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM attendance")
                .fetch_one(&self.pool)
                .await?;

            let offset = page.saturating_sub(1) as i64 * per_page as i64;
            let rows = sqlx::query_as::<_, AttendanceEntryRow>(
                r#"
                SELECT a.id, a.employee_id, a.date, a.check_in, a.check_out, a.ot_check_in,
                       a.ot_check_out, a.status, u.name AS employee_name
                FROM attendance a
                LEFT JOIN employees e ON e.id = a.employee_id
                LEFT JOIN users u ON u.id = e.user_id
                ORDER BY a.date DESC, a.id DESC
                LIMIT ? OFFSET ?
                "#,
            )
            .bind(per_page as i64)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

            Ok((convert_all(rows)?, total))
        })
    }

    fn stamp(
        &self,
        employee_id: u64,
        date: NaiveDate,
        stamp: Stamp,
        at: NaiveDateTime,
    ) -> StoreFuture<'_, Option<AttendanceRecord>> {
        Box::pin(async move {
            let sql = match stamp {
                // an absent day can still be checked into; a checked-in one is left alone
                Stamp::CheckIn => {
                    r#"
                    INSERT INTO attendance (check_in, employee_id, date, status)
                    VALUES (?, ?, ?, 'present')
                    ON DUPLICATE KEY UPDATE
                        status = IF(check_in IS NULL, 'present', status),
                        check_in = COALESCE(check_in, VALUES(check_in))
                    "#
                }
                Stamp::CheckOut => {
                    r#"
                    UPDATE attendance SET check_out = ?
                    WHERE employee_id = ? AND date = ?
                    AND check_in IS NOT NULL AND check_out IS NULL
                    "#
                }
                Stamp::OtCheckIn => {
                    r#"
                    UPDATE attendance SET ot_check_in = ?
                    WHERE employee_id = ? AND date = ?
                    AND check_out IS NOT NULL AND ot_check_in IS NULL
                    "#
                }
                Stamp::OtCheckOut => {
                    r#"
                    UPDATE attendance SET ot_check_out = ?
                    WHERE employee_id = ? AND date = ?
                    AND ot_check_in IS NOT NULL AND ot_check_out IS NULL
                    "#
                }
            };

            let result = sqlx::query(sql)
                .bind(at)
                .bind(employee_id)
                .bind(date)
                .execute(&self.pool)
                .await?;

            if result.rows_affected() == 0 {
                debug!(employee_id, %date, %stamp, "Attendance stamp condition no longer held");
                return Ok(None);
            }

            // a concurrent check-in keeps the earlier stamp; only report our own write
            let record = self.attendance_day(employee_id, date).await?;
            Ok(record.filter(|r| r.stamped(stamp) == Some(at)))
        })
    }
}
