use chrono::TimeDelta;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::warn;

use crate::model::attendance::{AttendanceRecord, Interval};

const MILLIS_PER_HOUR: Decimal = dec!(3600000);

/// Regular and overtime durations summed over a set of attendance days.
///
/// Kept as exact durations; hours are derived on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkedTime {
    pub regular: TimeDelta,
    pub overtime: TimeDelta,
}

impl Default for WorkedTime {
    fn default() -> Self {
        Self {
            regular: TimeDelta::zero(),
            overtime: TimeDelta::zero(),
        }
    }
}

impl WorkedTime {
    pub fn regular_hours(&self) -> Decimal {
        to_hours(self.regular)
    }

    pub fn overtime_hours(&self) -> Decimal {
        to_hours(self.overtime)
    }
}

pub fn to_hours(duration: TimeDelta) -> Decimal {
    Decimal::from(duration.num_milliseconds()) / MILLIS_PER_HOUR
}

/// `rate` per hour for `duration`, multiplying before dividing to keep the result exact.
pub fn pay_for(duration: TimeDelta, rate: Decimal) -> Decimal {
    Decimal::from(duration.num_milliseconds()) * rate / MILLIS_PER_HOUR
}

/// Sums closed shift and overtime intervals. Open intervals count as zero.
pub fn aggregate_hours(records: &[AttendanceRecord]) -> WorkedTime {
    records.iter().fold(WorkedTime::default(), |mut total, record| {
        total.regular = total.regular + counted(record, record.shift(), "shift");
        total.overtime = total.overtime + counted(record, record.overtime(), "overtime");
        total
    })
}

// An interval that ends before it starts contributes nothing.
fn counted(record: &AttendanceRecord, interval: Interval, kind: &str) -> TimeDelta {
    let elapsed = interval.elapsed();
    if elapsed < TimeDelta::zero() {
        warn!(
            employee_id = record.employee_id,
            date = %record.date,
            kind,
            minutes = elapsed.num_minutes(),
            "Ignoring attendance interval that ends before it starts"
        );
        return TimeDelta::zero();
    }
    elapsed
}
