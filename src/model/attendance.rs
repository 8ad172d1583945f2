use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

/// One employee's attendance for one calendar day. `(employee_id, date)` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceRecord {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_in: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub ot_check_in: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub ot_check_out: Option<NaiveDateTime>,
    pub status: AttendanceStatus,
}

/// An attendance day with the employee's display name, for cross-employee listings.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AttendanceEntry {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    #[schema(example = "Kofi Mensah", nullable = true)]
    pub employee_name: Option<String>,
}

/// A pair of optional stamps seen as a work interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    NotStarted,
    Open { start: NaiveDateTime },
    Closed { start: NaiveDateTime, end: NaiveDateTime },
}

impl Interval {
    pub fn from_stamps(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        match (start, end) {
            (Some(start), Some(end)) => Interval::Closed { start, end },
            (Some(start), None) => Interval::Open { start },
            // an end without a start is not a usable interval
            (None, _) => Interval::NotStarted,
        }
    }

    /// Signed length of a closed interval. Open and unstarted intervals are zero.
    pub fn elapsed(&self) -> TimeDelta {
        match self {
            Interval::Closed { start, end } => *end - *start,
            _ => TimeDelta::zero(),
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Interval::Closed { .. })
    }
}

impl AttendanceRecord {
    pub fn shift(&self) -> Interval {
        Interval::from_stamps(self.check_in, self.check_out)
    }

    pub fn overtime(&self) -> Interval {
        Interval::from_stamps(self.ot_check_in, self.ot_check_out)
    }

    pub fn stamped(&self, stamp: Stamp) -> Option<NaiveDateTime> {
        match stamp {
            Stamp::CheckIn => self.check_in,
            Stamp::CheckOut => self.check_out,
            Stamp::OtCheckIn => self.ot_check_in,
            Stamp::OtCheckOut => self.ot_check_out,
        }
    }
}

/// Column set by a clock action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Stamp {
    CheckIn,
    CheckOut,
    OtCheckIn,
    OtCheckOut,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClockError {
    #[error("Already checked in today")]
    AlreadyCheckedIn,
    #[error("No active check-in found for today")]
    NoActiveShift,
    #[error("Please complete regular check-out first")]
    CheckOutRequired,
    #[error("Already checked in for OT today")]
    AlreadyOnOvertime,
    #[error("No active OT check-in found for today")]
    NoActiveOvertime,
}

impl Stamp {
    /// Checks that this stamp is a legal next step for today's record.
    pub fn validate(self, today: Option<&AttendanceRecord>) -> Result<(), ClockError> {
        let (shift, overtime) = match today {
            Some(record) => (record.shift(), record.overtime()),
            None => (Interval::NotStarted, Interval::NotStarted),
        };

        match self {
            Stamp::CheckIn => match shift {
                Interval::NotStarted => Ok(()),
                _ => Err(ClockError::AlreadyCheckedIn),
            },
            Stamp::CheckOut => match shift {
                Interval::Open { .. } => Ok(()),
                _ => Err(ClockError::NoActiveShift),
            },
            Stamp::OtCheckIn => {
                if !shift.is_closed() {
                    return Err(ClockError::CheckOutRequired);
                }
                match overtime {
                    Interval::NotStarted => Ok(()),
                    _ => Err(ClockError::AlreadyOnOvertime),
                }
            }
            Stamp::OtCheckOut => match overtime {
                Interval::Open { .. } => Ok(()),
                _ => Err(ClockError::NoActiveOvertime),
            },
        }
    }

    /// Error reported when the store refused the write because another request stamped first.
    pub fn lost_race(self) -> ClockError {
        match self {
            Stamp::CheckIn => ClockError::AlreadyCheckedIn,
            Stamp::CheckOut => ClockError::NoActiveShift,
            Stamp::OtCheckIn => ClockError::AlreadyOnOvertime,
            Stamp::OtCheckOut => ClockError::NoActiveOvertime,
        }
    }
}

#[cfg(test)]
pub(crate) fn at(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, minute, 0).unwrap()
}
