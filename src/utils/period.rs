use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PayrollError;

/// A validated calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPeriod {
    month: u8,
    year: u16,
}

impl PayPeriod {
    /// Month must be 1-12 and year a positive four digit number.
    pub fn new(month: i64, year: i64) -> Result<Self, PayrollError> {
        if !(1..=12).contains(&month) || !(1000..=9999).contains(&year) {
            return Err(PayrollError::InvalidPeriod { month, year });
        }

        Ok(Self {
            month: month as u8,
            year: year as u16,
        })
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    /// First and last day of the month, both inclusive.
    pub fn bounds(&self) -> Result<(NaiveDate, NaiveDate), PayrollError> {
        month_bounds(self.year, self.month)
    }
}

/// First and last calendar day of `month` in `year`, or `InvalidPeriod` for a month outside 1-12.
pub fn month_bounds(year: u16, month: u8) -> Result<(NaiveDate, NaiveDate), PayrollError> {
    let invalid = || PayrollError::InvalidPeriod {
        month: i64::from(month),
        year: i64::from(year),
    };
    let (y, m) = (i32::from(year), u32::from(month));

    let start = NaiveDate::from_ymd_opt(y, m, 1).ok_or_else(invalid)?;
    let next_month = if m == 12 {
        NaiveDate::from_ymd_opt(y + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(y, m + 1, 1)
    };
    let end = next_month
        .and_then(|d| d.pred_opt())
        .ok_or_else(invalid)?;

    Ok((start, end))
}
