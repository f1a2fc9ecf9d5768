use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttendanceError {
    #[error("cannot mark attendance for {0}, it is in the future")]
    FutureDate(NaiveDate),

    #[error("{year}-{month} is not a calendar month")]
    InvalidMonth { year: i32, month: u32 },
}

/// DayCell
///
/// One day of the attendance calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DayCell {
    #[ts(type = "string")]
    pub date: NaiveDate,
    pub present: bool,
    /// Future days are shown but cannot be toggled.
    pub future: bool,
}

/// AttendanceSheet
///
/// Presence marks of one student in one batch, keyed by calendar day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AttendanceSheet {
    pub batch_id: String,
    pub student_id: String,
    #[ts(type = "Array<string>")]
    #[schema(value_type = Vec<String>)]
    present: BTreeSet<NaiveDate>,
}

impl AttendanceSheet {
    pub fn new(batch_id: impl Into<String>, student_id: impl Into<String>) -> Self {
        Self {
            batch_id: batch_id.into(),
            student_id: student_id.into(),
            present: BTreeSet::new(),
        }
    }

    pub fn is_present(&self, date: NaiveDate) -> bool {
        self.present.contains(&date)
    }

    /// Flips the mark for `date` and returns the new presence.
    pub fn toggle(&mut self, date: NaiveDate, today: NaiveDate) -> Result<bool, AttendanceError> {
        if date > today {
            return Err(AttendanceError::FutureDate(date));
        }

        if self.present.remove(&date) {
            Ok(false)
        } else {
            self.present.insert(date);
            Ok(true)
        }
    }

    /// Every day of the month, in order.
    pub fn month(
        &self,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> Result<Vec<DayCell>, AttendanceError> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or(AttendanceError::InvalidMonth { year, month })?;

        Ok(first
            .iter_days()
            .take_while(|day| day.month() == month)
            .map(|date| DayCell {
                date,
                present: self.is_present(date),
                future: date > today,
            })
            .collect())
    }

    /// Share of elapsed days in `from..=to` marked present. Days after
    /// `today` are not counted; an empty range yields 0.
    pub fn rate(&self, from: NaiveDate, to: NaiveDate, today: NaiveDate) -> f64 {
        let end = to.min(today);
        if end < from {
            return 0.0;
        }

        let elapsed = (end - from).num_days() + 1;
        let marked = self.present.range(from..=end).count();
        marked as f64 / elapsed as f64
    }
}
