//! Next-occurrence arithmetic for recurring tasks.
//!
//! # Invariants
//! - Pure: no I/O, no clock access.
//! - Time of day is preserved across every frequency.
//! - Month-based steps clamp to the last day of a shorter target month
//!   (chrono calendar semantics), e.g. Jan 31 + 1 month = Feb 28/29.

use crate::model::task::Recurrence;
use chrono::{Days, Months, NaiveDateTime};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    /// `Recurrence::None` has no next occurrence.
    NotRecurring,
    /// Result falls outside the representable calendar range.
    OutOfRange {
        from: NaiveDateTime,
        frequency: Recurrence,
    },
}

impl Display for RecurrenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotRecurring => write!(f, "non-recurring task has no next due date"),
            Self::OutOfRange { from, frequency } => write!(
                f,
                "next {} occurrence after {from} is out of calendar range",
                frequency.label()
            ),
        }
    }
}

impl Error for RecurrenceError {}

/// Computes the due date of the occurrence following `current`.
pub fn next_due_date(
    current: NaiveDateTime,
    frequency: Recurrence,
) -> Result<NaiveDateTime, RecurrenceError> {
    let next = match frequency {
        Recurrence::None => return Err(RecurrenceError::NotRecurring),
        Recurrence::Daily => current.checked_add_days(Days::new(1)),
        Recurrence::Weekly => current.checked_add_days(Days::new(7)),
        Recurrence::Monthly => current.checked_add_months(Months::new(1)),
        Recurrence::Quarterly => current.checked_add_months(Months::new(3)),
        Recurrence::HalfYearly => current.checked_add_months(Months::new(6)),
        Recurrence::Yearly => current.checked_add_months(Months::new(12)),
    };

    next.ok_or(RecurrenceError::OutOfRange {
        from: current,
        frequency,
    })
}

#[cfg(test)]
mod tests {
    use super::{next_due_date, RecurrenceError};
    use crate::model::task::Recurrence;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(8, 15, 0)
            .unwrap()
    }

    #[test]
    fn day_based_steps() {
        assert_eq!(next_due_date(at(2024, 2, 28), Recurrence::Daily), Ok(at(2024, 2, 29)));
        assert_eq!(next_due_date(at(2024, 12, 28), Recurrence::Weekly), Ok(at(2025, 1, 4)));
    }

    #[test]
    fn month_based_steps_keep_day_of_month() {
        assert_eq!(next_due_date(at(2024, 1, 15), Recurrence::Monthly), Ok(at(2024, 2, 15)));
        assert_eq!(next_due_date(at(2024, 11, 15), Recurrence::Quarterly), Ok(at(2025, 2, 15)));
        assert_eq!(next_due_date(at(2024, 9, 30), Recurrence::HalfYearly), Ok(at(2025, 3, 30)));
        assert_eq!(next_due_date(at(2024, 5, 1), Recurrence::Yearly), Ok(at(2025, 5, 1)));
    }

    #[test]
    fn month_end_clamps_to_last_valid_day() {
        // JS `Date#setMonth` overflows instead: Jan 31 + 1 month is Mar 2.
        assert_eq!(next_due_date(at(2024, 1, 31), Recurrence::Monthly), Ok(at(2024, 2, 29)));
        assert_eq!(next_due_date(at(2023, 1, 31), Recurrence::Monthly), Ok(at(2023, 2, 28)));
        assert_eq!(next_due_date(at(2024, 3, 31), Recurrence::HalfYearly), Ok(at(2024, 9, 30)));
        assert_eq!(next_due_date(at(2024, 2, 29), Recurrence::Yearly), Ok(at(2025, 2, 28)));
    }

    #[test]
    fn none_is_rejected() {
        assert_eq!(
            next_due_date(at(2024, 1, 1), Recurrence::None),
            Err(RecurrenceError::NotRecurring)
        );
    }

    #[test]
    fn overflow_is_reported() {
        let err = next_due_date(NaiveDateTime::MAX, Recurrence::Daily).unwrap_err();
        assert!(matches!(err, RecurrenceError::OutOfRange { .. }));
    }
}
