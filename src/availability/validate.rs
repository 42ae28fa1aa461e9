use chrono::NaiveDate;

use crate::limits::MAX_RANGE_DAYS;
use crate::model::DayRange;

use super::{AvailabilityError, AvailabilityIndex};

/// Build a proposed rental range, enforcing the strict start-before-end
/// precondition. The validator itself never re-derives ordering.
pub fn rental_range(start: NaiveDate, end: NaiveDate) -> Result<DayRange, AvailabilityError> {
    if start >= end {
        return Err(AvailabilityError::InvalidRange { start, end });
    }
    Ok(DayRange::new(start, end))
}

impl AvailabilityIndex {
    /// Check a proposed rental range day by day, start through end
    /// inclusive. Returns the earliest booked day as
    /// `AvailabilityError::Unavailable`.
    ///
    /// Unavailable ranges are discrete, possibly non-contiguous blocks, so
    /// a single boundary overlap test would miss availability gaps that do
    /// not align with the proposal; walking every day is O(days in range),
    /// acceptable because rental windows are days, not years. The
    /// past-date guard does not apply here, and the caller enforces
    /// `start < end` strict before building the range.
    pub fn validate_range(
        &self,
        dress_id: &str,
        range: DayRange,
    ) -> Result<(), AvailabilityError> {
        if range.num_days() > MAX_RANGE_DAYS {
            return Err(AvailabilityError::LimitExceeded("rental range too wide"));
        }
        for day in range.days() {
            if self.is_booked(dress_id, day) {
                return Err(AvailabilityError::Unavailable(day));
            }
        }
        Ok(())
    }
}
