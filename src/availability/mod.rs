mod error;
mod query;
mod validate;

pub use error::AvailabilityError;
pub use validate::rental_range;
pub(crate) use query::today_utc;

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::warn;

use crate::model::{Booking, DayRange};

// ── Date normalization ────────────────────────────────────────────

/// Collapse any stored date representation to its UTC calendar day.
///
/// Accepts a plain `YYYY-MM-DD`, an RFC 3339 timestamp with any offset,
/// or an offset-less `YYYY-MM-DDTHH:MM:SS[.fff]`. Two timestamps on the
/// same logical day normalize equal; without this, a booking ending at
/// `2024-05-10T23:59:59Z` would fail to contain `2024-05-10T00:00:00Z`.
pub fn normalize_date(input: &str) -> Result<NaiveDate, AvailabilityError> {
    if let Ok(day) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(day);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.to_utc().date_naive());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(ts.date());
    }
    Err(AvailabilityError::InvalidDate(input.to_string()))
}

// ── Availability index ────────────────────────────────────────────

/// Per-dress unavailable date ranges, built wholesale from one fetch of
/// confirmed bookings.
///
/// Ranges are kept in insertion order and may overlap each other; queries
/// only test membership, so no merging or deduplication happens. A dress
/// absent from the map is fully available. Immutable after build, owned
/// by a single session.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityIndex {
    unavailable: HashMap<String, Vec<DayRange>>,
}

impl AvailabilityIndex {
    /// Build the index from the full set of confirmed bookings.
    ///
    /// Only rental items with a dress id and both dates qualify. Malformed
    /// items (missing fields, unparseable dates, reversed ranges) are
    /// skipped with a warning, never fatal: availability data is advisory
    /// UI filtering, not a booking-integrity guarantee.
    pub fn build(bookings: &[Booking]) -> Self {
        let mut unavailable: HashMap<String, Vec<DayRange>> = HashMap::new();

        for booking in bookings {
            for item in &booking.items {
                if !item.is_rental() {
                    continue;
                }
                let (Some(dress_id), Some(raw_start), Some(raw_end)) =
                    (&item.dress_id, &item.start_date, &item.end_date)
                else {
                    continue;
                };
                if dress_id.is_empty() {
                    continue;
                }
                let start = match normalize_date(raw_start) {
                    Ok(day) => day,
                    Err(e) => {
                        warn!(booking = ?booking.id, dress = %dress_id, "skipping item: {e}");
                        continue;
                    }
                };
                let end = match normalize_date(raw_end) {
                    Ok(day) => day,
                    Err(e) => {
                        warn!(booking = ?booking.id, dress = %dress_id, "skipping item: {e}");
                        continue;
                    }
                };
                if start > end {
                    warn!(
                        booking = ?booking.id,
                        dress = %dress_id,
                        "skipping item: reversed range {start}..{end}"
                    );
                    continue;
                }
                unavailable
                    .entry(dress_id.clone())
                    .or_default()
                    .push(DayRange::new(start, end));
            }
        }

        Self { unavailable }
    }

    /// Unavailable ranges for a dress. Empty slice means fully available.
    pub fn ranges_for(&self, dress_id: &str) -> &[DayRange] {
        self.unavailable
            .get(dress_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of dresses with at least one unavailable range.
    pub fn dress_count(&self) -> usize {
        self.unavailable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unavailable.is_empty()
    }
}
