use chrono::NaiveDate;

use super::AvailabilityIndex;

pub(crate) fn today_utc() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

impl AvailabilityIndex {
    /// True if `day` falls inside any unavailable range for the dress,
    /// bounds inclusive. A dress absent from the index is never booked.
    /// O(ranges for this dress); first match short-circuits.
    pub fn is_booked(&self, dress_id: &str, day: NaiveDate) -> bool {
        self.ranges_for(dress_id).iter().any(|r| r.contains(day))
    }

    /// Detail-page day picker check: any day strictly before `today` is
    /// never selectable, regardless of index contents. The past-date
    /// guard fires before the index lookup.
    pub fn is_day_selectable(&self, dress_id: &str, day: NaiveDate, today: NaiveDate) -> bool {
        if day < today {
            return false;
        }
        !self.is_booked(dress_id, day)
    }
}
