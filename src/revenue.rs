//! Monthly revenue bookkeeping, recomputed from completed bookings after
//! each checkout rather than incremented in place.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::model::Booking;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonthlyRevenue {
    pub total_sales: u32,
    pub sales_revenue: f64,
    pub total_rental: u32,
    pub rental_revenue: f64,
}

/// Month key used by the revenue documents, e.g. `2025-06`.
pub fn month_key(day: NaiveDate) -> String {
    format!("{:04}-{:02}", day.year(), day.month())
}

/// Tally sales and rental revenue over a month's completed bookings.
/// Rental quantity is the day count, so rental revenue is per-day price
/// times days.
pub fn tally(bookings: &[Booking]) -> MonthlyRevenue {
    let mut summary = MonthlyRevenue::default();
    for booking in bookings {
        for item in &booking.items {
            let quantity = item.quantity.unwrap_or(0);
            if item.is_purchase() {
                summary.total_sales += quantity;
                summary.sales_revenue += item.buy_price.unwrap_or(0.0) * quantity as f64;
            } else if item.is_rental() {
                summary.total_rental += quantity;
                summary.rental_revenue += item.price_per_day.unwrap_or(0.0) * quantity as f64;
            }
        }
    }
    summary
}
