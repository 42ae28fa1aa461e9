//! Hard caps on user-supplied input.

/// Widest rental range the day-by-day validator will walk.
pub const MAX_RANGE_DAYS: i64 = 366;

/// Most line items accepted in one cart submission.
pub const MAX_CART_ITEMS: usize = 32;

/// Longest customer note stored on an order.
pub const MAX_NOTE_LEN: usize = 2_000;
