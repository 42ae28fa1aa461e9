//! Booking and availability engine for a bridal-wear rental storefront.
//!
//! Confirmed bookings live in a hosted content store; this crate fetches
//! them, collapses every stored date to its UTC calendar day, and builds
//! a per-dress index of unavailable ranges. Sessions answer day-picker
//! and range-validation queries from that one snapshot. Browsing is
//! fail-open (a fetch failure degrades to an empty index), submission is
//! fail-closed (every rental window is re-validated against a fresh
//! index before the order document is written).

pub mod availability;
pub mod catalog;
pub mod checkout;
pub mod limits;
pub mod model;
pub mod observability;
pub mod revenue;
pub mod service;
pub mod store;

pub use availability::{AvailabilityError, AvailabilityIndex, normalize_date};
pub use checkout::{Cart, CartItem, CheckoutError, CheckoutService, CustomerDetails};
pub use service::{AvailabilityService, Freshness, Session};
pub use store::{ContentStore, HttpContentStore, InMemoryStore, StoreError};
