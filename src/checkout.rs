use chrono::{Datelike, NaiveDate};
use tracing::{info, warn};

use crate::availability::{AvailabilityError, AvailabilityIndex, rental_range, today_utc};
use crate::limits::{MAX_CART_ITEMS, MAX_NOTE_LEN};
use crate::model::{Dress, ItemKind, OrderDraft, OrderItem};
use crate::observability;
use crate::revenue;
use crate::service::AvailabilityService;
use crate::store::{ContentStore, StoreError};

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutError {
    EmptyCart,
    InvalidField(&'static str),
    LimitExceeded(&'static str),
    NotForSale(String),
    /// Rental cart item missing its date range.
    MissingDates(String),
    InvalidRange { start: NaiveDate, end: NaiveDate },
    /// First unavailable day inside a proposed rental window, surfaced
    /// verbatim to the user.
    Unavailable { dress_id: String, day: NaiveDate },
    TryOnNotBeforeRental { try_on: NaiveDate, rental_start: NaiveDate },
    /// Confirmed bookings could not be re-fetched at submission time.
    /// Submission is fail-closed: an empty or stale index risks a
    /// double-booking, so the order is refused instead.
    AvailabilityUnknown(StoreError),
    Store(StoreError),
}

impl std::fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckoutError::EmptyCart => write!(f, "cart is empty"),
            CheckoutError::InvalidField(field) => write!(f, "invalid field: {field}"),
            CheckoutError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            CheckoutError::NotForSale(id) => {
                write!(f, "dress {id} is not available for purchase")
            }
            CheckoutError::MissingDates(id) => {
                write!(f, "rental of dress {id} is missing its dates")
            }
            CheckoutError::InvalidRange { start, end } => {
                write!(f, "end date {end} must be after start date {start}")
            }
            CheckoutError::Unavailable { dress_id, day } => {
                write!(f, "dress {dress_id} is unavailable on {day}, choose different dates")
            }
            CheckoutError::TryOnNotBeforeRental { try_on, rental_start } => {
                write!(
                    f,
                    "try-on date {try_on} must be before the rental period starts ({rental_start})"
                )
            }
            CheckoutError::AvailabilityUnknown(e) => {
                write!(f, "availability could not be confirmed: {e}")
            }
            CheckoutError::Store(e) => write!(f, "order could not be saved: {e}"),
        }
    }
}

impl std::error::Error for CheckoutError {}

impl CheckoutError {
    /// Short label for the rejection metrics.
    fn reason(&self) -> &'static str {
        match self {
            CheckoutError::EmptyCart => "empty_cart",
            CheckoutError::InvalidField(_) => "invalid_field",
            CheckoutError::LimitExceeded(_) => "limit_exceeded",
            CheckoutError::NotForSale(_) => "not_for_sale",
            CheckoutError::MissingDates(_) => "missing_dates",
            CheckoutError::InvalidRange { .. } => "invalid_range",
            CheckoutError::Unavailable { .. } => "unavailable",
            CheckoutError::TryOnNotBeforeRental { .. } => "try_on_too_late",
            CheckoutError::AvailabilityUnknown(_) => "availability_unknown",
            CheckoutError::Store(_) => "store",
        }
    }
}

// ── Cart ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub dress_id: String,
    pub kind: ItemKind,
    pub color: String,
    pub size: Option<String>,
    /// Day count for rentals, unit count for purchases.
    pub quantity: u32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub price_per_day: Option<f64>,
    pub buy_price: Option<f64>,
}

impl CartItem {
    /// Rental line: quantity is the number of charged days, the
    /// difference between start and end (a Friday-to-Sunday rental is
    /// two days).
    pub fn rental(
        dress: &Dress,
        color: &str,
        size: Option<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Self, CheckoutError> {
        let range = rental_range(start, end)
            .map_err(|_| CheckoutError::InvalidRange { start, end })?;
        Ok(Self {
            dress_id: dress.id.clone(),
            kind: ItemKind::Rental,
            color: color.to_string(),
            size,
            quantity: (range.num_days() - 1) as u32,
            start_date: Some(start),
            end_date: Some(end),
            price_per_day: dress.effective_price_per_day(),
            buy_price: None,
        })
    }

    pub fn purchase(
        dress: &Dress,
        color: &str,
        size: Option<String>,
    ) -> Result<Self, CheckoutError> {
        let buy_price = dress
            .effective_buy_price()
            .ok_or_else(|| CheckoutError::NotForSale(dress.id.clone()))?;
        Ok(Self {
            dress_id: dress.id.clone(),
            kind: ItemKind::Purchase,
            color: color.to_string(),
            size,
            quantity: 1,
            start_date: None,
            end_date: None,
            price_per_day: None,
            buy_price: Some(buy_price),
        })
    }

    pub fn is_rental(&self) -> bool {
        self.kind == ItemKind::Rental
    }

    fn line_total(&self) -> f64 {
        match self.kind {
            ItemKind::Rental => self.price_per_day.unwrap_or(0.0) * self.quantity as f64,
            ItemKind::Purchase => self.buy_price.unwrap_or(0.0) * self.quantity as f64,
            ItemKind::Other => 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: CartItem) -> Result<(), CheckoutError> {
        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CheckoutError::LimitExceeded("too many cart items"));
        }
        self.items.push(item);
        Ok(())
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(CartItem::line_total).sum()
    }
}

// ── Customer details ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerDetails {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub postal_code: String,
    pub state: String,
    pub note: Option<String>,
}

impl CustomerDetails {
    fn validate(&self) -> Result<(), CheckoutError> {
        if self.full_name.trim().len() < 2 {
            return Err(CheckoutError::InvalidField("full_name"));
        }
        if self.phone.trim().len() < 8 {
            return Err(CheckoutError::InvalidField("phone"));
        }
        if self.address.trim().len() < 5 {
            return Err(CheckoutError::InvalidField("address"));
        }
        if self.postal_code.trim().len() < 4 {
            return Err(CheckoutError::InvalidField("postal_code"));
        }
        if self.state.trim().len() < 2 {
            return Err(CheckoutError::InvalidField("state"));
        }
        if self.note.as_ref().is_some_and(|n| n.len() > MAX_NOTE_LEN) {
            return Err(CheckoutError::LimitExceeded("note too long"));
        }
        Ok(())
    }

    fn full_address(&self) -> String {
        format!("{}, {}, {}", self.address, self.postal_code, self.state)
    }
}

// ── Validation ───────────────────────────────────────────────────

/// Validate a cart against an availability index and the try-on rule.
/// Pure; the caller decides how fresh the index is.
pub fn validate_cart(
    index: &AvailabilityIndex,
    cart: &Cart,
    try_on_date: NaiveDate,
) -> Result<(), CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let mut earliest_rental_start: Option<NaiveDate> = None;

    for item in cart.items() {
        if !item.is_rental() {
            continue;
        }
        let (Some(start), Some(end)) = (item.start_date, item.end_date) else {
            return Err(CheckoutError::MissingDates(item.dress_id.clone()));
        };
        let range = rental_range(start, end)
            .map_err(|_| CheckoutError::InvalidRange { start, end })?;
        index
            .validate_range(&item.dress_id, range)
            .map_err(|e| match e {
                AvailabilityError::Unavailable(day) => CheckoutError::Unavailable {
                    dress_id: item.dress_id.clone(),
                    day,
                },
                AvailabilityError::LimitExceeded(msg) => CheckoutError::LimitExceeded(msg),
                AvailabilityError::InvalidRange { start, end } => {
                    CheckoutError::InvalidRange { start, end }
                }
                AvailabilityError::InvalidDate(_) => {
                    CheckoutError::InvalidField("rental dates")
                }
            })?;
        earliest_rental_start = Some(match earliest_rental_start {
            Some(current) => current.min(start),
            None => start,
        });
    }

    // Try-on must happen strictly before the first rental begins
    if let Some(rental_start) = earliest_rental_start
        && try_on_date >= rental_start
    {
        return Err(CheckoutError::TryOnNotBeforeRental {
            try_on: try_on_date,
            rental_start,
        });
    }

    Ok(())
}

/// Assemble the order document from the cart, resolving dress names from
/// the catalog.
pub fn build_order(
    cart: &Cart,
    details: &CustomerDetails,
    try_on_date: NaiveDate,
    dresses: &[Dress],
) -> OrderDraft {
    let items = cart
        .items()
        .iter()
        .map(|item| {
            let dress_name = dresses
                .iter()
                .find(|d| d.id == item.dress_id)
                .map(|d| d.name.clone())
                .unwrap_or_else(|| item.dress_id.clone());
            OrderItem {
                key: uuid::Uuid::new_v4().to_string(),
                dress_id: item.dress_id.clone(),
                dress_name,
                color: item.color.clone(),
                size: item.size.clone(),
                quantity: item.quantity,
                start_date: item.start_date.map(|d| d.to_string()),
                end_date: item.end_date.map(|d| d.to_string()),
                price_per_day: item.price_per_day,
                buy_price: item.buy_price,
                kind: item.kind,
            }
        })
        .collect();

    OrderDraft {
        full_name: details.full_name.clone(),
        phone: details.phone.clone(),
        address: details.full_address(),
        note: details.note.clone(),
        try_on_date: try_on_date.to_string(),
        items,
        total: cart.total(),
        status: "pending".to_string(),
    }
}

// ── Submission ───────────────────────────────────────────────────

pub struct CheckoutService<S> {
    availability: AvailabilityService<S>,
}

impl<S: ContentStore> CheckoutService<S> {
    pub fn new(availability: AvailabilityService<S>) -> Self {
        Self { availability }
    }

    /// Submit the cart as a new pending order.
    ///
    /// Unlike browsing, submission is fail-closed: confirmed bookings are
    /// re-fetched and every rental window re-validated against that fresh
    /// index immediately before the order document is created. A stale
    /// browsing session can therefore never slip a double-booking
    /// through; two racing submissions still can, since the store offers
    /// no transactional arbitration.
    pub async fn submit(
        &self,
        cart: &Cart,
        details: &CustomerDetails,
        try_on_date: NaiveDate,
    ) -> Result<String, CheckoutError> {
        let result = self.submit_inner(cart, details, try_on_date).await;
        match &result {
            Ok(order_id) => {
                info!(%order_id, total = cart.total(), "order submitted");
                metrics::counter!(observability::ORDERS_SUBMITTED_TOTAL).increment(1);
            }
            Err(e) => {
                warn!("order rejected: {e}");
                metrics::counter!(
                    observability::ORDERS_REJECTED_TOTAL,
                    "reason" => e.reason()
                )
                .increment(1);
            }
        }
        result
    }

    async fn submit_inner(
        &self,
        cart: &Cart,
        details: &CustomerDetails,
        try_on_date: NaiveDate,
    ) -> Result<String, CheckoutError> {
        details.validate()?;

        let index = self
            .availability
            .fresh_index()
            .await
            .map_err(CheckoutError::AvailabilityUnknown)?;
        validate_cart(&index, cart, try_on_date)?;

        let store = self.availability.store();
        let dresses = store.fetch_dresses().await.map_err(CheckoutError::Store)?;
        let draft = build_order(cart, details, try_on_date, &dresses);
        let order_id = store
            .create_order(&draft)
            .await
            .map_err(CheckoutError::Store)?;

        // Bookkeeping only. The order is already saved, so a failure
        // here is logged, not surfaced.
        if let Err(e) = self.refresh_monthly_revenue().await {
            warn!("monthly revenue refresh failed: {e}");
        }

        Ok(order_id)
    }

    /// Recompute the current month's revenue record from completed
    /// bookings and upsert it.
    async fn refresh_monthly_revenue(&self) -> Result<(), StoreError> {
        let today = today_utc();
        let store = self.availability.store();
        let completed = store
            .fetch_completed_bookings_in_month(today.year(), today.month())
            .await?;
        let summary = revenue::tally(&completed);
        store
            .upsert_monthly_revenue(&revenue::month_key(today), &summary)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::{Booking, BookingItem};
    use crate::store::InMemoryStore;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn dress(id: &str) -> Dress {
        Dress {
            id: id.into(),
            name: format!("Robe {id}"),
            price_per_day: Some(100.0),
            is_for_sale: true,
            buy_price: Some(1_000.0),
            ..Default::default()
        }
    }

    fn details() -> CustomerDetails {
        CustomerDetails {
            full_name: "Amina Ben Salah".into(),
            phone: "+216 22334455".into(),
            address: "5 avenue Habib Bourguiba".into(),
            postal_code: "1001".into(),
            state: "Tunis".into(),
            note: None,
        }
    }

    fn rental_cart(dress_id: &str, start: &str, end: &str) -> Cart {
        let mut cart = Cart::new();
        cart.add(CartItem::rental(&dress(dress_id), "ivoire", None, d(start), d(end)).unwrap())
            .unwrap();
        cart
    }

    fn store_with_booking(dress_id: &str, start: &str, end: &str) -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        store.seed_dresses(vec![dress(dress_id)]);
        store.seed_confirmed_bookings(vec![Booking {
            items: vec![BookingItem {
                dress_id: Some(dress_id.into()),
                start_date: Some(start.into()),
                end_date: Some(end.into()),
                kind: Some(ItemKind::Rental),
                ..Default::default()
            }],
            ..Default::default()
        }]);
        store
    }

    fn checkout(store: Arc<InMemoryStore>) -> CheckoutService<InMemoryStore> {
        CheckoutService::new(AvailabilityService::new(store))
    }

    // ── cart ─────────────────────────────────────────────

    #[test]
    fn rental_item_counts_charged_days() {
        let item =
            CartItem::rental(&dress("D1"), "ivoire", None, d("2024-06-10"), d("2024-06-13"))
                .unwrap();
        assert_eq!(item.quantity, 3);
        assert_eq!(item.line_total(), 300.0);
    }

    #[test]
    fn rental_item_rejects_reversed_dates() {
        let err =
            CartItem::rental(&dress("D1"), "ivoire", None, d("2024-06-13"), d("2024-06-13"))
                .unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidRange { .. }));
    }

    #[test]
    fn purchase_item_requires_sale_listing() {
        let mut not_for_sale = dress("D1");
        not_for_sale.is_for_sale = false;
        let err = CartItem::purchase(&not_for_sale, "ivoire", None).unwrap_err();
        assert_eq!(err, CheckoutError::NotForSale("D1".into()));
    }

    #[test]
    fn cart_total_mixes_rentals_and_purchases() {
        let mut cart = Cart::new();
        cart.add(
            CartItem::rental(&dress("D1"), "ivoire", None, d("2024-06-10"), d("2024-06-12"))
                .unwrap(),
        )
        .unwrap();
        cart.add(CartItem::purchase(&dress("D2"), "blanc", Some("40".into())).unwrap())
            .unwrap();
        assert_eq!(cart.total(), 200.0 + 1_000.0);
    }

    #[test]
    fn cart_enforces_item_limit() {
        let mut cart = Cart::new();
        let item = CartItem::purchase(&dress("D1"), "ivoire", None).unwrap();
        for _ in 0..MAX_CART_ITEMS {
            cart.add(item.clone()).unwrap();
        }
        let err = cart.add(item).unwrap_err();
        assert_eq!(err, CheckoutError::LimitExceeded("too many cart items"));
    }

    // ── validate_cart ────────────────────────────────────

    #[test]
    fn validate_cart_rejects_empty() {
        let index = AvailabilityIndex::default();
        let err = validate_cart(&index, &Cart::new(), d("2024-06-01")).unwrap_err();
        assert_eq!(err, CheckoutError::EmptyCart);
    }

    #[test]
    fn validate_cart_flags_first_conflicting_day_with_dress() {
        let index = AvailabilityIndex::build(&[Booking {
            items: vec![BookingItem {
                dress_id: Some("D1".into()),
                start_date: Some("2024-06-10".into()),
                end_date: Some("2024-06-12".into()),
                kind: Some(ItemKind::Rental),
                ..Default::default()
            }],
            ..Default::default()
        }]);
        let cart = rental_cart("D1", "2024-06-11", "2024-06-15");
        let err = validate_cart(&index, &cart, d("2024-06-01")).unwrap_err();
        assert_eq!(
            err,
            CheckoutError::Unavailable {
                dress_id: "D1".into(),
                day: d("2024-06-11"),
            }
        );
    }

    #[test]
    fn validate_cart_checks_try_on_rule() {
        let index = AvailabilityIndex::default();
        let cart = rental_cart("D1", "2024-06-10", "2024-06-12");

        // Try-on on the rental start day is too late
        let err = validate_cart(&index, &cart, d("2024-06-10")).unwrap_err();
        assert_eq!(
            err,
            CheckoutError::TryOnNotBeforeRental {
                try_on: d("2024-06-10"),
                rental_start: d("2024-06-10"),
            }
        );

        assert!(validate_cart(&index, &cart, d("2024-06-09")).is_ok());
    }

    #[test]
    fn validate_cart_ignores_try_on_rule_for_purchase_only() {
        let index = AvailabilityIndex::default();
        let mut cart = Cart::new();
        cart.add(CartItem::purchase(&dress("D1"), "ivoire", None).unwrap())
            .unwrap();
        // Any try-on date is fine with no rentals in the cart
        assert!(validate_cart(&index, &cart, d("2030-01-01")).is_ok());
    }

    // ── submission ───────────────────────────────────────

    #[tokio::test]
    async fn submit_creates_pending_order() {
        let store = store_with_booking("D1", "2024-06-10", "2024-06-12");
        let service = checkout(store.clone());
        let cart = rental_cart("D1", "2024-06-13", "2024-06-16");

        let order_id = service
            .submit(&cart, &details(), d("2024-06-01"))
            .await
            .unwrap();
        assert!(!order_id.is_empty());

        let orders = store.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status, "pending");
        assert_eq!(orders[0].items.len(), 1);
        assert_eq!(orders[0].items[0].dress_name, "Robe D1");
        assert_eq!(orders[0].address, "5 avenue Habib Bourguiba, 1001, Tunis");
        assert_eq!(orders[0].total, 300.0);
    }

    #[tokio::test]
    async fn submit_rejects_conflicting_rental() {
        let store = store_with_booking("D1", "2024-06-10", "2024-06-12");
        let service = checkout(store.clone());
        let cart = rental_cart("D1", "2024-06-11", "2024-06-15");

        let err = service
            .submit(&cart, &details(), d("2024-06-01"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CheckoutError::Unavailable {
                dress_id: "D1".into(),
                day: d("2024-06-11"),
            }
        );
        assert!(store.orders().is_empty());
    }

    #[tokio::test]
    async fn submit_is_fail_closed_when_store_unreachable() {
        let store = store_with_booking("D1", "2024-06-10", "2024-06-12");
        let service = checkout(store.clone());
        let cart = rental_cart("D1", "2024-06-13", "2024-06-16");

        store.set_offline(true);
        let err = service
            .submit(&cart, &details(), d("2024-06-01"))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::AvailabilityUnknown(_)));
        assert!(store.orders().is_empty());
    }

    #[tokio::test]
    async fn submit_refreshes_monthly_revenue() {
        let store = store_with_booking("D1", "2024-06-10", "2024-06-12");
        store.seed_completed_bookings(vec![Booking {
            items: vec![BookingItem {
                dress_id: Some("D1".into()),
                kind: Some(ItemKind::Rental),
                quantity: Some(3),
                price_per_day: Some(100.0),
                ..Default::default()
            }],
            ..Default::default()
        }]);
        let service = checkout(store.clone());
        let cart = rental_cart("D1", "2024-06-13", "2024-06-16");

        service
            .submit(&cart, &details(), d("2024-06-01"))
            .await
            .unwrap();

        let key = revenue::month_key(chrono::Utc::now().date_naive());
        let summary = store.revenue_for(&key).unwrap();
        assert_eq!(summary.total_rental, 3);
        assert_eq!(summary.rental_revenue, 300.0);
    }

    #[tokio::test]
    async fn submit_validates_customer_details() {
        let store = store_with_booking("D1", "2024-06-10", "2024-06-12");
        let service = checkout(store);
        let cart = rental_cart("D1", "2024-06-13", "2024-06-16");

        let mut bad = details();
        bad.phone = "123".into();
        let err = service
            .submit(&cart, &bad, d("2024-06-01"))
            .await
            .unwrap_err();
        assert_eq!(err, CheckoutError::InvalidField("phone"));
    }
}
