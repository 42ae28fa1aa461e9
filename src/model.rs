use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive day interval `[start, end]`.
///
/// Bookings block whole calendar days, so unlike a time-of-day span this
/// range is closed on both ends: a rental ending on the 12th still blocks
/// the 12th.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DayRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        debug_assert!(start <= end, "DayRange start must not be after end");
        Self { start, end }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Number of days covered, counting both endpoints.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Iterate every day from `start` through `end` inclusive.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// Transaction type on a booking line item. Only rentals block dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Rental,
    Purchase,
    /// Unknown tag from the store; decoded, then ignored.
    #[serde(other)]
    Other,
}

/// One line of a booking document. Every availability-relevant field is
/// optional: partial documents decode and get skipped, never rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingItem {
    pub dress_id: Option<String>,
    pub dress_name: Option<String>,
    /// ISO date string as stored; normalized at index-build time.
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<ItemKind>,
    pub quantity: Option<u32>,
    pub price_per_day: Option<f64>,
    pub buy_price: Option<f64>,
    pub color: Option<String>,
    pub size: Option<String>,
}

impl BookingItem {
    pub fn is_rental(&self) -> bool {
        self.kind == Some(ItemKind::Rental)
    }

    pub fn is_purchase(&self) -> bool {
        self.kind == Some(ItemKind::Purchase)
    }
}

/// A booking document as returned by the store. The status filter
/// ("confirmed", "completed") is applied by the store query, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub items: Vec<BookingItem>,
    pub status: Option<String>,
    pub try_on_date: Option<String>,
}

// ── Catalog documents ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DressImage {
    #[serde(rename = "_key")]
    pub key: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DressColor {
    #[serde(rename = "_key")]
    pub key: Option<String>,
    pub name: String,
    pub images: Vec<DressImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Dress {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub new_collection: bool,
    pub price_per_day: Option<f64>,
    pub is_rent_on_discount: bool,
    pub new_price_per_day: Option<f64>,
    pub is_for_sale: bool,
    pub buy_price: Option<f64>,
    pub is_sell_on_discount: bool,
    pub new_buy_price: Option<f64>,
    pub colors: Vec<DressColor>,
    pub sizes: Vec<String>,
    pub categories: Vec<CategoryRef>,
}

impl Dress {
    /// Daily rental price, discounted when a promo is active.
    pub fn effective_price_per_day(&self) -> Option<f64> {
        if self.is_rent_on_discount && self.new_price_per_day.is_some() {
            self.new_price_per_day
        } else {
            self.price_per_day
        }
    }

    /// Purchase price, discounted when a promo is active. None if the
    /// dress is not for sale.
    pub fn effective_buy_price(&self) -> Option<f64> {
        if !self.is_for_sale {
            return None;
        }
        if self.is_sell_on_discount && self.new_buy_price.is_some() {
            self.new_buy_price
        } else {
            self.buy_price
        }
    }

    /// Listing pages only show dresses with at least one renderable image.
    pub fn has_display_image(&self) -> bool {
        self.colors
            .first()
            .and_then(|c| c.images.first())
            .is_some_and(|img| img.url.as_deref().is_some_and(|u| !u.is_empty()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

// ── Order documents (written at checkout) ────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(rename = "_key")]
    pub key: String,
    pub dress_id: String,
    pub dress_name: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_day: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buy_price: Option<f64>,
    #[serde(rename = "type")]
    pub kind: ItemKind,
}

/// New booking document, created with status "pending". The store assigns
/// the document id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub try_on_date: String,
    pub items: Vec<OrderItem>,
    pub total: f64,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn day_range_basics() {
        let r = DayRange::new(d("2024-06-10"), d("2024-06-12"));
        assert_eq!(r.num_days(), 3);
        assert!(r.contains(d("2024-06-10")));
        assert!(r.contains(d("2024-06-12"))); // inclusive
        assert!(!r.contains(d("2024-06-13")));
        assert!(!r.contains(d("2024-06-09")));
    }

    #[test]
    fn day_range_single_day() {
        let r = DayRange::new(d("2024-06-10"), d("2024-06-10"));
        assert_eq!(r.num_days(), 1);
        assert_eq!(r.days().collect::<Vec<_>>(), vec![d("2024-06-10")]);
    }

    #[test]
    fn day_range_days_iterates_inclusive() {
        let r = DayRange::new(d("2024-06-10"), d("2024-06-12"));
        let days: Vec<_> = r.days().collect();
        assert_eq!(days, vec![d("2024-06-10"), d("2024-06-11"), d("2024-06-12")]);
    }

    #[test]
    fn item_kind_decodes_store_tags() {
        let rental: ItemKind = serde_json::from_str("\"rental\"").unwrap();
        let purchase: ItemKind = serde_json::from_str("\"purchase\"").unwrap();
        let other: ItemKind = serde_json::from_str("\"fitting\"").unwrap();
        assert_eq!(rental, ItemKind::Rental);
        assert_eq!(purchase, ItemKind::Purchase);
        assert_eq!(other, ItemKind::Other);
    }

    #[test]
    fn booking_decodes_partial_document() {
        let json = r#"{
            "_id": "b1",
            "status": "confirmed",
            "items": [
                { "dressId": "D1", "startDate": "2024-06-10", "endDate": "2024-06-12", "type": "rental" },
                { "dressId": "D2", "type": "purchase", "quantity": 1, "buyPrice": 900 },
                { "type": "rental" }
            ]
        }"#;
        let booking: Booking = serde_json::from_str(json).unwrap();
        assert_eq!(booking.items.len(), 3);
        assert!(booking.items[0].is_rental());
        assert!(booking.items[1].is_purchase());
        assert!(booking.items[2].dress_id.is_none());
    }

    #[test]
    fn dress_effective_prices() {
        let dress = Dress {
            id: "D1".into(),
            price_per_day: Some(120.0),
            is_rent_on_discount: true,
            new_price_per_day: Some(90.0),
            is_for_sale: true,
            buy_price: Some(900.0),
            is_sell_on_discount: false,
            new_buy_price: Some(700.0),
            ..Default::default()
        };
        assert_eq!(dress.effective_price_per_day(), Some(90.0));
        assert_eq!(dress.effective_buy_price(), Some(900.0));
    }

    #[test]
    fn dress_not_for_sale_has_no_buy_price() {
        let dress = Dress {
            id: "D1".into(),
            buy_price: Some(900.0),
            is_for_sale: false,
            ..Default::default()
        };
        assert_eq!(dress.effective_buy_price(), None);
    }

    #[test]
    fn order_draft_serializes_store_field_names() {
        let draft = OrderDraft {
            full_name: "Amina".into(),
            phone: "+216 22334455".into(),
            address: "5 rue X, 1234, Tunis".into(),
            note: None,
            try_on_date: "2024-06-01".into(),
            items: vec![],
            total: 0.0,
            status: "pending".into(),
        };
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["fullName"], "Amina");
        assert_eq!(json["tryOnDate"], "2024-06-01");
        assert!(json.get("note").is_none());
    }
}
