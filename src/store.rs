use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::model::{Booking, Category, Dress, OrderDraft};
use crate::revenue::MonthlyRevenue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Connection(String),
    Status(u16, String),
    Decode(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Connection(e) => write!(f, "store connection error: {e}"),
            StoreError::Status(code, body) => write!(f, "store returned {code}: {body}"),
            StoreError::Decode(e) => write!(f, "store response decode error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Read/write interface to the booking document store.
///
/// The status filters ("confirmed", "completed") live in the store
/// queries; callers receive already-filtered documents.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// All bookings with status "confirmed", the full input to one
    /// availability index build.
    async fn fetch_confirmed_bookings(&self) -> Result<Vec<Booking>, StoreError>;

    async fn fetch_dresses(&self) -> Result<Vec<Dress>, StoreError>;

    async fn fetch_categories(&self) -> Result<Vec<Category>, StoreError>;

    /// Completed bookings whose try-on date falls inside the given month.
    async fn fetch_completed_bookings_in_month(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Vec<Booking>, StoreError>;

    /// Create a new booking document; returns the assigned document id.
    async fn create_order(&self, order: &OrderDraft) -> Result<String, StoreError>;

    async fn upsert_monthly_revenue(
        &self,
        month_key: &str,
        revenue: &MonthlyRevenue,
    ) -> Result<(), StoreError>;
}

// ── HTTP document store ──────────────────────────────────────────

const API_VERSION: &str = "v2022-03-07";

#[derive(Deserialize)]
struct QueryResponse<T> {
    result: Option<T>,
}

#[derive(Deserialize)]
struct MutateResponse {
    results: Vec<MutateResult>,
}

#[derive(Deserialize)]
struct MutateResult {
    id: String,
}

/// Sanity-style document store over HTTP: GROQ queries on the query
/// endpoint, JSON mutations on the mutate endpoint.
pub struct HttpContentStore {
    client: reqwest::Client,
    base_url: String,
    dataset: String,
    token: Option<String>,
}

impl HttpContentStore {
    pub fn new(
        base_url: &str,
        dataset: &str,
        token: Option<String>,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            dataset: dataset.to_string(),
            token,
        })
    }

    async fn query<T: serde::de::DeserializeOwned>(&self, groq: &str) -> Result<T, StoreError> {
        let url = format!(
            "{}/{API_VERSION}/data/query/{}",
            self.base_url, self.dataset
        );
        debug!(%url, groq, "store query");

        let mut request = self.client.get(&url).query(&[("query", groq)]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "store query failed");
            return Err(StoreError::Status(status.as_u16(), body));
        }

        let decoded: QueryResponse<T> = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        decoded
            .result
            .ok_or_else(|| StoreError::Decode("query returned no result".into()))
    }

    async fn mutate(
        &self,
        mutations: serde_json::Value,
    ) -> Result<MutateResponse, StoreError> {
        let url = format!(
            "{}/{API_VERSION}/data/mutate/{}",
            self.base_url, self.dataset
        );
        let mut request = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "mutations": mutations }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "store mutation failed");
            return Err(StoreError::Status(status.as_u16(), body));
        }

        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

/// ISO bounds of a month: first instant through last instant, matching
/// the try-on-date filter the store query expects.
fn month_window(year: i32, month: u32) -> Option<(String, String)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = next_first.pred_opt()?;
    Some((
        format!("{first}T00:00:00.000Z"),
        format!("{last}T23:59:59.999Z"),
    ))
}

#[async_trait]
impl ContentStore for HttpContentStore {
    async fn fetch_confirmed_bookings(&self) -> Result<Vec<Booking>, StoreError> {
        let groq = r#"*[_type == "schedules" && status == "confirmed"]{
            _id, status,
            items[]{ dressId, startDate, endDate, type }
        }"#;
        self.query(groq).await
    }

    async fn fetch_dresses(&self) -> Result<Vec<Dress>, StoreError> {
        let groq = r#"*[_type == "dress"]{
            _id, name, description, newCollection,
            pricePerDay, isRentOnDiscount, newPricePerDay,
            isForSale, buyPrice, isSellOnDiscount, newBuyPrice,
            colors[]{ _key, name, images[]{ _key, "url": asset->url } },
            sizes,
            categories[]->{ _id, name }
        }"#;
        self.query(groq).await
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, StoreError> {
        self.query(r#"*[_type == "category"]{ _id, name }"#).await
    }

    async fn fetch_completed_bookings_in_month(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Vec<Booking>, StoreError> {
        let (start, end) = month_window(year, month)
            .ok_or(StoreError::Decode("invalid month".into()))?;
        let groq = format!(
            "*[_type == \"schedules\" && status == \"completed\" \
             && tryOnDate >= '{start}' && tryOnDate <= '{end}']"
        );
        self.query(&groq).await
    }

    async fn create_order(&self, order: &OrderDraft) -> Result<String, StoreError> {
        let mut doc =
            serde_json::to_value(order).map_err(|e| StoreError::Decode(e.to_string()))?;
        doc["_type"] = serde_json::json!("schedules");

        let response = self
            .mutate(serde_json::json!([{ "create": doc }]))
            .await?;
        response
            .results
            .into_iter()
            .next()
            .map(|r| r.id)
            .ok_or_else(|| StoreError::Decode("mutation returned no document id".into()))
    }

    async fn upsert_monthly_revenue(
        &self,
        month_key: &str,
        revenue: &MonthlyRevenue,
    ) -> Result<(), StoreError> {
        // Deterministic id keeps fetch-or-create a single round trip.
        let doc_id = format!("revenues-{month_key}");
        let set = serde_json::to_value(revenue).map_err(|e| StoreError::Decode(e.to_string()))?;
        self.mutate(serde_json::json!([
            {
                "createIfNotExists": {
                    "_id": doc_id,
                    "_type": "revenues",
                    "month": month_key,
                    "totalSales": 0,
                    "salesRevenue": 0,
                    "totalRental": 0,
                    "rentalRevenue": 0
                }
            },
            { "patch": { "id": doc_id, "set": set } }
        ]))
        .await?;
        Ok(())
    }
}

// ── In-memory store (tests and local development) ────────────────

#[derive(Default)]
struct InMemoryInner {
    dresses: Vec<Dress>,
    categories: Vec<Category>,
    confirmed: Vec<Booking>,
    completed: Vec<Booking>,
    orders: Vec<OrderDraft>,
    revenues: HashMap<String, MonthlyRevenue>,
}

/// Seedable stand-in for the remote store. `set_offline(true)` makes
/// every call fail, for exercising the fetch degrade policy.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<InMemoryInner>,
    offline: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_dresses(&self, dresses: Vec<Dress>) {
        self.inner.lock().unwrap().dresses = dresses;
    }

    pub fn seed_categories(&self, categories: Vec<Category>) {
        self.inner.lock().unwrap().categories = categories;
    }

    pub fn seed_confirmed_bookings(&self, bookings: Vec<Booking>) {
        self.inner.lock().unwrap().confirmed = bookings;
    }

    pub fn seed_completed_bookings(&self, bookings: Vec<Booking>) {
        self.inner.lock().unwrap().completed = bookings;
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn orders(&self) -> Vec<OrderDraft> {
        self.inner.lock().unwrap().orders.clone()
    }

    pub fn revenue_for(&self, month_key: &str) -> Option<MonthlyRevenue> {
        self.inner.lock().unwrap().revenues.get(month_key).copied()
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for InMemoryStore {
    async fn fetch_confirmed_bookings(&self) -> Result<Vec<Booking>, StoreError> {
        self.check_online()?;
        Ok(self.inner.lock().unwrap().confirmed.clone())
    }

    async fn fetch_dresses(&self) -> Result<Vec<Dress>, StoreError> {
        self.check_online()?;
        Ok(self.inner.lock().unwrap().dresses.clone())
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, StoreError> {
        self.check_online()?;
        Ok(self.inner.lock().unwrap().categories.clone())
    }

    async fn fetch_completed_bookings_in_month(
        &self,
        _year: i32,
        _month: u32,
    ) -> Result<Vec<Booking>, StoreError> {
        self.check_online()?;
        Ok(self.inner.lock().unwrap().completed.clone())
    }

    async fn create_order(&self, order: &OrderDraft) -> Result<String, StoreError> {
        self.check_online()?;
        let id = uuid::Uuid::new_v4().to_string();
        self.inner.lock().unwrap().orders.push(order.clone());
        Ok(id)
    }

    async fn upsert_monthly_revenue(
        &self,
        month_key: &str,
        revenue: &MonthlyRevenue,
    ) -> Result<(), StoreError> {
        self.check_online()?;
        self.inner
            .lock()
            .unwrap()
            .revenues
            .insert(month_key.to_string(), *revenue);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_window_bounds() {
        let (start, end) = month_window(2025, 6).unwrap();
        assert_eq!(start, "2025-06-01T00:00:00.000Z");
        assert_eq!(end, "2025-06-30T23:59:59.999Z");
    }

    #[test]
    fn month_window_december_rolls_year() {
        let (start, end) = month_window(2024, 12).unwrap();
        assert_eq!(start, "2024-12-01T00:00:00.000Z");
        assert_eq!(end, "2024-12-31T23:59:59.999Z");
    }

    #[test]
    fn month_window_leap_february() {
        let (_, end) = month_window(2024, 2).unwrap();
        assert_eq!(end, "2024-02-29T23:59:59.999Z");
    }

    #[tokio::test]
    async fn in_memory_store_offline_fails_every_call() {
        let store = InMemoryStore::new();
        store.set_offline(true);
        assert!(store.fetch_confirmed_bookings().await.is_err());
        assert!(store.fetch_dresses().await.is_err());
        store.set_offline(false);
        assert!(store.fetch_confirmed_bookings().await.is_ok());
    }

    #[tokio::test]
    async fn in_memory_store_serves_seeded_categories() {
        let store = InMemoryStore::new();
        store.seed_categories(vec![Category {
            id: "cat-sirene".into(),
            name: "Sirène".into(),
        }]);
        let categories = store.fetch_categories().await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "Sirène");
    }

    #[tokio::test]
    async fn in_memory_store_records_orders() {
        let store = InMemoryStore::new();
        let order = OrderDraft {
            full_name: "Amina".into(),
            phone: "+216 22334455".into(),
            address: "Tunis".into(),
            note: None,
            try_on_date: "2024-06-01".into(),
            items: vec![],
            total: 0.0,
            status: "pending".into(),
        };
        let id = store.create_order(&order).await.unwrap();
        assert!(!id.is_empty());
        assert_eq!(store.orders().len(), 1);
    }
}
