use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::availability::{
    AvailabilityError, AvailabilityIndex, rental_range, today_utc,
};
use crate::observability;
use crate::store::{ContentStore, StoreError};

/// Whether a session's index reflects an actual fetch or a failed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    /// The fetch failed; the index is empty and queries answer
    /// "available" on a best-effort basis.
    Stale,
}

/// One page session's availability view: a single fetch, a single
/// wholesale index build, and the day the session opened on. Created on
/// page mount, discarded on navigation, never shared across sessions.
pub struct Session {
    index: AvailabilityIndex,
    freshness: Freshness,
    today: NaiveDate,
}

impl Session {
    pub fn is_booked(&self, dress_id: &str, day: NaiveDate) -> bool {
        self.index.is_booked(dress_id, day)
    }

    /// Day-picker decision: past-date guard against the day the session
    /// opened, then the index lookup.
    pub fn is_day_selectable(&self, dress_id: &str, day: NaiveDate) -> bool {
        self.index.is_day_selectable(dress_id, day, self.today)
    }

    /// Validate a proposed rental window. `start` must be strictly
    /// before `end`; the first booked day inside the window is returned
    /// as `Unavailable`.
    pub fn validate_rental_range(
        &self,
        dress_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(), AvailabilityError> {
        let range = rental_range(start, end)?;
        self.index.validate_range(dress_id, range)
    }

    /// True when the backing fetch failed and queries are answering from
    /// an empty index. Browsing may proceed; submission must not.
    pub fn is_stale(&self) -> bool {
        self.freshness == Freshness::Stale
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn index(&self) -> &AvailabilityIndex {
        &self.index
    }
}

/// The single place the fetch degrade policy lives: every consumer gets
/// the same best-effort index and the same staleness signal, instead of
/// each call site catching and ignoring fetch errors on its own.
pub struct AvailabilityService<S> {
    store: Arc<S>,
}

impl<S> Clone for AvailabilityService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: ContentStore> AvailabilityService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Open a browsing session: fetch confirmed bookings once and build
    /// the index wholesale. Fetch failure degrades to an empty, stale
    /// index (fail-open) so the site stays browsable; there is no retry.
    /// A superseded navigation simply drops the returned session.
    pub async fn open_session(&self) -> Session {
        let today = today_utc();
        match self.fetch_index().await {
            Ok(index) => Session {
                index,
                freshness: Freshness::Fresh,
                today,
            },
            Err(e) => {
                warn!("availability fetch failed, browsing fail-open: {e}");
                metrics::counter!(observability::STALE_SESSIONS_TOTAL).increment(1);
                Session {
                    index: AvailabilityIndex::default(),
                    freshness: Freshness::Stale,
                    today,
                }
            }
        }
    }

    /// Fetch and build a fresh index, propagating fetch failure. Used at
    /// submission time, where fail-open is not acceptable.
    pub async fn fresh_index(&self) -> Result<AvailabilityIndex, StoreError> {
        self.fetch_index().await
    }

    async fn fetch_index(&self) -> Result<AvailabilityIndex, StoreError> {
        metrics::counter!(observability::AVAILABILITY_FETCHES_TOTAL).increment(1);
        let started = Instant::now();
        let bookings = self
            .store
            .fetch_confirmed_bookings()
            .await
            .inspect_err(|_| {
                metrics::counter!(observability::AVAILABILITY_FETCH_FAILURES_TOTAL).increment(1);
            })?;
        let index = AvailabilityIndex::build(&bookings);
        metrics::histogram!(observability::AVAILABILITY_FETCH_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        metrics::gauge!(observability::INDEX_DRESSES_BLOCKED).set(index.dress_count() as f64);
        debug!(
            bookings = bookings.len(),
            blocked_dresses = index.dress_count(),
            "availability index built"
        );
        Ok(index)
    }
}
