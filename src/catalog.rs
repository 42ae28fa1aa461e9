use chrono::NaiveDate;

use crate::model::Dress;
use crate::service::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindFilter {
    #[default]
    All,
    Rental,
    Purchase,
}

/// Listing-page filter state. Lives for one page session and is passed
/// into `filter_dresses` explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct DressFilter {
    pub search: String,
    pub color: Option<String>,
    pub sizes: Vec<String>,
    /// Applied to the buy price for sale dresses, the daily rate otherwise.
    pub price_range: (f64, f64),
    pub kind: KindFilter,
    /// Desired rental start date; dresses booked on it are excluded.
    pub start_date: Option<NaiveDate>,
    pub category: Option<String>,
}

impl Default for DressFilter {
    fn default() -> Self {
        Self {
            search: String::new(),
            color: None,
            sizes: Vec::new(),
            price_range: (0.0, 10_000.0),
            kind: KindFilter::All,
            start_date: None,
            category: None,
        }
    }
}

impl DressFilter {
    fn matches(&self, dress: &Dress, session: &Session) -> bool {
        if let Some(category_id) = &self.category
            && !dress.categories.iter().any(|c| &c.id == category_id)
        {
            return false;
        }
        // Listings only show dresses that can actually render a card
        if !dress.has_display_image() {
            return false;
        }
        if !self.search.is_empty() {
            let needle = self.search.to_lowercase();
            if !dress.name.to_lowercase().contains(&needle)
                && !dress.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(color) = &self.color
            && !dress.colors.iter().any(|c| &c.name == color)
        {
            return false;
        }
        if !self.sizes.is_empty() && !dress.sizes.iter().any(|s| self.sizes.contains(s)) {
            return false;
        }
        let price = if dress.is_for_sale {
            dress.buy_price.unwrap_or(0.0)
        } else {
            dress.price_per_day.unwrap_or(0.0)
        };
        if price < self.price_range.0 || price > self.price_range.1 {
            return false;
        }
        match self.kind {
            KindFilter::All => {}
            KindFilter::Purchase if !dress.is_for_sale => return false,
            KindFilter::Rental if dress.is_for_sale => return false,
            _ => {}
        }
        if let Some(date) = self.start_date
            && session.is_booked(&dress.id, date)
        {
            return false;
        }
        true
    }
}

/// Apply the listing filter against one session's availability view.
pub fn filter_dresses<'a>(
    dresses: &'a [Dress],
    filter: &DressFilter,
    session: &Session,
) -> Vec<&'a Dress> {
    dresses
        .iter()
        .filter(|d| filter.matches(d, session))
        .collect()
}

/// Distinct color names across the catalog, first-seen order.
pub fn all_colors(dresses: &[Dress]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut colors = Vec::new();
    for dress in dresses {
        for color in &dress.colors {
            if seen.insert(color.name.clone()) {
                colors.push(color.name.clone());
            }
        }
    }
    colors
}

/// Distinct sizes across the catalog, first-seen order.
pub fn all_sizes(dresses: &[Dress]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut sizes = Vec::new();
    for dress in dresses {
        for size in &dress.sizes {
            if seen.insert(size.clone()) {
                sizes.push(size.clone());
            }
        }
    }
    sizes
}
