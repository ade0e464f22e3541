//! Domain types shared across the scraper and the API surface.

use serde::{Deserialize, Serialize};

/// One used vehicle, assembled from a detail page.
///
/// Every field except `url` is best-effort: a field the page does not carry
/// (or carries in a form no extraction strategy recognizes) is `None`/empty,
/// never a placeholder. `error` is set only when assembly failed mid-way,
/// in which case the data fields are left null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleRecord {
    /// Canonical absolute detail-page URL; the record's identity key.
    pub url: String,
    /// Display title, or the URL itself when the page has no usable heading.
    pub title: String,
    pub year: Option<i32>,
    pub make: String,
    pub model: String,
    pub trim: String,
    /// Currency-formatted, e.g. `"$45,995"`. Never sourced from a rebate figure.
    pub price: Option<String>,
    pub color: Option<String>,
    pub mileage_km: Option<u32>,
    pub stock_number: Option<String>,
    /// 17 characters, uppercase alphanumeric excluding I/O/Q.
    pub vin: Option<String>,
    pub carfax_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VehicleRecord {
    /// An empty record carrying only its identity.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            title: url.clone(),
            url,
            year: None,
            make: String::new(),
            model: String::new(),
            trim: String::new(),
            price: None,
            color: None,
            mileage_km: None,
            stock_number: None,
            vin: None,
            carfax_url: None,
            error: None,
        }
    }
}

/// Request-scoped search filters: free text, or a year/make/model triple.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchFilters {
    pub text: Option<String>,
    pub year: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
}

impl SearchFilters {
    /// Normalizes the filters into a single whitespace-joined token sequence.
    ///
    /// Free text wins verbatim (trimmed); otherwise non-empty year, make and
    /// model are joined with single spaces, in that order. The result drives
    /// both the upstream listing query and the candidate-URL post-filter,
    /// and doubles as the cache key.
    #[must_use]
    pub fn query_terms(&self) -> String {
        if let Some(text) = self.text.as_deref() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
            }
        }
        [&self.year, &self.make, &self.model]
            .iter()
            .filter_map(|part| part.as_deref())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Lowercased filter terms used for the AND-of-terms slug match.
    #[must_use]
    pub fn match_terms(&self) -> Vec<String> {
        self.query_terms()
            .split_whitespace()
            .map(str::to_lowercase)
            .collect()
    }
}
