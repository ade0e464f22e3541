//! Detail-page assembly: one URL in, one [`VehicleRecord`] out.
//!
//! Assembly is fail-soft. A fetch or parse problem degrades the single
//! record (data fields null, `error` set) instead of failing the batch.
//! Extraction precedence inside a page is fixed: caller-supplied filters
//! and the title first, then structured embedded metadata, then the
//! heuristic locator chain, then scoped regex mining as the last resort.

use chrono::Datelike;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;

use lotscan_core::{SearchFilters, VehicleRecord};

use crate::client::SiteClient;
use crate::extract::{
    collect_text, extract_structured, locate_field, mine_mileage_km, mine_stock_number,
    mine_trim, mine_vin, specification_region,
};
use crate::labels::Field;
use crate::normalize::{canonicalize_url, normalize_color, parse_distance_km, parse_money};

/// Fetches a detail page and assembles its vehicle record.
///
/// Never fails: a fetch error produces a record with `error` set and every
/// extractable field null, so one bad page cannot sink a search batch.
pub async fn assemble(client: &SiteClient, url: &str, filters: &SearchFilters) -> VehicleRecord {
    match client.fetch_page(url).await {
        Ok(body) => assemble_from_html(url, &body, client.base_origin(), filters),
        Err(error) => {
            tracing::warn!(url, %error, "detail fetch failed; emitting degraded record");
            let mut record = VehicleRecord::new(url);
            record.error = Some(error.to_string());
            record
        }
    }
}

/// Assembles a record from already-fetched detail markup. Pure and
/// synchronous; the document never crosses an await point.
#[must_use]
pub fn assemble_from_html(
    url: &str,
    html: &str,
    base_origin: &str,
    filters: &SearchFilters,
) -> VehicleRecord {
    let document = Html::parse_document(html);
    let mut record = VehicleRecord::new(url);

    if let Some(title) = page_title(&document) {
        record.title = title;
    }

    record.year = year_from_title(&record.title).or_else(|| {
        filters
            .year
            .as_deref()
            .and_then(|y| y.trim().parse::<i32>().ok())
            .filter(|&y| plausible_year(y))
    });

    let (title_make, title_model) = make_model_from_title(&record.title);
    record.make = filter_value(filters.make.as_deref())
        .or(title_make)
        .unwrap_or_default();
    record.model = filter_value(filters.model.as_deref())
        .or(title_model)
        .unwrap_or_default();

    // Structured embedded metadata strictly outranks the heuristic scans.
    let structured = extract_structured(html);
    record.price = structured.price;
    record.mileage_km = structured.mileage_km;
    record.color = structured.color;
    record.stock_number = structured.stock_number;
    record.vin = structured.vin;

    let region = specification_region(&document);

    if record.price.is_none() {
        record.price = locate_field(&document, &region, Field::Price)
            .and_then(|raw| parse_money(&raw));
    }
    if record.mileage_km.is_none() {
        record.mileage_km = locate_field(&document, &region, Field::Mileage)
            .and_then(|raw| parse_distance_km(&raw).or_else(|| loose_km(&raw)));
    }
    if record.color.is_none() {
        record.color =
            locate_field(&document, &region, Field::Color).and_then(|raw| normalize_color(&raw));
    }
    if record.stock_number.is_none() {
        record.stock_number =
            locate_field(&document, &region, Field::Stock).and_then(|raw| clean_stock(&raw));
    }

    // Last-resort mining for the fields with no locator chain of their own,
    // plus anything the chain left empty.
    if record.vin.is_none() {
        record.vin = mine_vin(&region);
    }
    if record.stock_number.is_none() {
        record.stock_number = mine_stock_number(&region);
    }
    if record.trim.is_empty() {
        if let Some(trim) = mine_trim(&region) {
            record.trim = trim;
        }
    }
    if record.mileage_km.is_none() {
        record.mileage_km = mine_mileage_km(&region);
    }

    record.carfax_url = carfax_link(&document, base_origin);

    record
}

/// Result of a Carfax lookup against one detail page. Like record assembly,
/// the lookup degrades to an `error` field instead of failing.
#[derive(Debug, Clone, Serialize)]
pub struct CarfaxReport {
    pub url: String,
    pub carfax_url: Option<String>,
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Fetches a detail page and pulls out its Carfax link and any short
/// history/disclosure blurb next to it.
pub async fn carfax_lookup(client: &SiteClient, url: &str) -> CarfaxReport {
    let mut report = CarfaxReport {
        url: url.to_owned(),
        carfax_url: None,
        summary: None,
        error: None,
    };

    let body = match client.fetch_page(url).await {
        Ok(body) => body,
        Err(error) => {
            tracing::warn!(url, %error, "carfax lookup fetch failed");
            report.error = Some(error.to_string());
            return report;
        }
    };

    let document = Html::parse_document(&body);
    report.carfax_url = carfax_link(&document, client.base_origin());
    report.summary = history_summary(&document);
    report
}

fn page_title(document: &Html) -> Option<String> {
    let h1_sel = Selector::parse("h1").expect("valid selector");
    for h1 in document.select(&h1_sel) {
        let text = collect_text(h1);
        if !text.is_empty() {
            return Some(text);
        }
    }
    let title_sel = Selector::parse("title").expect("valid selector");
    document
        .select(&title_sel)
        .map(collect_text)
        .find(|text| !text.is_empty())
}

fn year_from_title(title: &str) -> Option<i32> {
    let re = Regex::new(r"\b(19\d{2}|20\d{2})\b").expect("valid regex");
    re.find(title)
        .and_then(|m| m.as_str().parse::<i32>().ok())
        .filter(|&year| plausible_year(year))
}

fn plausible_year(year: i32) -> bool {
    (1900..=chrono::Utc::now().year() + 1).contains(&year)
}

/// Make and model by token position: dealership titles run
/// `"<year> <make> <model> <trim...>"`, so the tokens after a leading year
/// token are positional.
fn make_model_from_title(title: &str) -> (Option<String>, Option<String>) {
    let tokens: Vec<&str> = title.split_whitespace().collect();
    let leads_with_year = tokens
        .first()
        .and_then(|t| t.parse::<i32>().ok())
        .is_some_and(plausible_year);
    if !leads_with_year {
        return (None, None);
    }
    (
        tokens.get(1).map(|t| (*t).to_string()),
        tokens.get(2).map(|t| (*t).to_string()),
    )
}

fn filter_value(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Distance value with the unit suffix missing, e.g. a bare `"45,230"` in a
/// definition list whose label already said kilometres.
fn loose_km(raw: &str) -> Option<u32> {
    let re = Regex::new(r"\d[\d,]*").expect("valid regex");
    let found = re.find(raw)?;
    found.as_str().replace(',', "").parse::<u32>().ok()
}

fn clean_stock(raw: &str) -> Option<String> {
    let value = raw.trim().to_uppercase();
    if value.is_empty() || value.len() > 16 {
        return None;
    }
    Some(value)
}

fn carfax_link(document: &Html, base_origin: &str) -> Option<String> {
    let anchor_sel = Selector::parse("a[href]").expect("valid selector");
    for anchor in document.select(&anchor_sel) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if href.to_ascii_lowercase().contains("carfax") {
            return Some(canonicalize_url(href, base_origin));
        }
    }
    None
}

fn history_summary(document: &Html) -> Option<String> {
    let summary_sel = Selector::parse(
        "[class*='carfax'], [class*='history'], [class*='disclosure']",
    )
    .expect("valid selector");
    document
        .select(&summary_sel)
        .map(collect_text)
        .find(|text| !text.is_empty())
}
