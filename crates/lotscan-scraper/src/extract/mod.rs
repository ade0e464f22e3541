//! Field locators: given a detail document and a target field, find the best
//! available raw text value.
//!
//! Strategies run in priority order (structured embedded metadata,
//! label-proximity scans over definition lists / list items / "label: value"
//! blocks, scoped full-text regex mining) and the first hit wins. Structured
//! metadata is handled separately by the assembler because it always takes
//! precedence over the heuristic scans, whatever order they would fire in.
//! Locators never mutate shared state; a miss is a `None`, not an error.

mod mine;
mod scan;
mod structured;

use scraper::Html;

use crate::labels::Field;

pub use mine::{mine_mileage_km, mine_stock_number, mine_trim, mine_vin, specification_region};
pub use structured::{extract_structured, StructuredVehicle};

/// Runs the heuristic locator chain for one field and returns the raw text
/// value it found, if any. `region` is the page's specification-region text,
/// used only by the final regex-mining strategy.
#[must_use]
pub fn locate_field(document: &Html, region: &str, field: Field) -> Option<String> {
    let labels = field.labels();

    if let Some(value) = scan::scan_definition_pairs(document, labels) {
        tracing::debug!(?field, value, "located via term/definition pair");
        return Some(value);
    }
    if let Some(value) = scan::scan_list_items(document, labels) {
        tracing::debug!(?field, value, "located via list item");
        return Some(value);
    }
    if let Some(value) = scan::scan_labeled_blocks(document, labels) {
        tracing::debug!(?field, value, "located via label:value block");
        return Some(value);
    }
    if let Some(value) = mine::mine_labeled_value(region, field) {
        tracing::debug!(?field, value, "located via scoped regex mining");
        return Some(value);
    }
    None
}

/// Whitespace-normalized text of an element subtree.
pub(crate) fn collect_text(element: scraper::ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
