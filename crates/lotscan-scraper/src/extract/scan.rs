//! Label-proximity scans over the document structure.
//!
//! Three passes, in falling order of markup quality: term/definition and
//! header/cell pairs, list items, and generic "label: value" text blocks.
//! Label matching is always a case-insensitive substring test against the
//! field's label set.

use scraper::{ElementRef, Html, Selector};

use crate::extract::collect_text;
use crate::labels::{contains_label, strip_label};

/// A "label: value" block longer than this is running prose, not a field row.
const MAX_BLOCK_LEN: usize = 120;

/// Scans `<dt>`/`<dd>` pairs and table rows whose first cell carries a label.
pub(super) fn scan_definition_pairs(document: &Html, labels: &[&str]) -> Option<String> {
    let dt_sel = Selector::parse("dt").expect("valid selector");
    for dt in document.select(&dt_sel) {
        if !contains_label(&collect_text(dt), labels) {
            continue;
        }
        let dd = dt
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "dd");
        if let Some(dd) = dd {
            let value = collect_text(dd);
            if !value.is_empty() {
                return Some(value);
            }
        }
    }

    let row_sel = Selector::parse("tr").expect("valid selector");
    let cell_sel = Selector::parse("th, td").expect("valid selector");
    for row in document.select(&row_sel) {
        let cells: Vec<String> = row.select(&cell_sel).map(collect_text).collect();
        if cells.len() >= 2 && contains_label(&cells[0], labels) && !cells[1].is_empty() {
            return Some(cells[1].clone());
        }
    }

    None
}

/// Scans list items whose full text carries a label; the label token is
/// stripped out and the remainder returned.
pub(super) fn scan_list_items(document: &Html, labels: &[&str]) -> Option<String> {
    let li_sel = Selector::parse("li").expect("valid selector");
    for li in document.select(&li_sel) {
        let text = collect_text(li);
        if text.is_empty() || text.len() > MAX_BLOCK_LEN || !contains_label(&text, labels) {
            continue;
        }
        let value = strip_label(&text, labels);
        if !value.is_empty() {
            return Some(value);
        }
    }
    None
}

/// Scans short text-bearing blocks shaped like `label: value`.
pub(super) fn scan_labeled_blocks(document: &Html, labels: &[&str]) -> Option<String> {
    let block_sel = Selector::parse("p, div, span, td").expect("valid selector");
    for block in document.select(&block_sel) {
        let text = collect_text(block);
        if text.is_empty() || text.len() > MAX_BLOCK_LEN {
            continue;
        }
        let Some((before, after)) = text.split_once(':') else {
            continue;
        };
        if contains_label(before, labels) {
            let value = after.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::{COLOR_LABELS, MILEAGE_LABELS, PRICE_LABELS, STOCK_LABELS};

    fn doc(body: &str) -> Html {
        Html::parse_document(&format!("<html><body>{body}</body></html>"))
    }

    #[test]
    fn dt_dd_pair_is_found() {
        let document = doc("<dl><dt>Odometer</dt><dd>45,230 km</dd></dl>");
        assert_eq!(
            scan_definition_pairs(&document, MILEAGE_LABELS).as_deref(),
            Some("45,230 km")
        );
    }

    #[test]
    fn dt_without_following_dd_is_skipped() {
        let document = doc("<dl><dt>Odometer</dt></dl>");
        assert_eq!(scan_definition_pairs(&document, MILEAGE_LABELS), None);
    }

    #[test]
    fn table_row_header_cell_is_found() {
        let document = doc(
            "<table><tr><th>Exterior Colour</th><td>Deep Black Pearl</td></tr>\
             <tr><th>Interior</th><td>Titan Black</td></tr></table>",
        );
        assert_eq!(
            scan_definition_pairs(&document, COLOR_LABELS).as_deref(),
            Some("Deep Black Pearl")
        );
    }

    #[test]
    fn list_item_label_is_stripped_from_value() {
        let document = doc("<ul><li>Stock # 26-0058A</li><li>AWD</li></ul>");
        assert_eq!(
            scan_list_items(&document, STOCK_LABELS).as_deref(),
            Some("26-0058A")
        );
    }

    #[test]
    fn labeled_block_splits_at_first_colon() {
        let document = doc("<div><p>Our Price: $38,495</p></div>");
        assert_eq!(
            scan_labeled_blocks(&document, PRICE_LABELS).as_deref(),
            Some("$38,495")
        );
    }

    #[test]
    fn long_prose_blocks_are_not_mistaken_for_field_rows() {
        let long = "x".repeat(150);
        let document = doc(&format!("<p>price history: {long}</p>"));
        assert_eq!(scan_labeled_blocks(&document, PRICE_LABELS), None);
    }

    #[test]
    fn block_without_label_before_colon_is_skipped() {
        let document = doc("<p>Note: price pending</p>");
        assert_eq!(scan_labeled_blocks(&document, PRICE_LABELS), None);
    }
}
