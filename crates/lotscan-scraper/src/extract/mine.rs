//! Scoped full-text regex mining, the last-resort locator.
//!
//! Mining is restricted to the page's specification region so a number from a
//! "similar vehicles" panel cannot leak into the record, and every pattern is
//! anchored to a label token so the captured value stays bound to its field.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::extract::collect_text;
use crate::labels::{Field, REBATE_MARKERS, TRIM_BOUNDARY_MARKERS};

/// Bytes of context checked behind a mined price for rebate contamination.
const PRICE_BACK_WINDOW: usize = 24;

/// Returns the text of the page's vehicle-specification region.
///
/// The region is the subtree around a heading containing "Specification"
/// (preferred) or "Vehicle"; when no such heading exists the whole page text
/// is used.
#[must_use]
pub fn specification_region(document: &Html) -> String {
    for marker in ["specification", "vehicle"] {
        if let Some(text) = region_around_heading(document, marker) {
            return text;
        }
    }
    collect_text(document.root_element())
}

fn region_around_heading(document: &Html, marker: &str) -> Option<String> {
    let heading_sel = Selector::parse("h1, h2, h3, h4, h5, h6").expect("valid selector");
    for heading in document.select(&heading_sel) {
        if !collect_text(heading).to_ascii_lowercase().contains(marker) {
            continue;
        }
        if let Some(parent) = heading.parent().and_then(ElementRef::wrap) {
            let text = collect_text(parent);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Field-specific, label-anchored regex mining over the region text.
/// Returns a raw value for the caller to normalize.
#[must_use]
pub(super) fn mine_labeled_value(region: &str, field: Field) -> Option<String> {
    match field {
        Field::Price => mine_price(region),
        Field::Mileage => {
            let re = Regex::new(
                r"(?i)(?:odometer|kilometres?|kilometers?|mileage)[^0-9\n]{0,12}(\d[\d,.]*(?:\s*km)?)",
            )
            .expect("valid regex");
            capture(&re, region)
        }
        Field::Color => {
            let re = Regex::new(r"(?i)(?:exterior\s+)?colou?r\s*:?\s*([A-Za-z][A-Za-z ]{0,40})")
                .expect("valid regex");
            capture(&re, region)
        }
        Field::Stock => mine_stock_number(region),
    }
}

/// Mines a price while checking a short back-window for rebate markers; a
/// figure sitting in rebate context is skipped, not returned.
fn mine_price(region: &str) -> Option<String> {
    let re = Regex::new(
        r"(?i)(?:our price|purchase price|sale price|price)\s*:?\s*\$?\s*\d[\d,]*(?:\.\d+)?",
    )
    .expect("valid regex");
    for found in re.find_iter(region) {
        let candidate_start = found.start().saturating_sub(PRICE_BACK_WINDOW);
        let window_start = (candidate_start..=found.start())
            .find(|&i| region.is_char_boundary(i))
            .unwrap_or(found.start());
        let window = &region[window_start..found.end()];
        let lower = window.to_ascii_lowercase();
        if REBATE_MARKERS.iter().any(|marker| lower.contains(marker)) {
            continue;
        }
        return Some(found.as_str().to_string());
    }
    None
}

/// Mines a VIN: a strict 17-character identifier (uppercase alphanumeric,
/// no I/O/Q). A 16- or 18-character near-match does not qualify.
#[must_use]
pub fn mine_vin(region: &str) -> Option<String> {
    let upper = region.to_uppercase();
    let re = Regex::new(r"\b[A-HJ-NPR-Z0-9]{17}\b").expect("valid regex");
    re.find(&upper).map(|m| m.as_str().to_string())
}

/// The VIN shape every extraction source must agree on: exactly 17 uppercase
/// alphanumeric characters with I, O and Q excluded.
pub(crate) fn looks_like_vin(value: &str) -> bool {
    value.len() == 17
        && value.chars().all(|c| {
            c.is_ascii_digit() || (c.is_ascii_uppercase() && !matches!(c, 'I' | 'O' | 'Q'))
        })
}

/// Mines a stock number bound to a stock label: dashed/plain alphanumeric,
/// at least one digit. `"Stock # 26-0058A"` → `"26-0058A"`.
#[must_use]
pub fn mine_stock_number(region: &str) -> Option<String> {
    let re = Regex::new(r"(?i)stock\s*(?:#|no\.?|number)?\s*:?\s*([A-Za-z0-9][A-Za-z0-9-]{2,11})")
        .expect("valid regex");
    for cap in re.captures_iter(region) {
        let value = cap.get(1)?.as_str().to_uppercase();
        if value.chars().any(|c| c.is_ascii_digit()) {
            return Some(value);
        }
    }
    None
}

/// Mines the trim designation: text following a trim label, cut at the next
/// field boundary, with the leftover "Level" boilerplate token stripped.
#[must_use]
pub fn mine_trim(region: &str) -> Option<String> {
    let re = Regex::new(r"(?i)\btrim(?:\s+level)?\s*:?\s*(.{1,60})").expect("valid regex");
    let captured = re.captures(region)?.get(1)?.as_str();

    let lower = captured.to_ascii_lowercase();
    let cut = TRIM_BOUNDARY_MARKERS
        .iter()
        .filter_map(|marker| lower.find(marker))
        .min()
        .unwrap_or(captured.len());

    let mut value = captured[..cut].trim();
    if let Some(rest) = value.strip_prefix("Level").or_else(|| value.strip_prefix("level")) {
        value = rest;
    }
    let value = value.trim_matches(|c: char| c.is_whitespace() || c == ':' || c == '-');
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Mines mileage tightly bound to an odometer/kilometres label.
/// `"Odometer 45,230 KM"` → `45230`.
#[must_use]
pub fn mine_mileage_km(region: &str) -> Option<u32> {
    let re = Regex::new(
        r"(?i)(?:odometer|kilometres?|kilometers?|mileage)[^0-9\n]{0,12}(\d[\d,.]*)",
    )
    .expect("valid regex");
    let captured = re.captures(region)?.get(1)?.as_str();
    let cleaned = captured.trim_end_matches('.').replace(',', "");
    let value = cleaned.parse::<f64>().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    u32::try_from(value.trunc() as i64).ok()
}

fn capture(re: &Regex, region: &str) -> Option<String> {
    re.captures(region)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_prefers_the_specification_heading() {
        let html = r#"<html><body>
            <section id="specs"><h2>Vehicle Specification</h2><p>Odometer 45,230 KM</p></section>
            <section id="similar"><h2>Similar Vehicles</h2><p>Odometer 9 KM</p></section>
        </body></html>"#;
        let document = Html::parse_document(html);
        let region = specification_region(&document);
        assert!(region.contains("45,230"));
        assert!(!region.contains("Similar"));
    }

    #[test]
    fn region_falls_back_to_whole_page() {
        let html = "<html><body><p>Stock # 26-0058A</p></body></html>";
        let document = Html::parse_document(html);
        assert!(specification_region(&document).contains("26-0058A"));
    }

    #[test]
    fn vin_of_exactly_seventeen_chars_is_mined() {
        assert_eq!(
            mine_vin("vin 3vv2b7ax8rm012345 listed").as_deref(),
            Some("3VV2B7AX8RM012345")
        );
    }

    #[test]
    fn sixteen_char_near_match_is_rejected() {
        assert_eq!(mine_vin("3VV2B7AX8RM01234"), None);
    }

    #[test]
    fn eighteen_char_near_match_is_rejected() {
        assert_eq!(mine_vin("3VV2B7AX8RM0123456"), None);
    }

    #[test]
    fn vin_containing_i_o_q_is_rejected() {
        assert_eq!(mine_vin("3VV2B7AXORM012345"), None);
    }

    #[test]
    fn vin_shape_check_agrees_with_the_mining_pattern() {
        assert!(looks_like_vin("3VV2B7AX8RM012345"));
        assert!(!looks_like_vin("3VO2B7AXIRMQ12345"));
        assert!(!looks_like_vin("3VV2B7AX8RM01234"));
    }

    #[test]
    fn stock_number_with_dash_suffix() {
        assert_eq!(
            mine_stock_number("Stock # 26-0058A").as_deref(),
            Some("26-0058A")
        );
    }

    #[test]
    fn stock_requires_a_digit() {
        assert_eq!(mine_stock_number("stock photo"), None);
    }

    #[test]
    fn trim_is_cut_at_the_next_field_boundary() {
        assert_eq!(
            mine_trim("Trim Comfortline Drivetrain AWD").as_deref(),
            Some("Comfortline")
        );
    }

    #[test]
    fn trim_level_boilerplate_is_stripped() {
        assert_eq!(
            mine_trim("Trim Level: Highline R-Line Stock # 9").as_deref(),
            Some("Highline R-Line")
        );
    }

    #[test]
    fn mileage_bound_to_odometer_label() {
        assert_eq!(mine_mileage_km("Odometer 45,230 KM"), Some(45_230));
    }

    #[test]
    fn unlabeled_number_is_not_mileage() {
        assert_eq!(mine_mileage_km("45,230 on the lot"), None);
    }

    #[test]
    fn mined_price_skips_rebate_context() {
        let region = "Winter rebate price $2,000 off. Our Price: $38,495";
        assert_eq!(mine_price(region).as_deref(), Some("Our Price: $38,495"));
    }

    #[test]
    fn price_with_no_clean_match_is_none() {
        assert_eq!(mine_price("Rebate price $2,000"), None);
    }
}
