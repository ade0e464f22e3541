//! Value normalizers: pure functions turning raw text fragments into typed
//! values. Locators hand these whatever they found near a label; a `None`
//! here means the fragment was not a usable value, not an error.

use regex::Regex;

use crate::labels::{COLOR_BOUNDARY_MARKERS, REBATE_MARKERS};

/// Parses a distance in kilometres from a text fragment.
///
/// Matches a decimal number immediately followed (allowing whitespace) by a
/// distance unit token, strips thousands separators, and truncates to an
/// integer. `"45,230 KM"` → `45230`.
#[must_use]
pub fn parse_distance_km(text: &str) -> Option<u32> {
    let re = Regex::new(r"(?i)(\d[\d,.]*)\s*(?:kilometres?|kilometers?|km)\b")
        .expect("valid regex");
    let captured = re.captures(text)?.get(1)?.as_str();
    let cleaned = captured.replace(',', "");
    let value = cleaned.parse::<f64>().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    u32::try_from(value.trunc() as i64).ok()
}

/// Parses the first currency-like numeric run out of a text fragment and
/// re-renders it as `"$45,995"`.
///
/// A fragment containing a rebate/incentive marker is rejected outright:
/// rebate figures sit next to the price on the source pages, and a rebate
/// must never be mistaken for the price.
#[must_use]
pub fn parse_money(text: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    if REBATE_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return None;
    }
    let re = Regex::new(r"(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)").expect("valid regex");
    let captured = re.find(text)?.as_str();
    let whole = captured.split('.').next().unwrap_or(captured).replace(',', "");
    let dollars = whole.parse::<u64>().ok()?;
    Some(format!("${}", group_thousands(dollars)))
}

/// Cleans an exterior-color fragment into a title-cased short phrase.
///
/// The fragment is cut at the first occurrence of a neighboring-field marker
/// (interior, drivetrain, …) so a value scanned out of running text does not
/// bleed into the next field, then the leading tokens are title-cased.
#[must_use]
pub fn normalize_color(text: &str) -> Option<String> {
    let mut value = text.trim().to_string();
    let lower = value.to_ascii_lowercase();
    if let Some(cut) = COLOR_BOUNDARY_MARKERS
        .iter()
        .filter_map(|marker| lower.find(marker))
        .min()
    {
        value.truncate(cut);
    }
    let tokens: Vec<String> = value
        .split_whitespace()
        .take(3)
        .map(title_case_token)
        .collect();
    if tokens.is_empty() {
        return None;
    }
    Some(tokens.join(" "))
}

/// Resolves a possibly-relative hyperlink against the site's base origin.
///
/// The same vehicle must never be recorded under two different absolute
/// forms, so every URL entering a record goes through here. Fragments are
/// dropped; queries are preserved (Carfax report links carry them).
#[must_use]
pub fn canonicalize_url(href: &str, base: &str) -> String {
    let trimmed = href.trim();
    match reqwest::Url::parse(base).and_then(|b| b.join(trimmed)) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => {
            if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
                trimmed.to_string()
            } else {
                format!("{}{}", base.trim_end_matches('/'), trimmed)
            }
        }
    }
}

fn title_case_token(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
