//! Per-field label sets, kept as data.
//!
//! The target site labels the same field differently across page revisions
//! ("Price" vs. "Purchase Price" vs. "Our Price"); new variants get added
//! here without touching the matching logic.

/// Fields the extraction pipeline can locate via label proximity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Price,
    Mileage,
    Color,
    Stock,
}

impl Field {
    /// The natural-language strings known to introduce this field's value.
    #[must_use]
    pub fn labels(self) -> &'static [&'static str] {
        match self {
            Field::Price => PRICE_LABELS,
            Field::Mileage => MILEAGE_LABELS,
            Field::Color => COLOR_LABELS,
            Field::Stock => STOCK_LABELS,
        }
    }
}

pub const PRICE_LABELS: &[&str] = &["our price", "purchase price", "sale price", "price"];

pub const MILEAGE_LABELS: &[&str] = &["kilometres", "kilometers", "odometer", "mileage", "km"];

pub const COLOR_LABELS: &[&str] = &["exterior colour", "exterior color", "colour", "color"];

pub const STOCK_LABELS: &[&str] = &["stock #", "stock#", "stock number", "stock"];

pub const TRIM_LABELS: &[&str] = &["trim level", "trim"];

/// Fragments carrying any of these never yield a price; rebate figures sit
/// right next to the price on the source pages and are a common false match.
pub const REBATE_MARKERS: &[&str] = &["rebate", "discount", "incentive", "save"];

/// Labels of fields that render adjacent to the exterior color; a color value
/// is cut at the first of these so it does not bleed into the next field.
pub const COLOR_BOUNDARY_MARKERS: &[&str] =
    &["interior", "drivetrain", "frame", "body style", "options"];

/// Labels that terminate a trim value mined from running text.
pub const TRIM_BOUNDARY_MARKERS: &[&str] = &[
    "drivetrain",
    "exterior",
    "interior",
    "body style",
    "transmission",
    "odometer",
    "kilometres",
    "kilometers",
    "stock",
    "vin",
    "price",
];

/// Case-insensitive substring match of any label in `labels` against `text`.
#[must_use]
pub fn contains_label(text: &str, labels: &[&str]) -> bool {
    let lower = text.to_ascii_lowercase();
    labels.iter().any(|label| lower.contains(label))
}

/// Removes the first matching label (longest label first) from `text`, along
/// with separator punctuation around it. Returns the trimmed remainder.
#[must_use]
pub fn strip_label(text: &str, labels: &[&str]) -> String {
    let lower = text.to_ascii_lowercase();
    let mut best: Option<(usize, usize)> = None;
    for label in labels {
        if let Some(pos) = lower.find(label) {
            let better = match best {
                Some((_, len)) => label.len() > len,
                None => true,
            };
            if better {
                best = Some((pos, label.len()));
            }
        }
    }
    let Some((pos, len)) = best else {
        return text.trim().to_string();
    };
    let mut remainder = String::new();
    remainder.push_str(&text[..pos]);
    remainder.push(' ');
    remainder.push_str(&text[pos + len..]);
    remainder
        .trim_matches(|c: char| c.is_whitespace() || c == ':' || c == '#' || c == '-')
        .to_string()
}
