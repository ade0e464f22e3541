//! Detail-page link extraction from a listing page.
//!
//! Listing pages are inconsistently rendered (plain HTML vs. script-populated),
//! so two independent passes are run and unioned: a structural pass over
//! anchor elements and a textual regex pass over the raw markup. The union is
//! strictly more complete than either pass alone; duplicates are harmless and
//! collapse under canonicalization + set semantics.

use std::collections::HashSet;

use regex::Regex;
use scraper::{Html, Selector};

use crate::normalize::canonicalize_url;

/// Extracts the canonical detail-page URLs referenced anywhere on a listing
/// page. Output is deduplicated and preserves first-discovery order.
#[must_use]
pub fn extract_detail_links(html: &str, base_origin: &str, listing_path: &str) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut urls: Vec<String> = Vec::new();
    let mut push = |candidate: String| {
        if let Some(canonical) = canonical_detail_url(&candidate, base_origin, listing_path) {
            if seen.insert(canonical.clone()) {
                urls.push(canonical);
            }
        }
    };

    // Structural pass: anchors whose target matches the detail path convention.
    let document = Html::parse_document(html);
    let anchor_sel = Selector::parse("a[href]").expect("valid selector");
    let needle = format!("{}/", listing_path.to_ascii_lowercase());
    for anchor in document.select(&anchor_sel) {
        if let Some(href) = anchor.value().attr("href") {
            if href.to_ascii_lowercase().contains(&needle) {
                push(href.to_string());
            }
        }
    }

    // Textual pass: the raw markup often carries detail URLs outside anchor
    // elements (client-rendered data blobs, inline JSON).
    let pattern = format!(
        r"(?:https?://[A-Za-z0-9.\-]+)?{}/[A-Za-z0-9%\-_.~]+",
        regex::escape(listing_path)
    );
    let re = Regex::new(&pattern).expect("valid regex");
    for found in re.find_iter(html) {
        push(found.as_str().to_string());
    }

    urls
}

/// Canonicalizes a candidate href and keeps it only if it resolves to a
/// detail page under the listing path with a non-empty slug. The query string
/// is dropped so tracking parameters cannot split one vehicle's identity.
fn canonical_detail_url(href: &str, base_origin: &str, listing_path: &str) -> Option<String> {
    let absolute = canonicalize_url(href, base_origin);
    let mut url = reqwest::Url::parse(&absolute).ok()?;
    url.set_query(None);
    url.set_fragment(None);

    let prefix = format!("{listing_path}/");
    let path = url.path().to_string();
    if path.len() <= prefix.len() || !path[..prefix.len()].eq_ignore_ascii_case(&prefix) {
        return None;
    }
    let slug = &path[prefix.len()..];
    if slug.is_empty() || slug.contains('/') {
        return None;
    }
    // One casing per vehicle: the configured listing path plus a folded slug.
    url.set_path(&format!("{listing_path}/{}", slug.to_ascii_lowercase()));
    Some(url.to_string())
}
