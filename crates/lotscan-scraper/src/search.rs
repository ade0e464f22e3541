//! The end-to-end search pipeline: listing fetch, link extraction,
//! term filtering, and per-record assembly.

use lotscan_core::{SearchFilters, VehicleRecord};

use crate::client::SiteClient;
use crate::enrich::assemble;
use crate::error::ScrapeError;
use crate::links::extract_detail_links;

/// Runs a full inventory search: fetches the upstream listing for the
/// filters' query terms, extracts candidate detail links, keeps those whose
/// slug matches every filter term, and assembles up to `limit` records.
///
/// Individual detail-page failures are absorbed into their records; only a
/// listing-page failure fails the search, because without it there is no
/// candidate set at all.
///
/// # Errors
///
/// Propagates the listing fetch's [`ScrapeError`].
pub async fn search(
    client: &SiteClient,
    filters: &SearchFilters,
    limit: usize,
) -> Result<Vec<VehicleRecord>, ScrapeError> {
    let query = filters.query_terms();
    let body = client.fetch_listing(&query).await?;

    let candidates = extract_detail_links(&body, client.base_origin(), client.listing_path());
    let terms = filters.match_terms();
    let mut selected: Vec<String> = candidates
        .into_iter()
        .filter(|url| slug_matches(url, &terms))
        .collect();
    let found = selected.len();
    selected.truncate(limit);

    tracing::info!(
        query,
        found,
        assembling = selected.len(),
        "listing scanned"
    );

    let mut records = Vec::with_capacity(selected.len());
    for url in &selected {
        records.push(assemble(client, url, filters).await);
    }
    Ok(records)
}

/// AND-of-terms match against the detail URL's slug, with hyphens treated as
/// spaces so `"2024-volkswagen-tiguan-id1"` matches the terms
/// `["2024", "tiguan"]`. An empty term list matches everything.
fn slug_matches(url: &str, terms: &[String]) -> bool {
    let slug = url.rsplit('/').next().unwrap_or(url);
    let haystack = slug.to_lowercase().replace('-', " ");
    terms.iter().all(|term| haystack.contains(term.as_str()))
}
