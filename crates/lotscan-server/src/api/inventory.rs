use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use lotscan_core::{SearchFilters, VehicleRecord};
use lotscan_scraper::{carfax_lookup, search, CarfaxReport};

use super::{map_scrape_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

/// Characters of upstream body echoed back by the debug endpoint.
const DEBUG_PREVIEW_CHARS: usize = 800;

#[derive(Debug, Serialize)]
pub(super) struct SearchData {
    query: String,
    count: usize,
    cached: bool,
    vehicles: Vec<VehicleRecord>,
}

pub(super) async fn search_inventory(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(filters): Query<SearchFilters>,
) -> Result<impl IntoResponse, ApiError> {
    let key = filters.query_terms();

    if let Some(vehicles) = state.cache.get(&key).await {
        tracing::debug!(query = key, count = vehicles.len(), "cache hit");
        return Ok(Json(ApiResponse {
            data: SearchData {
                query: key,
                count: vehicles.len(),
                cached: true,
                vehicles,
            },
            meta: ResponseMeta::new(req_id.0),
        }));
    }

    let vehicles = search(&state.client, &filters, state.config.enrich_limit)
        .await
        .map_err(|e| map_scrape_error(req_id.0.clone(), &e))?;
    state.cache.insert(&key, vehicles.clone()).await;

    Ok(Json(ApiResponse {
        data: SearchData {
            query: key,
            count: vehicles.len(),
            cached: false,
            vehicles,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct CarfaxParams {
    url: String,
}

pub(super) async fn carfax_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<CarfaxParams>,
) -> Result<Json<ApiResponse<CarfaxReport>>, ApiError> {
    // Only detail pages of the configured site get fetched on behalf of a
    // caller; anything else is a request to proxy an arbitrary URL.
    let prefix = format!("{}/", state.config.base_origin);
    let on_site = params.url.len() > prefix.len()
        && params
            .url
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(&prefix));
    if !on_site {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "url must point at the configured inventory site",
        ));
    }

    let report = carfax_lookup(&state.client, &params.url).await;
    Ok(Json(ApiResponse {
        data: report,
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct DebugParams {
    text: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct DebugData {
    url: String,
    status: u16,
    length: usize,
    sha256: String,
    has_detail_links: bool,
    preview: String,
}

/// Reports what the upstream listing actually returned for a query: status,
/// body size, a content digest, and whether any detail links are visible.
/// Used to diagnose upstream markup changes without shipping whole pages.
pub(super) async fn debug_fetch(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<DebugParams>,
) -> Result<Json<ApiResponse<DebugData>>, ApiError> {
    let query = params.text.unwrap_or_default();
    let url = state.client.listing_url(query.trim());

    let (status, body) = state
        .client
        .fetch_raw(&url)
        .await
        .map_err(|e| map_scrape_error(req_id.0.clone(), &e))?;

    let needle = format!("{}/", state.config.listing_path.to_ascii_lowercase());
    let data = DebugData {
        url,
        status,
        length: body.len(),
        sha256: format!("{:x}", Sha256::digest(body.as_bytes())),
        has_detail_links: body.to_ascii_lowercase().contains(&needle),
        preview: body.chars().take(DEBUG_PREVIEW_CHARS).collect(),
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
