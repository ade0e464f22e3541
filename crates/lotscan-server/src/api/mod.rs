mod inventory;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};

use lotscan_core::AppConfig;
use lotscan_scraper::{ScrapeError, SearchCache, SiteClient};

use crate::middleware::{enforce_rate_limit, request_id, RateLimitState, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<SiteClient>,
    pub cache: SearchCache,
    pub config: Arc<AppConfig>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    upstream: String,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_scrape_error(request_id: String, error: &ScrapeError) -> ApiError {
    tracing::error!(error = %error, "upstream fetch failed");
    ApiError::new(request_id, "upstream_error", "upstream fetch failed")
}

fn build_cors(allowed_origin: Option<&str>) -> CorsLayer {
    let origin = allowed_origin
        .and_then(|o| o.parse::<HeaderValue>().ok())
        .map_or(AllowOrigin::any(), AllowOrigin::exact);
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

fn inventory_router(rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/inventory/search", get(inventory::search_inventory))
        .route("/api/v1/inventory/carfax", get(inventory::carfax_report))
        .route("/api/v1/inventory/debug", get(inventory::debug_fetch))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ))
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));
    let cors = build_cors(state.config.allowed_origin.as_deref());

    Router::new()
        .merge(public_routes)
        .merge(inventory_router(rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);
    (
        StatusCode::OK,
        Json(ApiResponse {
            data: HealthData {
                status: "ok",
                upstream: state.config.base_origin.clone(),
            },
            meta,
        }),
    )
}

pub fn rate_limit_state(config: &AppConfig) -> RateLimitState {
    RateLimitState::new(config.rate_limit_per_minute, Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::net::SocketAddr;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LISTING_PATH: &str = "/en/used-inventory";

    fn test_config(upstream: &str) -> AppConfig {
        AppConfig {
            env: lotscan_core::Environment::Test,
            bind_addr: "127.0.0.1:0".parse::<SocketAddr>().expect("addr"),
            log_level: "info".to_string(),
            base_origin: upstream.trim_end_matches('/').to_string(),
            listing_path: LISTING_PATH.to_string(),
            allowed_origin: None,
            fetch_timeout_secs: 5,
            fetch_user_agent: "lotscan-test/0.1".to_string(),
            render_timeout_secs: 45,
            render_settle_ms: 0,
            cache_ttl_secs: 60,
            cache_max_entries: 8,
            enrich_limit: 10,
            rate_limit_per_minute: 120,
        }
    }

    fn test_app(server: &MockServer) -> Router {
        let config = Arc::new(test_config(&server.uri()));
        let client = Arc::new(SiteClient::from_config(&config).expect("client"));
        let cache = SearchCache::new(Duration::from_secs(60), 8);
        let rate_limit = rate_limit_state(&config);
        build_app(
            AppState {
                client,
                cache,
                config,
            },
            rate_limit,
        )
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
        (status, json)
    }

    fn detail_page() -> &'static str {
        r#"<html><body>
            <h1>2024 Volkswagen Tiguan Comfortline</h1>
            <section><h2>Vehicle Specification</h2>
              <dl><dt>Our Price</dt><dd>$38,495</dd>
                  <dt>Odometer</dt><dd>45,230 km</dd></dl>
            </section>
        </body></html>"#
    }

    #[tokio::test]
    async fn health_returns_ok_with_request_id_header() {
        let server = MockServer::start().await;
        let app = test_app(&server);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok()),
            Some("req-42")
        );
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
        assert_eq!(json["data"]["status"].as_str(), Some("ok"));
        assert_eq!(json["meta"]["request_id"].as_str(), Some("req-42"));
    }

    #[tokio::test]
    async fn search_returns_enveloped_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LISTING_PATH))
            .and(query_param("text", "tiguan"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<a href="{LISTING_PATH}/2024-tiguan-id1">View</a>"#
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{LISTING_PATH}/2024-tiguan-id1")))
            .respond_with(ResponseTemplate::new(200).set_body_string(detail_page()))
            .mount(&server)
            .await;

        let app = test_app(&server);
        let (status, json) = get_json(app, "/api/v1/inventory/search?text=tiguan").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["query"].as_str(), Some("tiguan"));
        assert_eq!(json["data"]["count"].as_i64(), Some(1));
        assert_eq!(json["data"]["cached"].as_bool(), Some(false));
        let vehicle = &json["data"]["vehicles"][0];
        assert_eq!(vehicle["price"].as_str(), Some("$38,495"));
        assert_eq!(vehicle["mileage_km"].as_i64(), Some(45_230));
    }

    #[tokio::test]
    async fn second_search_is_served_from_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LISTING_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<a href="{LISTING_PATH}/2024-tiguan-id1">View</a>"#
            )))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{LISTING_PATH}/2024-tiguan-id1")))
            .respond_with(ResponseTemplate::new(200).set_body_string(detail_page()))
            .expect(1)
            .mount(&server)
            .await;

        let config = Arc::new(test_config(&server.uri()));
        let client = Arc::new(SiteClient::from_config(&config).expect("client"));
        let cache = SearchCache::new(Duration::from_secs(60), 8);
        let state = AppState {
            client,
            cache,
            config,
        };

        let first = build_app(state.clone(), rate_limit_state(&state.config));
        let (_, json) = get_json(first, "/api/v1/inventory/search?text=tiguan").await;
        assert_eq!(json["data"]["cached"].as_bool(), Some(false));

        let second = build_app(state.clone(), rate_limit_state(&state.config));
        let (status, json) = get_json(second, "/api/v1/inventory/search?text=tiguan").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["cached"].as_bool(), Some(true));
        assert_eq!(json["data"]["count"].as_i64(), Some(1));
    }

    #[tokio::test]
    async fn listing_failure_maps_to_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LISTING_PATH))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let app = test_app(&server);
        let (status, json) = get_json(app, "/api/v1/inventory/search?text=tiguan").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["error"]["code"].as_str(), Some("upstream_error"));
    }

    #[tokio::test]
    async fn carfax_rejects_urls_outside_the_site() {
        let server = MockServer::start().await;
        let app = test_app(&server);
        let (status, json) = get_json(
            app,
            "/api/v1/inventory/carfax?url=https://evil.example.com/page",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"].as_str(), Some("validation_error"));
    }

    #[tokio::test]
    async fn carfax_returns_link_and_summary() {
        let server = MockServer::start().await;
        let page = r#"<html><body>
            <a href="/vehicle/carfax?vin=3VV2B7AX8RM012345">View CARFAX</a>
            <div class="carfax-banner">No reported accidents</div>
        </body></html>"#;
        Mock::given(method("GET"))
            .and(path(format!("{LISTING_PATH}/2024-tiguan-id1")))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;

        let detail_url = format!("{}{LISTING_PATH}/2024-tiguan-id1", server.uri());
        let app = test_app(&server);
        let (status, json) =
            get_json(app, &format!("/api/v1/inventory/carfax?url={detail_url}")).await;

        assert_eq!(status, StatusCode::OK);
        assert!(json["data"]["carfax_url"]
            .as_str()
            .is_some_and(|u| u.contains("carfax")));
        assert_eq!(
            json["data"]["summary"].as_str(),
            Some("No reported accidents")
        );
    }

    #[tokio::test]
    async fn rate_limit_ceiling_comes_from_config() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LISTING_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let mut config = test_config(&server.uri());
        config.rate_limit_per_minute = 1;
        let config = Arc::new(config);
        let client = Arc::new(SiteClient::from_config(&config).expect("client"));
        let state = AppState {
            client,
            cache: SearchCache::new(Duration::from_secs(60), 8),
            config: Arc::clone(&config),
        };
        let app = build_app(state, rate_limit_state(&config));

        let (first, _) = get_json(app.clone(), "/api/v1/inventory/debug?text=x").await;
        assert_eq!(first, StatusCode::OK);

        let (second, json) = get_json(app, "/api/v1/inventory/debug?text=x").await;
        assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["error"]["code"].as_str(), Some("rate_limited"));
    }

    #[tokio::test]
    async fn debug_reports_upstream_status_and_digest() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LISTING_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<a href="{LISTING_PATH}/2024-tiguan-id1">View</a>"#
            )))
            .mount(&server)
            .await;

        let app = test_app(&server);
        let (status, json) = get_json(app, "/api/v1/inventory/debug?text=tiguan").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"].as_i64(), Some(200));
        assert_eq!(json["data"]["has_detail_links"].as_bool(), Some(true));
        assert!(json["data"]["length"].as_i64().is_some_and(|n| n > 0));
        assert_eq!(
            json["data"]["sha256"].as_str().map(str::len),
            Some(64),
            "digest is hex-encoded sha-256"
        );
    }
}
