//! HTTP client for the target dealership site.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;

use lotscan_core::AppConfig;

use crate::error::ScrapeError;

/// Client for the one configured dealership site.
///
/// Carries browser-like headers (some dealership platforms serve reduced
/// markup to non-browser identification strings), follows redirects, and
/// enforces a fixed per-call timeout so a hung fetch degrades one record
/// instead of stalling the batch.
pub struct SiteClient {
    client: Client,
    base_origin: String,
    listing_path: String,
    #[cfg_attr(not(feature = "render"), allow(dead_code))]
    render_timeout_secs: u64,
    #[cfg_attr(not(feature = "render"), allow(dead_code))]
    render_settle_ms: u64,
}

impl SiteClient {
    /// Creates a `SiteClient` with the given origin, listing path, timeout,
    /// and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        base_origin: &str,
        listing_path: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ScrapeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-CA,en;q=0.9"));

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_origin: base_origin.trim_end_matches('/').to_string(),
            listing_path: listing_path.to_string(),
            render_timeout_secs: 45,
            render_settle_ms: 1500,
        })
    }

    /// Creates a `SiteClient` from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, ScrapeError> {
        let mut site = Self::new(
            &config.base_origin,
            &config.listing_path,
            config.fetch_timeout_secs,
            &config.fetch_user_agent,
        )?;
        site.render_timeout_secs = config.render_timeout_secs;
        site.render_settle_ms = config.render_settle_ms;
        Ok(site)
    }

    #[must_use]
    pub fn base_origin(&self) -> &str {
        &self.base_origin
    }

    #[must_use]
    pub fn listing_path(&self) -> &str {
        &self.listing_path
    }

    /// Builds the upstream listing query URL for a normalized term string.
    #[must_use]
    pub fn listing_url(&self, query: &str) -> String {
        let encoded = utf8_percent_encode(query, NON_ALPHANUMERIC);
        format!(
            "{}{}?text={encoded}",
            self.base_origin, self.listing_path
        )
    }

    /// Fetches a page body, mapping non-success statuses to typed errors.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::UnexpectedStatus`] — any non-2xx status.
    /// - [`ScrapeError::Http`] — network, TLS, or timeout failure.
    pub async fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }
        Ok(response.text().await?)
    }

    /// Fetches a URL without treating non-2xx as an error; used by the
    /// debug surface, which reports whatever the upstream returned.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] on network, TLS, or timeout failure.
    pub async fn fetch_raw(&self, url: &str) -> Result<(u16, String), ScrapeError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }

    /// Fetches the listing page for a query.
    ///
    /// With the `render` feature enabled, a headless-browser fetch runs
    /// first (script-populated listings need it) and any render failure
    /// falls back to the plain fetch, so the caller always receives either
    /// markup or one explicit error.
    ///
    /// # Errors
    ///
    /// Propagates the plain fetch's error when no strategy produced markup.
    pub async fn fetch_listing(&self, query: &str) -> Result<String, ScrapeError> {
        let url = self.listing_url(query);

        #[cfg(feature = "render")]
        {
            match self.fetch_rendered(&url).await {
                Ok(body) => return Ok(body),
                Err(error) => {
                    tracing::warn!(url, error = %error, "render fetch failed; falling back to plain fetch");
                }
            }
        }

        self.fetch_page(&url).await
    }

    #[cfg(feature = "render")]
    async fn fetch_rendered(&self, url: &str) -> Result<String, ScrapeError> {
        let url = url.to_owned();
        let wait_selector = format!("a[href*='{}/']", self.listing_path);
        let timeout_secs = self.render_timeout_secs;
        let settle_ms = self.render_settle_ms;

        let task_url = url.clone();
        tokio::task::spawn_blocking(move || {
            crate::render::render_page(&task_url, timeout_secs, settle_ms, Some(&wait_selector))
        })
        .await
        .map_err(|_| ScrapeError::Render {
            url,
            reason: "render task panicked".to_string(),
        })?
    }
}
