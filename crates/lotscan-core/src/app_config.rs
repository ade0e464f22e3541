use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Scheme+host of the dealership site, e.g. `https://www.barrhavenvw.ca`.
    pub base_origin: String,
    /// Path of the used-inventory listing page, e.g. `/en/used-inventory`.
    pub listing_path: String,
    /// Origin allowed by CORS; `None` means any origin.
    pub allowed_origin: Option<String>,
    pub fetch_timeout_secs: u64,
    pub fetch_user_agent: String,
    pub render_timeout_secs: u64,
    pub render_settle_ms: u64,
    pub cache_ttl_secs: u64,
    pub cache_max_entries: usize,
    /// Upper bound on candidate URLs enriched per search request.
    pub enrich_limit: usize,
    /// API request ceiling per one-minute window.
    pub rate_limit_per_minute: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("base_origin", &self.base_origin)
            .field("listing_path", &self.listing_path)
            .field("allowed_origin", &self.allowed_origin)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("fetch_user_agent", &self.fetch_user_agent)
            .field("render_timeout_secs", &self.render_timeout_secs)
            .field("render_settle_ms", &self.render_settle_ms)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("cache_max_entries", &self.cache_max_entries)
            .field("enrich_limit", &self.enrich_limit)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .finish()
    }
}
