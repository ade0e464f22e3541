use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a configured value fails to parse.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a configured value fails to parse.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The parsing/validation core is decoupled from the actual environment so it
/// can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let env = parse_environment(&or_default("LOTSCAN_ENV", "development"));
    let bind_addr = parse_addr("LOTSCAN_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("LOTSCAN_LOG_LEVEL", "info");

    let base_origin = or_default("LOTSCAN_BASE_ORIGIN", "https://www.barrhavenvw.ca")
        .trim_end_matches('/')
        .to_string();
    let listing_path = or_default("LOTSCAN_LISTING_PATH", "/en/used-inventory");
    if !listing_path.starts_with('/') {
        return Err(ConfigError::InvalidEnvVar {
            var: "LOTSCAN_LISTING_PATH".to_string(),
            reason: "must start with '/'".to_string(),
        });
    }

    let allowed_origin = lookup("LOTSCAN_ALLOWED_ORIGIN")
        .ok()
        .filter(|s| !s.trim().is_empty());

    let fetch_timeout_secs = parse_u64("LOTSCAN_FETCH_TIMEOUT_SECS", "20")?;
    let fetch_user_agent = or_default(
        "LOTSCAN_FETCH_USER_AGENT",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64)",
    );
    let render_timeout_secs = parse_u64("LOTSCAN_RENDER_TIMEOUT_SECS", "45")?;
    let render_settle_ms = parse_u64("LOTSCAN_RENDER_SETTLE_MS", "1500")?;

    let cache_ttl_secs = parse_u64("LOTSCAN_CACHE_TTL_SECS", "1800")?;
    let cache_max_entries = parse_usize("LOTSCAN_CACHE_MAX_ENTRIES", "128")?;
    let enrich_limit = parse_usize("LOTSCAN_ENRICH_LIMIT", "10")?;
    let rate_limit_per_minute = parse_usize("LOTSCAN_RATE_LIMIT_PER_MINUTE", "120")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        base_origin,
        listing_path,
        allowed_origin,
        fetch_timeout_secs,
        fetch_user_agent,
        render_timeout_secs,
        render_settle_ms,
        cache_ttl_secs,
        cache_max_entries,
        enrich_limit,
        rate_limit_per_minute,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn parse_environment_production() {
        assert_eq!(parse_environment("production"), Environment::Production);
    }

    #[test]
    fn parse_environment_unknown_defaults_to_development() {
        assert_eq!(parse_environment("staging"), Environment::Development);
    }

    #[test]
    fn empty_env_yields_all_defaults() {
        let map: HashMap<&str, &str> = HashMap::new();
        let config = build_app_config(lookup_from_map(&map)).expect("defaults should suffice");
        assert_eq!(config.base_origin, "https://www.barrhavenvw.ca");
        assert_eq!(config.listing_path, "/en/used-inventory");
        assert_eq!(config.fetch_timeout_secs, 20);
        assert_eq!(config.cache_ttl_secs, 1800);
        assert_eq!(config.cache_max_entries, 128);
        assert_eq!(config.enrich_limit, 10);
        assert_eq!(config.rate_limit_per_minute, 120);
        assert!(config.allowed_origin.is_none());
    }

    #[test]
    fn base_origin_trailing_slash_is_stripped() {
        let mut map = HashMap::new();
        map.insert("LOTSCAN_BASE_ORIGIN", "https://dealer.example.com/");
        let config = build_app_config(lookup_from_map(&map)).expect("config");
        assert_eq!(config.base_origin, "https://dealer.example.com");
    }

    #[test]
    fn listing_path_without_leading_slash_is_rejected() {
        let mut map = HashMap::new();
        map.insert("LOTSCAN_LISTING_PATH", "used-inventory");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "LOTSCAN_LISTING_PATH"),
            "expected InvalidEnvVar(LOTSCAN_LISTING_PATH), got: {result:?}"
        );
    }

    #[test]
    fn invalid_timeout_names_the_variable() {
        let mut map = HashMap::new();
        map.insert("LOTSCAN_FETCH_TIMEOUT_SECS", "soon");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "LOTSCAN_FETCH_TIMEOUT_SECS"),
            "expected InvalidEnvVar(LOTSCAN_FETCH_TIMEOUT_SECS), got: {result:?}"
        );
    }

    #[test]
    fn blank_allowed_origin_is_treated_as_unset() {
        let mut map = HashMap::new();
        map.insert("LOTSCAN_ALLOWED_ORIGIN", "  ");
        let config = build_app_config(lookup_from_map(&map)).expect("config");
        assert!(config.allowed_origin.is_none());
    }
}
