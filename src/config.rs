use std::path::PathBuf;

use crate::error::ConfigError;

/// Runtime configuration for the engine and its binaries
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub api_key: String,
    /// Places web service base URL; `None` means the public endpoint
    pub base_url: Option<String>,
    pub db_path: String,
    pub cache_ttl_hours: i64,
    pub search_radius_m: u32,
    pub language: String,
    /// Nearby results below this count trigger the text-search fallback
    pub min_nearby_results: usize,
    /// Outranking competitors shown in a report
    pub display_limit: usize,
    /// Custom rule table; `None` uses the builtin table
    pub rules_path: Option<PathBuf>,
    pub port: u16,
}

/// Load configuration from the environment, reading `.env` first if present.
///
/// # Errors
///
/// Returns `ConfigError` if `PLACES_API_KEY` is missing or a value does not parse.
pub fn load_config() -> Result<EngineConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_config_from_env()
}

/// Like [`load_config`] but without touching `.env` files.
pub fn load_config_from_env() -> Result<EngineConfig, ConfigError> {
    build_config(|key| std::env::var(key))
}

/// Parse configuration from an arbitrary lookup, so tests can feed a map
/// instead of mutating the process environment.
pub fn build_config<F>(lookup: F) -> Result<EngineConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let optional = |var: &str| -> Option<String> { lookup(var).ok().filter(|v| !v.trim().is_empty()) };

    let or_default = |var: &str, default: &str| -> String { optional(var).unwrap_or_else(|| default.to_string()) };

    fn parse<T: std::str::FromStr>(var: &str, raw: String) -> Result<T, ConfigError>
    where
        T::Err: std::fmt::Display,
    {
        raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    }

    let cache_ttl_hours: i64 = parse("PLACERANK_CACHE_TTL_HOURS", or_default("PLACERANK_CACHE_TTL_HOURS", "24"))?;
    if cache_ttl_hours < 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "PLACERANK_CACHE_TTL_HOURS".to_string(),
            reason: "must not be negative".to_string(),
        });
    }
    if chrono::Duration::try_hours(cache_ttl_hours).is_none() {
        return Err(ConfigError::InvalidEnvVar {
            var: "PLACERANK_CACHE_TTL_HOURS".to_string(),
            reason: "out of range".to_string(),
        });
    }

    let display_limit: usize = parse("PLACERANK_DISPLAY_LIMIT", or_default("PLACERANK_DISPLAY_LIMIT", "7"))?;

    Ok(EngineConfig {
        api_key: require("PLACES_API_KEY")?,
        base_url: optional("PLACES_BASE_URL"),
        db_path: or_default("PLACERANK_DB", "placerank.db"),
        cache_ttl_hours,
        search_radius_m: parse("PLACERANK_RADIUS_M", or_default("PLACERANK_RADIUS_M", "10000"))?,
        language: or_default("PLACERANK_LANGUAGE", "it"),
        min_nearby_results: parse("PLACERANK_MIN_NEARBY", or_default("PLACERANK_MIN_NEARBY", "1"))?,
        display_limit,
        rules_path: optional("PLACERANK_RULES").map(PathBuf::from),
        port: parse("PORT", or_default("PORT", "8090"))?,
    })
}
