use dotenv::dotenv;
use log::warn;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::api_connection::endpoints::{DEFAULT_PROXIES, FDC_DEMO_KEY, FDC_SEARCH_URL};
use crate::search::sheet_cache::{DEFAULT_SHEET_RETRY, DEFAULT_SHEET_TTL};

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub fdc_api_key: String,
    pub fdc_search_url: String,
    pub proxy_urls: Vec<String>,
    pub sheet_url: Option<String>,
    /// Local CSV export of the reference sheet; wins over `sheet_url`.
    pub sheet_path: Option<PathBuf>,
    pub http_timeout: Duration,
    pub sheet_cache_ttl: Duration,
    /// How long a failed sheet download is reported before trying again.
    pub sheet_retry_after: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fdc_api_key: FDC_DEMO_KEY.to_string(),
            fdc_search_url: FDC_SEARCH_URL.to_string(),
            proxy_urls: DEFAULT_PROXIES.iter().map(|p| p.to_string()).collect(),
            sheet_url: None,
            sheet_path: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            sheet_cache_ttl: DEFAULT_SHEET_TTL,
            sheet_retry_after: DEFAULT_SHEET_RETRY,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let proxy_urls = get("RECIPE_PROXY_URLS")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.proxy_urls);

        Self {
            fdc_api_key: get("FDC_API_KEY").unwrap_or(defaults.fdc_api_key),
            fdc_search_url: get("FDC_SEARCH_URL").unwrap_or(defaults.fdc_search_url),
            proxy_urls,
            sheet_url: get("NUTRITION_SHEET_URL"),
            sheet_path: get("NUTRITION_SHEET_PATH").map(PathBuf::from),
            http_timeout: seconds(get("HTTP_TIMEOUT_SECS"), "HTTP_TIMEOUT_SECS", defaults.http_timeout),
            sheet_cache_ttl: seconds(
                get("SHEET_CACHE_TTL_SECS"),
                "SHEET_CACHE_TTL_SECS",
                defaults.sheet_cache_ttl,
            ),
            sheet_retry_after: seconds(
                get("SHEET_RETRY_SECS"),
                "SHEET_RETRY_SECS",
                defaults.sheet_retry_after,
            ),
        }
    }
}

fn seconds(value: Option<String>, key: &str, default: Duration) -> Duration {
    match value {
        None => default,
        Some(raw) => match raw.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!("Ignoring {}={:?}: not a whole number of seconds", key, raw);
                default
            }
        },
    }
}
