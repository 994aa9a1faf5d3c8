use log::warn;
use slate_api::sources::{KspoConfig, SourcesConfig, betman, kspo, wisetoto, zentoto};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_STATE_DIR: &str = ".state";
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_KSPO_DAYS_AHEAD: u32 = 14;

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub state_dir: PathBuf,
    pub cache_ttl: Duration,
    pub sources: SourcesConfig,
}

impl AppSettings {
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset or blank keys take the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
        let string_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_owned());

        let cache_ttl_secs = parsed_or(get("SLATE_CACHE_TTL_SECS"), "SLATE_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS);
        let days_ahead = parsed_or(get("KSPO_DAYS_AHEAD"), "KSPO_DAYS_AHEAD", DEFAULT_KSPO_DAYS_AHEAD);

        Self {
            state_dir: PathBuf::from(string_or("SLATE_STATE_DIR", DEFAULT_STATE_DIR)),
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            sources: SourcesConfig {
                betman_base_url: string_or("BETMAN_BASE_URL", betman::DEFAULT_BASE_URL),
                wisetoto_base_url: string_or("WISETOTO_BASE_URL", wisetoto::DEFAULT_BASE_URL),
                zentoto_base_url: string_or("ZENTOTO_BASE_URL", zentoto::DEFAULT_BASE_URL),
                kspo: KspoConfig {
                    base_url: string_or("KSPO_API_BASE_URL", kspo::DEFAULT_BASE_URL),
                    service_key: get("KSPO_API_KEY").unwrap_or_default(),
                    days_ahead,
                    ..KspoConfig::default()
                },
                ..SourcesConfig::default()
            },
        }
    }
}

fn parsed_or<T: FromStr + Copy>(value: Option<String>, key: &str, default: T) -> T {
    match value {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("ignoring {key}={raw}: not a number");
            default
        }),
    }
}
