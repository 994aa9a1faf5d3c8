pub mod betman;
pub mod kspo;
pub mod wisetoto;
pub mod zentoto;

pub use betman::BetmanSource;
pub use kspo::{KspoConfig, KspoSource};
pub use wisetoto::WisetotoSource;
pub use zentoto::ZentotoSource;

use crate::client::SourceResult;
use crate::{GameType, RoundInfo, RoundStatus, Slate, SourceTier};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Default per-request timeout for the scraped pages.
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(30);
/// Default per-request timeout for the public API.
pub const API_TIMEOUT: Duration = Duration::from_secs(15);

/// One tier of the fallback chain. Implementations hold no state between calls
/// and know nothing of each other; a short slate is still a successful fetch.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn tier(&self) -> SourceTier;

    async fn fetch(&self, game_type: GameType, force_refresh: bool) -> SourceResult<Slate>;
}

/// Endpoints and timeouts for the full set of adapters.
#[derive(Debug, Clone)]
pub struct SourcesConfig {
    pub betman_base_url: String,
    pub wisetoto_base_url: String,
    pub zentoto_base_url: String,
    pub page_timeout: Duration,
    pub kspo: KspoConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            betman_base_url: betman::DEFAULT_BASE_URL.to_owned(),
            wisetoto_base_url: wisetoto::DEFAULT_BASE_URL.to_owned(),
            zentoto_base_url: zentoto::DEFAULT_BASE_URL.to_owned(),
            page_timeout: PAGE_TIMEOUT,
            kspo: KspoConfig::default(),
        }
    }
}

/// Every adapter, in priority order.
pub fn default_sources(config: &SourcesConfig) -> Vec<Arc<dyn SourceAdapter>> {
    vec![
        Arc::new(BetmanSource::new(&config.betman_base_url, config.page_timeout)),
        Arc::new(WisetotoSource::new(&config.wisetoto_base_url, config.page_timeout)),
        Arc::new(ZentotoSource::new(&config.zentoto_base_url, config.page_timeout)),
        Arc::new(KspoSource::new(config.kspo.clone())),
    ]
}

/// Header shared by the adapters; `Slate::new` fills in the game count.
pub(crate) fn round_info(
    game_type: GameType,
    tier: SourceTier,
    round_number: u32,
    match_date: NaiveDate,
    deadline: Option<NaiveDateTime>,
    status: RoundStatus,
) -> RoundInfo {
    RoundInfo {
        round_number,
        game_type,
        source_tier: tier,
        match_date: ymd_string(match_date),
        deadline,
        status,
        game_count: 0,
        fetched_at: Utc::now(),
    }
}

pub(crate) fn ymd_string(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
