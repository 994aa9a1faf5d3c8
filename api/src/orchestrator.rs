use crate::client::{SourceError, SourceResult};
use crate::sources::SourceAdapter;
use crate::store::StateStore;
use crate::{GameType, Slate, SourcePreference, SourceTier};
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Where an acquired slate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Cache(SourceTier),
    Live(SourceTier),
    Persisted,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Cache(tier) => write!(f, "{tier} (cached)"),
            Origin::Live(tier) => write!(f, "{tier}"),
            Origin::Persisted => f.write_str("saved state"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    Unavailable(String),
    Incomplete { game_count: usize },
}

/// One tier that did not yield an authoritative slate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierFailure {
    pub tier: SourceTier,
    pub reason: FailureReason,
}

impl fmt::Display for TierFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            FailureReason::Unavailable(msg) => write!(f, "{}: unavailable ({msg})", self.tier),
            FailureReason::Incomplete { game_count } => {
                write!(f, "{}: incomplete ({game_count} games)", self.tier)
            }
        }
    }
}

/// Attached when every live tier failed and the last saved slate was served.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaleDataWarning {
    pub saved_at: DateTime<Utc>,
    pub attempts: Vec<TierFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Acquired {
    pub slate: Slate,
    pub origin: Origin,
    pub warning: Option<StaleDataWarning>,
}

#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error("No data available for {game_type}: {}", describe(.attempts))]
    NoDataAvailable {
        game_type: GameType,
        attempts: Vec<TierFailure>,
    },
}

fn describe(attempts: &[TierFailure]) -> String {
    if attempts.is_empty() {
        return "no sources in scope".to_owned();
    }
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone)]
struct CachedSlate {
    slate: Slate,
    cached_at: Instant,
}

/// Walks the source tiers in priority order until one yields a full 14-game
/// slate, caching and persisting it. When every tier fails the last saved
/// slate is served with a warning.
pub struct FallbackOrchestrator {
    sources: Vec<Arc<dyn SourceAdapter>>,
    store: StateStore,
    cache: Mutex<HashMap<(GameType, SourceTier), CachedSlate>>,
    cache_ttl: Duration,
}

impl FallbackOrchestrator {
    pub fn new(sources: Vec<Arc<dyn SourceAdapter>>, store: StateStore) -> Self {
        Self {
            sources,
            store,
            cache: Mutex::new(HashMap::new()),
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    fn source(&self, tier: SourceTier) -> Option<&Arc<dyn SourceAdapter>> {
        self.sources.iter().find(|s| s.tier() == tier)
    }

    pub async fn acquire(
        &self,
        game_type: GameType,
        force_refresh: bool,
        preference: SourcePreference,
    ) -> Result<Acquired, AcquireError> {
        let tiers = preference.tiers();

        if !force_refresh {
            if let Some((tier, slate)) = self.cached(game_type, &tiers).await {
                debug!("{game_type}: serving cached slate from {tier}");
                return Ok(Acquired {
                    slate,
                    origin: Origin::Cache(tier),
                    warning: None,
                });
            }
        }

        let mut attempts = Vec::new();
        for tier in tiers {
            let slate = match self.fetch_tier(game_type, tier, force_refresh).await {
                Ok(slate) => slate,
                Err(e) => {
                    warn!("{game_type}: {tier} unavailable: {e}");
                    attempts.push(TierFailure {
                        tier,
                        reason: FailureReason::Unavailable(e.to_string()),
                    });
                    continue;
                }
            };

            if !slate.is_authoritative() {
                warn!(
                    "{game_type}: {tier} returned {} games, moving on",
                    slate.info.game_count
                );
                attempts.push(TierFailure {
                    tier,
                    reason: FailureReason::Incomplete {
                        game_count: slate.info.game_count,
                    },
                });
                continue;
            }

            info!(
                "{game_type}: round {} acquired from {tier}",
                slate.info.round_number
            );
            self.cache.lock().await.insert(
                (game_type, tier),
                CachedSlate {
                    slate: slate.clone(),
                    cached_at: Instant::now(),
                },
            );
            if let Err(e) = self.store.save(&slate).await {
                error!("{game_type}: failed to persist round {}: {e}", slate.info.round_number);
            }
            return Ok(Acquired {
                slate,
                origin: Origin::Live(tier),
                warning: None,
            });
        }

        self.fall_back_to_saved(game_type, attempts).await
    }

    /// One tier, bypassing the cache and the 14-game check. A tier with no
    /// registered adapter is reported as unavailable.
    pub async fn fetch_tier(
        &self,
        game_type: GameType,
        tier: SourceTier,
        force_refresh: bool,
    ) -> SourceResult<Slate> {
        let source = self
            .source(tier)
            .ok_or_else(|| SourceError::Other(format!("no adapter registered for {tier}")))?;
        source.fetch(game_type, force_refresh).await
    }

    /// Round number of the last persisted slate.
    pub async fn last_round(&self, game_type: GameType) -> Option<u32> {
        match self.store.load(game_type).await {
            Ok(saved) => saved.map(|p| p.round_info.round_number),
            Err(e) => {
                warn!("{game_type}: could not read saved state: {e}");
                None
            }
        }
    }

    /// Force a fresh acquisition and report the round number when it is newer
    /// than the saved one. With nothing saved yet, any acquired round is new.
    pub async fn check_new_round(&self, game_type: GameType) -> Option<u32> {
        let previous = self.last_round(game_type).await;
        let acquired = match self.acquire(game_type, true, SourcePreference::Auto).await {
            Ok(acquired) => acquired,
            Err(e) => {
                warn!("{game_type}: new-round check failed: {e}");
                return None;
            }
        };

        let current = acquired.slate.info.round_number;
        match previous {
            Some(prev) if current <= prev => {
                debug!("{game_type}: still on round {prev}");
                None
            }
            _ => {
                info!("{game_type}: new round {current} (was {previous:?})");
                Some(current)
            }
        }
    }

    pub async fn invalidate(&self, game_type: GameType) {
        self.cache.lock().await.retain(|(gt, _), _| *gt != game_type);
    }

    async fn cached(&self, game_type: GameType, tiers: &[SourceTier]) -> Option<(SourceTier, Slate)> {
        let cache = self.cache.lock().await;
        tiers.iter().find_map(|tier| {
            cache
                .get(&(game_type, *tier))
                .filter(|entry| entry.cached_at.elapsed() < self.cache_ttl)
                .map(|entry| (*tier, entry.slate.clone()))
        })
    }

    async fn fall_back_to_saved(
        &self,
        game_type: GameType,
        attempts: Vec<TierFailure>,
    ) -> Result<Acquired, AcquireError> {
        match self.store.load(game_type).await {
            Ok(Some(saved)) => {
                let slate = saved.to_slate();
                if slate.is_authoritative() {
                    warn!(
                        "{game_type}: all sources failed, serving round {} saved at {}",
                        slate.info.round_number, saved.saved_at
                    );
                    return Ok(Acquired {
                        slate,
                        origin: Origin::Persisted,
                        warning: Some(StaleDataWarning {
                            saved_at: saved.saved_at,
                            attempts,
                        }),
                    });
                }
                warn!("{game_type}: saved state is not a full slate, ignoring it");
            }
            Ok(None) => debug!("{game_type}: no saved state"),
            Err(e) => warn!("{game_type}: could not read saved state: {e}"),
        }

        error!("{game_type}: no data available from any source");
        Err(AcquireError::NoDataAvailable { game_type, attempts })
    }
}
