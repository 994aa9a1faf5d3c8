use async_trait::async_trait;
use chrono::Utc;
use slate_api::client::{SourceError, SourceResult};
use slate_api::orchestrator::{AcquireError, FailureReason, FallbackOrchestrator, Origin};
use slate_api::sources::SourceAdapter;
use slate_api::store::StateStore;
use slate_api::{GameEntry, GameType, RoundInfo, RoundStatus, Slate, SourcePreference, SourceTier};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

#[derive(Debug, Clone, Copy)]
enum Behaviour {
    Full,
    Short(u8),
    Fail,
}

struct FakeSource {
    tier: SourceTier,
    behaviour: Behaviour,
    round: AtomicU32,
    calls: AtomicUsize,
}

impl FakeSource {
    fn new(tier: SourceTier, behaviour: Behaviour, round: u32) -> Arc<Self> {
        Arc::new(Self {
            tier,
            behaviour,
            round: AtomicU32::new(round),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceAdapter for FakeSource {
    fn tier(&self) -> SourceTier {
        self.tier
    }

    async fn fetch(&self, game_type: GameType, _force_refresh: bool) -> SourceResult<Slate> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let round = self.round.load(Ordering::SeqCst);
        match self.behaviour {
            Behaviour::Full => Ok(slate(game_type, self.tier, round, 14)),
            Behaviour::Short(n) => Ok(slate(game_type, self.tier, round, n)),
            Behaviour::Fail => Err(SourceError::Other("connection refused".into())),
        }
    }
}

fn slate(game_type: GameType, tier: SourceTier, round: u32, count: u8) -> Slate {
    let info = RoundInfo {
        round_number: round,
        game_type,
        source_tier: tier,
        match_date: "20260110".into(),
        deadline: None,
        status: RoundStatus::Open,
        game_count: 0,
        fetched_at: Utc::now(),
    };
    let games = (1..=count)
        .map(|n| GameEntry {
            game_number: n,
            home_team: format!("홈{n}"),
            away_team: format!("원정{n}"),
            match_date: "20260110".into(),
            match_time: "2130".into(),
            ..Default::default()
        })
        .collect();
    Slate::new(info, games)
}

fn orchestrator(sources: &[Arc<FakeSource>], dir: &TempDir) -> FallbackOrchestrator {
    let sources = sources
        .iter()
        .map(|s| s.clone() as Arc<dyn SourceAdapter>)
        .collect();
    FallbackOrchestrator::new(sources, StateStore::new(dir.path()))
}

fn chain(behaviours: [Behaviour; 4], round: u32) -> Vec<Arc<FakeSource>> {
    SourceTier::PRIORITY
        .into_iter()
        .zip(behaviours)
        .map(|(tier, b)| FakeSource::new(tier, b, round))
        .collect()
}

#[tokio::test]
async fn first_authoritative_tier_short_circuits() {
    let dir = tempfile::tempdir().unwrap();
    let sources = chain([Behaviour::Full; 4], 83);
    let orch = orchestrator(&sources, &dir);

    let acquired = orch.acquire(GameType::SoccerWdl, true, SourcePreference::Auto).await.unwrap();
    assert_eq!(acquired.origin, Origin::Live(SourceTier::Betman));
    assert!(acquired.warning.is_none());
    assert_eq!(sources[0].calls(), 1);
    assert!(sources[1..].iter().all(|s| s.calls() == 0));
}

#[tokio::test]
async fn failing_and_incomplete_tiers_fall_through() {
    let dir = tempfile::tempdir().unwrap();
    let sources = chain(
        [Behaviour::Short(12), Behaviour::Fail, Behaviour::Full, Behaviour::Full],
        83,
    );
    let orch = orchestrator(&sources, &dir);

    let acquired = orch.acquire(GameType::SoccerWdl, true, SourcePreference::Auto).await.unwrap();
    assert_eq!(acquired.origin, Origin::Live(SourceTier::Zentoto));
    assert!(acquired.slate.is_authoritative());
    assert_eq!(acquired.slate.info.round_number, 83);
    assert_eq!(sources[3].calls(), 0);

    // The winning slate is persisted.
    let saved = orch.store().load(GameType::SoccerWdl).await.unwrap().unwrap();
    assert_eq!(saved.round_info.round_number, 83);
    assert_eq!(saved.games.len(), 14);
    assert_eq!(orch.last_round(GameType::SoccerWdl).await, Some(83));
}

#[tokio::test]
async fn forced_refetch_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let sources = chain([Behaviour::Fail, Behaviour::Full, Behaviour::Full, Behaviour::Full], 83);
    let orch = orchestrator(&sources, &dir);

    let a = orch.acquire(GameType::SoccerWdl, true, SourcePreference::Auto).await.unwrap();
    let b = orch.acquire(GameType::SoccerWdl, true, SourcePreference::Auto).await.unwrap();
    assert_eq!(sources[1].calls(), 2);
    assert_eq!(a.origin, b.origin);
    assert_eq!(a.slate.info.round_number, b.slate.info.round_number);
    assert_eq!(a.slate.games, b.slate.games);

    let saved = orch.store().load(GameType::SoccerWdl).await.unwrap().unwrap();
    assert_eq!(saved.games, b.slate.games);
}

#[tokio::test]
async fn cached_slate_is_served_without_network() {
    let dir = tempfile::tempdir().unwrap();
    let sources = chain([Behaviour::Full; 4], 83);
    let orch = orchestrator(&sources, &dir);

    let first = orch.acquire(GameType::SoccerWdl, false, SourcePreference::Auto).await.unwrap();
    let second = orch.acquire(GameType::SoccerWdl, false, SourcePreference::Auto).await.unwrap();

    assert_eq!(first.origin, Origin::Live(SourceTier::Betman));
    assert_eq!(second.origin, Origin::Cache(SourceTier::Betman));
    assert_eq!(first.slate, second.slate);
    assert_eq!(sources[0].calls(), 1);

    orch.acquire(GameType::SoccerWdl, true, SourcePreference::Auto).await.unwrap();
    assert_eq!(sources[0].calls(), 2);
}

#[tokio::test]
async fn expired_cache_refetches() {
    let dir = tempfile::tempdir().unwrap();
    let sources = chain([Behaviour::Full; 4], 83);
    let orch = orchestrator(&sources, &dir).with_cache_ttl(Duration::ZERO);

    orch.acquire(GameType::SoccerWdl, false, SourcePreference::Auto).await.unwrap();
    let again = orch.acquire(GameType::SoccerWdl, false, SourcePreference::Auto).await.unwrap();
    assert_eq!(again.origin, Origin::Live(SourceTier::Betman));
    assert_eq!(sources[0].calls(), 2);
}

#[tokio::test]
async fn invalidate_drops_cached_entries() {
    let dir = tempfile::tempdir().unwrap();
    let sources = chain([Behaviour::Full; 4], 83);
    let orch = orchestrator(&sources, &dir);

    orch.acquire(GameType::SoccerWdl, false, SourcePreference::Auto).await.unwrap();
    orch.invalidate(GameType::SoccerWdl).await;
    let again = orch.acquire(GameType::SoccerWdl, false, SourcePreference::Auto).await.unwrap();
    assert_eq!(again.origin, Origin::Live(SourceTier::Betman));
}

#[tokio::test]
async fn cache_is_kept_per_game_type() {
    let dir = tempfile::tempdir().unwrap();
    let sources = chain([Behaviour::Full; 4], 83);
    let orch = orchestrator(&sources, &dir);

    orch.acquire(GameType::SoccerWdl, false, SourcePreference::Auto).await.unwrap();
    let basketball = orch
        .acquire(GameType::BasketballW5l, false, SourcePreference::Auto)
        .await
        .unwrap();
    assert_eq!(basketball.origin, Origin::Live(SourceTier::Betman));
    assert_eq!(basketball.slate.info.game_type, GameType::BasketballW5l);
}

#[tokio::test]
async fn stale_state_is_served_when_every_tier_fails() {
    let dir = tempfile::tempdir().unwrap();
    let good = chain([Behaviour::Full; 4], 83);
    orchestrator(&good, &dir)
        .acquire(GameType::SoccerWdl, true, SourcePreference::Auto)
        .await
        .unwrap();

    let broken = chain(
        [Behaviour::Fail, Behaviour::Short(12), Behaviour::Fail, Behaviour::Short(13)],
        84,
    );
    let acquired = orchestrator(&broken, &dir)
        .acquire(GameType::SoccerWdl, true, SourcePreference::Auto)
        .await
        .unwrap();

    assert_eq!(acquired.origin, Origin::Persisted);
    assert_eq!(acquired.slate.info.round_number, 83);
    let warning = acquired.warning.unwrap();
    assert_eq!(warning.attempts.len(), 4);
    assert!(matches!(warning.attempts[0].reason, FailureReason::Unavailable(_)));
    assert_eq!(
        warning.attempts[1].reason,
        FailureReason::Incomplete { game_count: 12 }
    );
}

#[tokio::test]
async fn no_state_and_no_sources_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let sources = chain([Behaviour::Fail; 4], 83);
    let err = orchestrator(&sources, &dir)
        .acquire(GameType::SoccerWdl, true, SourcePreference::Auto)
        .await
        .unwrap_err();

    let AcquireError::NoDataAvailable { game_type, attempts } = err;
    assert_eq!(game_type, GameType::SoccerWdl);
    let tiers: Vec<SourceTier> = attempts.iter().map(|a| a.tier).collect();
    assert_eq!(tiers, SourceTier::PRIORITY.to_vec());
}

#[tokio::test]
async fn incomplete_or_corrupt_state_is_never_served() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    store
        .save(&slate(GameType::SoccerWdl, SourceTier::Betman, 83, 12))
        .await
        .unwrap();

    let sources = chain([Behaviour::Fail; 4], 83);
    let orch = orchestrator(&sources, &dir);
    assert!(orch.acquire(GameType::SoccerWdl, true, SourcePreference::Auto).await.is_err());

    std::fs::write(store.path_for(GameType::SoccerWdl), b"not json").unwrap();
    assert!(orch.acquire(GameType::SoccerWdl, true, SourcePreference::Auto).await.is_err());
    assert_eq!(orch.last_round(GameType::SoccerWdl).await, None);
}

#[tokio::test]
async fn pinned_preference_only_touches_that_tier() {
    let dir = tempfile::tempdir().unwrap();
    let sources = chain([Behaviour::Full; 4], 83);
    let orch = orchestrator(&sources, &dir);

    let acquired = orch
        .acquire(
            GameType::SoccerWdl,
            false,
            SourcePreference::Only(SourceTier::KspoApi),
        )
        .await
        .unwrap();
    assert_eq!(acquired.origin, Origin::Live(SourceTier::KspoApi));
    assert_eq!(sources[3].calls(), 1);
    assert!(sources[..3].iter().all(|s| s.calls() == 0));

    // A cached Kspo slate does not leak into a Betman-only request.
    let betman = orch
        .acquire(GameType::SoccerWdl, false, SourcePreference::Only(SourceTier::Betman))
        .await
        .unwrap();
    assert_eq!(betman.origin, Origin::Live(SourceTier::Betman));
}

#[tokio::test]
async fn pinned_tier_without_adapter_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let sources = vec![FakeSource::new(SourceTier::Betman, Behaviour::Full, 83)];
    let err = orchestrator(&sources, &dir)
        .acquire(GameType::SoccerWdl, true, SourcePreference::Only(SourceTier::Zentoto))
        .await
        .unwrap_err();

    let AcquireError::NoDataAvailable { attempts, .. } = err;
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].tier, SourceTier::Zentoto);
    assert!(matches!(attempts[0].reason, FailureReason::Unavailable(_)));
    assert_eq!(sources[0].calls(), 0);
}

#[tokio::test]
async fn new_round_is_reported_once() {
    let dir = tempfile::tempdir().unwrap();
    let sources = chain([Behaviour::Full; 4], 83);
    let orch = orchestrator(&sources, &dir);

    assert_eq!(orch.check_new_round(GameType::SoccerWdl).await, Some(83));
    assert_eq!(orch.check_new_round(GameType::SoccerWdl).await, None);

    sources[0].round.store(84, Ordering::SeqCst);
    assert_eq!(orch.check_new_round(GameType::SoccerWdl).await, Some(84));

    sources[0].round.store(82, Ordering::SeqCst);
    assert_eq!(orch.check_new_round(GameType::SoccerWdl).await, None);
}

#[tokio::test]
async fn distinct_game_types_acquire_concurrently() {
    let dir = tempfile::tempdir().unwrap();
    let sources = chain([Behaviour::Fail, Behaviour::Full, Behaviour::Full, Behaviour::Full], 83);
    let orch = Arc::new(orchestrator(&sources, &dir));

    let (soccer, basketball) = tokio::join!(
        orch.acquire(GameType::SoccerWdl, true, SourcePreference::Auto),
        orch.acquire(GameType::BasketballW5l, true, SourcePreference::Auto),
    );
    assert_eq!(soccer.unwrap().origin, Origin::Live(SourceTier::Wisetoto));
    assert_eq!(basketball.unwrap().origin, Origin::Live(SourceTier::Wisetoto));
    assert!(orch.store().load(GameType::SoccerWdl).await.unwrap().is_some());
    assert!(orch.store().load(GameType::BasketballW5l).await.unwrap().is_some());
}
