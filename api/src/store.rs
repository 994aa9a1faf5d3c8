use crate::{GameEntry, GameType, RoundInfo, Slate};
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed state file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// On-disk shape of the last authoritative slate for one game type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSlate {
    pub round_info: RoundInfo,
    pub games: Vec<GameEntry>,
    pub saved_at: DateTime<Utc>,
}

impl PersistedSlate {
    pub fn to_slate(&self) -> Slate {
        Slate {
            info: self.round_info.clone(),
            games: self.games.clone(),
        }
    }
}

/// One JSON file per game type under `dir`. Writes go to a sibling temp file
/// and are renamed into place, so readers never see a half-written slate.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, game_type: GameType) -> PathBuf {
        self.dir.join(format!("{}_round.json", game_type.key()))
    }

    pub async fn save(&self, slate: &Slate) -> StoreResult<PersistedSlate> {
        let record = PersistedSlate {
            round_info: slate.info.clone(),
            games: slate.games.clone(),
            saved_at: Utc::now(),
        };
        let path = self.path_for(slate.info.game_type);
        let tmp = path.with_extension("json.tmp");

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StoreError::Io { path: self.dir.clone(), source })?;

        let body = serde_json::to_vec_pretty(&record)
            .map_err(|source| StoreError::Json { path: path.clone(), source })?;
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|source| StoreError::Io { path: tmp.clone(), source })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| StoreError::Io { path: path.clone(), source })?;

        debug!(
            "saved {} round {} to {}",
            slate.info.game_type,
            slate.info.round_number,
            path.display()
        );
        Ok(record)
    }

    /// `Ok(None)` when nothing has been saved yet for `game_type`.
    pub async fn load(&self, game_type: GameType) -> StoreResult<Option<PersistedSlate>> {
        let path = self.path_for(game_type);
        let body = match tokio::fs::read(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|source| StoreError::Json { path, source })
    }
}
