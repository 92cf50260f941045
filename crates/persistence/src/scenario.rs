//! Scenario persistence: remote store with a local JSON cache fallback.

use async_trait::async_trait;
use nego_core::{Provenance, ScenarioState};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

/// Slug under which the single dashboard scenario is stored.
pub const SCENARIO_SLUG: &str = "executive-pro";

/// Errors from scenario load/save. Callers treat these as non-fatal.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status: {0}")]
    Status(u16),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Persisted scenario record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub slug: String,
    pub payload: ScenarioState,
    pub updated_at: String,
}

impl ScenarioRecord {
    fn now(state: &ScenarioState) -> Self {
        Self {
            slug: SCENARIO_SLUG.to_string(),
            payload: state.clone(),
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Seam for scenario persistence backends.
#[async_trait]
pub trait ScenarioStore: Send + Sync {
    async fn load(&self) -> Result<Option<ScenarioState>, StoreError>;
    async fn save(&self, state: &ScenarioState) -> Result<(), StoreError>;
}

/// Supabase-style REST store, keyed by the scenario slug.
pub struct RemoteScenarioStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl RemoteScenarioStore {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            table: "scenarios".to_string(),
        }
    }
}

#[async_trait]
impl ScenarioStore for RemoteScenarioStore {
    async fn load(&self) -> Result<Option<ScenarioState>, StoreError> {
        let url = format!(
            "{}/rest/v1/{}?slug=eq.{SCENARIO_SLUG}&select=payload,updated_at&limit=1",
            self.base_url, self.table
        );
        let response = self
            .http
            .get(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(StoreError::Status(response.status().as_u16()));
        }
        #[derive(Deserialize)]
        struct Row {
            payload: ScenarioState,
        }
        let rows: Vec<Row> = response.json().await?;
        Ok(rows.into_iter().next().map(|row| row.payload))
    }

    async fn save(&self, state: &ScenarioState) -> Result<(), StoreError> {
        let url = format!(
            "{}/rest/v1/{}?on_conflict=slug",
            self.base_url, self.table
        );
        let response = self
            .http
            .post(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "resolution=merge-duplicates")
            .json(&[ScenarioRecord::now(state)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(StoreError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

/// JSON cache file, the local-storage equivalent for headless runs.
pub struct FileScenarioStore {
    path: PathBuf,
}

impl FileScenarioStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ScenarioStore for FileScenarioStore {
    async fn load(&self) -> Result<Option<ScenarioState>, StoreError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record: ScenarioRecord = serde_json::from_str(&text)?;
        Ok(Some(record.payload))
    }

    async fn save(&self, state: &ScenarioState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let text = serde_json::to_string_pretty(&ScenarioRecord::now(state))?;
        tokio::fs::write(&self.path, text).await?;
        Ok(())
    }
}

/// Remote store backed by a local cache.
///
/// Saves try the remote first and degrade to the cache with a warning;
/// loads prefer the remote copy and report where the record came from.
pub struct TieredScenarioStore<R, C> {
    remote: Option<R>,
    cache: C,
}

impl<R: ScenarioStore, C: ScenarioStore> TieredScenarioStore<R, C> {
    pub fn new(remote: Option<R>, cache: C) -> Self {
        Self { remote, cache }
    }

    /// Load the latest scenario, if any backend has one.
    pub async fn load(&self) -> Option<(ScenarioState, Provenance)> {
        if let Some(remote) = &self.remote {
            match remote.load().await {
                Ok(Some(state)) => return Some((state, Provenance::Live)),
                Ok(None) => {}
                Err(err) => warn!(%err, "remote scenario load failed, trying cache"),
            }
        }
        match self.cache.load().await {
            Ok(Some(state)) => Some((state, Provenance::Cached)),
            Ok(None) => None,
            Err(err) => {
                warn!(%err, "cached scenario unreadable, starting from defaults");
                None
            }
        }
    }

    /// Persist the scenario best-effort. An error here means both backends
    /// failed; callers surface it as a warning, not a blocking error.
    pub async fn save(&self, state: &ScenarioState) -> Result<(), StoreError> {
        if let Some(remote) = &self.remote {
            match remote.save(state).await {
                Ok(()) => return Ok(()),
                Err(err) => warn!(%err, "remote scenario save failed, caching locally"),
            }
        }
        self.cache.save(state).await?;
        info!("scenario cached locally");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn file_store_roundtrips_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileScenarioStore::new(dir.path().join("cache").join("scenario.json"));
        assert!(store.load().await.unwrap().is_none());

        let mut state = ScenarioState::default();
        state.leads = 12_345;
        store.save(&state).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, state);
    }

    struct StubStore {
        fail: bool,
        slot: Mutex<Option<ScenarioState>>,
    }

    impl StubStore {
        fn new(fail: bool, initial: Option<ScenarioState>) -> Self {
            Self {
                fail,
                slot: Mutex::new(initial),
            }
        }
    }

    #[async_trait]
    impl ScenarioStore for StubStore {
        async fn load(&self) -> Result<Option<ScenarioState>, StoreError> {
            if self.fail {
                return Err(StoreError::Status(503));
            }
            Ok(self.slot.lock().unwrap().clone())
        }

        async fn save(&self, state: &ScenarioState) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Status(503));
            }
            *self.slot.lock().unwrap() = Some(state.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn save_falls_back_to_cache_when_remote_fails() {
        let store = TieredScenarioStore::new(
            Some(StubStore::new(true, None)),
            StubStore::new(false, None),
        );
        store.save(&ScenarioState::default()).await.unwrap();
        let (_, provenance) = store.load().await.unwrap();
        assert_eq!(provenance, Provenance::Cached);
    }

    #[tokio::test]
    async fn load_prefers_remote_copy() {
        let mut remote_state = ScenarioState::default();
        remote_state.leads = 99;
        let store = TieredScenarioStore::new(
            Some(StubStore::new(false, Some(remote_state.clone()))),
            StubStore::new(false, Some(ScenarioState::default())),
        );
        let (state, provenance) = store.load().await.unwrap();
        assert_eq!(provenance, Provenance::Live);
        assert_eq!(state, remote_state);
    }

    #[tokio::test]
    async fn load_returns_none_when_all_backends_are_empty() {
        let store: TieredScenarioStore<StubStore, StubStore> =
            TieredScenarioStore::new(None, StubStore::new(false, None));
        assert!(store.load().await.is_none());
    }
}
