use crate::config::CacheEnvConfig;
use crate::domain::errors::SessionDataError;
use crate::domain::session::{RaceRound, SessionKind};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, error, trace, warn};

/// Identifies one upstream payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Schedule { year: i32 },
    Session { round: RaceRound, kind: SessionKind },
    FastestLap { round: RaceRound },
}

impl CacheKey {
    /// Location of the entry below the cache directory.
    pub fn relative_path(&self) -> PathBuf {
        match self {
            CacheKey::Schedule { year } => PathBuf::from(year.to_string()).join("schedule.json"),
            CacheKey::Session { round, kind } => PathBuf::from(round.year().to_string())
                .join(format!("{:02}_{}.json", round.round(), kind.as_str())),
            CacheKey::FastestLap { round } => PathBuf::from(round.year().to_string())
                .join(format!("{:02}_fastest_lap.json", round.round())),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Schedule { year } => write!(f, "schedule {}", year),
            CacheKey::Session { round, kind } => write!(f, "{} {}", kind, round),
            CacheKey::FastestLap { round } => write!(f, "fastest lap {}", round),
        }
    }
}

/// Read-through cache for upstream payloads.
///
/// Lookups go memory, then disk (when a directory is configured), then the
/// fetcher. Only successful fetches are stored, so a failed request is
/// retried on the next call.
pub struct SessionCache {
    memory: RwLock<HashMap<CacheKey, serde_json::Value>>,
    directory: Option<PathBuf>,
}

impl SessionCache {
    pub fn in_memory() -> Self {
        Self {
            memory: RwLock::new(HashMap::new()),
            directory: None,
        }
    }

    pub fn with_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            memory: RwLock::new(HashMap::new()),
            directory: Some(directory.into()),
        }
    }

    pub fn from_config(config: &CacheEnvConfig) -> Self {
        match config.disk_directory() {
            Some(dir) => Self::with_directory(dir),
            None => Self::in_memory(),
        }
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Number of entries held in memory.
    pub fn len(&self) -> usize {
        match self.memory.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub async fn get_or_fetch<T, F, Fut>(&self, key: CacheKey, fetch: F) -> Result<T, SessionDataError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, SessionDataError>>,
    {
        if let Some(value) = self.memory_get(&key) {
            match serde_json::from_value::<T>(value) {
                Ok(hit) => {
                    trace!("SessionCache: Cache HIT for {}", key);
                    return Ok(hit);
                }
                Err(e) => warn!("SessionCache: dropping unreadable memory entry {}: {}", key, e),
            }
        }

        if let Some(value) = self.disk_get(&key).await {
            match serde_json::from_value::<T>(value.clone()) {
                Ok(hit) => {
                    debug!("SessionCache: disk HIT for {}", key);
                    self.memory_put(key, value);
                    return Ok(hit);
                }
                Err(e) => warn!("SessionCache: ignoring corrupt disk entry {}: {}", key, e),
            }
        }

        debug!("SessionCache: Cache MISS for {}. Fetching...", key);
        let fetched = fetch().await?;

        match serde_json::to_value(&fetched) {
            Ok(value) => {
                self.disk_put(&key, &value).await;
                self.memory_put(key, value);
            }
            Err(e) => warn!("SessionCache: cannot serialize {}: {}", key, e),
        }

        Ok(fetched)
    }

    fn memory_get(&self, key: &CacheKey) -> Option<serde_json::Value> {
        let cache = match self.memory.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("SessionCache: memory lock poisoned during read, recovering");
                poisoned.into_inner()
            }
        };
        cache.get(key).cloned()
    }

    fn memory_put(&self, key: CacheKey, value: serde_json::Value) {
        let mut cache = match self.memory.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("SessionCache: memory lock poisoned during write, recovering");
                poisoned.into_inner()
            }
        };
        cache.insert(key, value);
    }

    async fn disk_get(&self, key: &CacheKey) -> Option<serde_json::Value> {
        let path = self.directory.as_ref()?.join(key.relative_path());
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("SessionCache: failed to read {}: {}", path.display(), e);
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("SessionCache: corrupt cache file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Disk failures only cost a re-fetch later, so they are logged and swallowed.
    async fn disk_put(&self, key: &CacheKey, value: &serde_json::Value) {
        let Some(directory) = self.directory.as_ref() else {
            return;
        };
        let path = directory.join(key.relative_path());
        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                warn!("SessionCache: cannot create {}: {}", parent.display(), e);
                return;
            }
        }

        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("SessionCache: cannot encode {}: {}", key, e);
                return;
            }
        };

        // Write-then-rename keeps readers from seeing half-written files.
        let tmp = path.with_extension("json.tmp");
        if let Err(e) = tokio::fs::write(&tmp, &bytes).await {
            warn!("SessionCache: failed to write {}: {}", tmp.display(), e);
            return;
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            warn!("SessionCache: failed to persist {}: {}", path.display(), e);
        }
    }
}
