use super::session_cache::{CacheKey, SessionCache};
use crate::domain::errors::SessionDataError;
use crate::domain::ports::{SessionDataProvider, TelemetryProvider};
use crate::domain::session::{EventInfo, RaceRound, SessionKind, SessionTable};
use crate::domain::telemetry::LapTelemetry;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Bounds one upstream call, mapping an elapsed deadline to `Timeout`.
async fn with_timeout<T, Fut>(context: String, limit: Duration, fut: Fut) -> Result<T, SessionDataError>
where
    Fut: Future<Output = Result<T, SessionDataError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!("Upstream request for {} timed out after {:?}", context, limit);
            Err(SessionDataError::Timeout {
                context,
                duration_ms: limit.as_millis() as u64,
            })
        }
    }
}

/// Session provider decorator adding the read-through cache and a deadline.
pub struct CachedSessionProvider<P> {
    inner: P,
    cache: Arc<SessionCache>,
    timeout: Duration,
}

impl<P: SessionDataProvider> CachedSessionProvider<P> {
    pub fn new(inner: P, cache: Arc<SessionCache>, timeout: Duration) -> Self {
        Self {
            inner,
            cache,
            timeout,
        }
    }

    pub fn cache(&self) -> &Arc<SessionCache> {
        &self.cache
    }
}

#[async_trait]
impl<P: SessionDataProvider> SessionDataProvider for CachedSessionProvider<P> {
    async fn get_schedule(&self, year: i32) -> Result<Vec<EventInfo>, SessionDataError> {
        let key = CacheKey::Schedule { year };
        self.cache
            .get_or_fetch(key, || {
                with_timeout(key.to_string(), self.timeout, self.inner.get_schedule(year))
            })
            .await
    }

    async fn get_session_results(
        &self,
        round: RaceRound,
        kind: SessionKind,
    ) -> Result<SessionTable, SessionDataError> {
        let key = CacheKey::Session { round, kind };
        self.cache
            .get_or_fetch(key, || {
                with_timeout(
                    key.to_string(),
                    self.timeout,
                    self.inner.get_session_results(round, kind),
                )
            })
            .await
    }
}

/// Telemetry provider decorator sharing the same cache.
pub struct CachedTelemetryProvider<P> {
    inner: P,
    cache: Arc<SessionCache>,
    timeout: Duration,
}

impl<P: TelemetryProvider> CachedTelemetryProvider<P> {
    pub fn new(inner: P, cache: Arc<SessionCache>, timeout: Duration) -> Self {
        Self {
            inner,
            cache,
            timeout,
        }
    }
}

#[async_trait]
impl<P: TelemetryProvider> TelemetryProvider for CachedTelemetryProvider<P> {
    async fn fastest_lap_telemetry(&self, round: RaceRound) -> Result<LapTelemetry, SessionDataError> {
        let key = CacheKey::FastestLap { round };
        self.cache
            .get_or_fetch(key, || {
                // Telemetry pulls several paged endpoints, so it gets a wider window.
                with_timeout(
                    key.to_string(),
                    self.timeout * 4,
                    self.inner.fastest_lap_telemetry(round),
                )
            })
            .await
    }
}
