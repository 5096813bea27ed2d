pub mod cached_provider;
pub mod session_cache;

pub use cached_provider::{CachedSessionProvider, CachedTelemetryProvider};
pub use session_cache::{CacheKey, SessionCache};
