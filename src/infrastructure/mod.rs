pub mod cache;
pub mod core;
pub mod jolpica;
pub mod mock;
pub mod openf1;

pub use cache::{CachedSessionProvider, CachedTelemetryProvider, SessionCache};
pub use jolpica::JolpicaSessionProvider;
pub use mock::{MockSessionProvider, MockTelemetryProvider};
pub use openf1::OpenF1TelemetryProvider;
