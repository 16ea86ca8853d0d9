// Travel-planning data layer for Brazilian destinations

// Shared plumbing
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod gate;
pub mod http;
pub mod sourced;
pub mod store;

// Provider wrappers
pub mod countries;
pub mod holidays;
pub mod localities;
pub mod postal;
pub mod weather;

pub mod app;
pub mod destinations;
pub mod fuzzy;

// Re-export key types for convenience
pub use app::App;
pub use cache::{CacheConfig, CacheStats, TimedCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AppConfig;
pub use error::{ApiError, ConfigError, InitError, StoreError};
pub use gate::{GateConfig, GateStatus, RequestGate};
pub use http::{Fetch, ReqwestFetcher};
pub use sourced::Sourced;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
