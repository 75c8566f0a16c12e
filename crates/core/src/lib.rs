pub mod catalog;
pub mod config;
pub mod metrics;
pub mod provider;
pub mod sync;
pub mod testing;

pub use catalog::{CatalogError, CatalogSession, CatalogShow, CatalogStore, SqliteCatalogStore};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    ProviderConfig, SyncConfig,
};
pub use provider::{EpisodateClient, EpisodateConfig, ProviderError, ShowProvider};
pub use sync::{
    CycleConfig, CycleOutcome, CycleRunner, SchedulerConfig, SchedulerStatus, SyncError,
    SyncScheduler,
};
