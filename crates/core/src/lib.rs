pub mod cache;
pub mod config;
pub mod executor;
pub mod issue;
pub mod modules;
pub mod registry;
pub mod testing;
pub mod tracker;

pub use cache::RunCaches;
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use executor::{ExecutionResult, Executor, FailureTracker, UpdateContext};
pub use issue::{Issue, Timeframe};
pub use registry::{build_registries, ModuleRegistry, TriageModule};
pub use tracker::{JiraTracker, TrackerApi, TrackerError};
