//! Configuration loading, validation, and env substitution.
//!
//! Config file: `relaymesh.toml`, searched in `./` then
//! `~/.config/relaymesh/`. Supports `${ENV_VAR}` substitution in all
//! string values. CLI flags and environment variables (§6) always take
//! precedence over the file — it only supplies defaults.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use loader::{config_dir, discover_gateway_config, discover_worker_config};
pub use schema::{CommonConfig, GatewayConfig, StoreConfig, WorkerConfig};
pub use validate::{validate_gateway, validate_worker, Diagnostic, Severity, ValidationResult};
