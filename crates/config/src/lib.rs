//! Configuration loading, validation, and env substitution.
//!
//! Config files: `strongroom.toml`, `strongroom.yaml`, `strongroom.yml`, or
//! `strongroom.json`. Searched in `./` then the user config directory
//! (`~/.config/strongroom/` on Linux).
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{config_dir, discover_and_load, find_config_file, load_config},
    schema::{CryptoConfig, StrongroomConfig},
    validate::{Diagnostic, Severity, ValidationResult},
};
