//! Configuration module for classroom-sync.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - CLI argument parsing and merging
//! - Configuration validation

pub mod loader;
pub mod modes;
pub mod validation;

pub use loader::{AuthConfig, Config, OptionsConfig, RetryConfig};
pub use modes::SyncPolicy;
pub use validation::{validate_config, validate_remote_id};
