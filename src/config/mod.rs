//! Configuration layer for wa-relay.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - Values explicitly passed via command line
//! 2. **TOML config file** - Values from the configuration file
//! 3. **Built-in defaults** - Hardcoded default values
//!
//! The webhook URL list is required. CLI `--webhook` values **replace** the
//! TOML `urls` list entirely (not merged).
//!
//! # Boolean Flag Semantics
//!
//! `--strict-status` uses OR semantics: if set `true` in either CLI or TOML,
//! the result is `true`. Flags only enable, never disable.
//!
//! # CLI-Only vs TOML-Only Options
//!
//! Some retry policy options are TOML-only (not available via CLI):
//! - `retry.max_delay` (default: 60s) - Maximum retry delay
//! - `retry.multiplier` (default: 2.0) - Exponential backoff multiplier

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;

#[cfg(test)]
mod validated_tests;

pub use cli::{Cli, Command, FanOutArg};
pub use error::{ConfigError, field};
pub use toml::{RetrySection, TomlConfig, WebhookSection, WhatsAppSection, default_config_template};
pub use validated::{ValidatedConfig, write_default_config};
