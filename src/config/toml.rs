//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Webhook configuration section
    #[serde(default)]
    pub webhook: WebhookSection,

    /// WhatsApp client configuration section
    #[serde(default)]
    pub whatsapp: WhatsAppSection,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetrySection,
}

/// Webhook configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookSection {
    /// Destination URLs, attempted in order
    #[serde(default)]
    pub urls: Vec<String>,

    /// Secret used to sign payloads
    pub secret: Option<String>,

    /// Per-request timeout in seconds
    pub timeout: Option<u64>,

    /// Treat non-2xx responses as failed deliveries
    #[serde(default)]
    pub strict_status: bool,

    /// Fan-out mode: "fail-fast" or "best-effort"
    pub fan_out: Option<String>,

    /// Maximum number of events forwarded at the same time
    pub max_in_flight: Option<usize>,
}

/// WhatsApp client configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppSection {
    /// Own identity, used to compute `from_me`
    pub own_id: Option<String>,

    /// Directory where media attachments are written
    pub media_path: Option<String>,
}

/// Retry policy configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    /// Maximum number of delivery attempts
    pub max_attempts: Option<u32>,

    /// Initial retry delay in seconds
    pub initial_delay: Option<u64>,

    /// Maximum retry delay in seconds
    pub max_delay: Option<u64>,

    /// Backoff multiplier
    pub multiplier: Option<f64>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# wa-relay Configuration File

[webhook]
# Webhook URLs (required, attempted in order)
# Note: --webhook CLI flags REPLACE this list entirely (not merged)
# urls = ["https://hooks.example.com/whatsapp"]

# Secret used to sign payloads (X-Hub-Signature-256)
# secret = "secret"

# Per-request timeout in seconds (default: 10)
# timeout = 10

# Treat non-2xx responses as failed deliveries (default: false)
# strict_status = false

# What to do when a webhook fails (default: "fail-fast")
# "fail-fast": stop at the first failing webhook
# "best-effort": try every webhook and report all failures
# fan_out = "fail-fast"

# Maximum number of events forwarded at the same time (default: 32)
# max_in_flight = 32

[whatsapp]
# Own identity, used to compute from_me
# own_id = "6281234567890@s.whatsapp.net"

# Directory where media attachments are written (default: statics/media)
# media_path = "statics/media"

[retry]
# Maximum number of delivery attempts (default: 5)
# max_attempts = 5

# Initial retry delay in seconds (default: 1)
# initial_delay = 1

# Maximum retry delay in seconds (default: 60, at most 86400)
# max_delay = 60

# Backoff multiplier (default: 2.0)
# multiplier = 2.0
"#
    .to_string()
}
