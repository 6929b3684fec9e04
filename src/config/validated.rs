//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::dispatch::{DispatchConfig, FanOut};
use crate::webhook::{Endpoint, RetryPolicy, redacted_url};

use super::cli::Cli;
use super::defaults;
use super::error::{ConfigError, field};
use super::toml::TomlConfig;

/// Fully validated configuration ready for use by the application.
///
/// This struct represents a complete, validated configuration where all
/// required fields are present and all values have been validated.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Webhook URLs, in delivery order (at least one)
    pub urls: Vec<Url>,

    /// Secret used to sign payloads
    pub secret: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Whether non-2xx responses fail a delivery attempt
    pub strict_status: bool,

    /// Behavior when a webhook fails
    pub fan_out: FanOut,

    /// Own identity, used to compute `from_me`
    pub own_id: String,

    /// Directory where media attachments are written
    pub media_path: PathBuf,

    /// Retry policy for failed webhook requests
    pub retry_policy: RetryPolicy,

    /// Maximum number of events forwarded at the same time
    pub max_in_flight: usize,

    /// File of events to read instead of stdin
    pub input: Option<PathBuf>,

    /// Dry-run mode (log payloads without sending webhooks)
    pub dry_run: bool,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let urls = self
            .urls
            .iter()
            .map(redacted_url)
            .collect::<Vec<_>>()
            .join(", ");
        let input = self
            .input
            .as_ref()
            .map_or_else(|| "stdin".to_string(), |p| p.display().to_string());

        write!(
            f,
            "Config {{ urls: [{urls}], secret: <redacted>, timeout: {}s, strict_status: {}, \
             fan_out: {}, own_id: {}, media_path: {}, retry: {}x/{}s, max_in_flight: {}, input: {input}, dry_run: {} }}",
            self.timeout.as_secs(),
            self.strict_status,
            self.fan_out,
            if self.own_id.is_empty() {
                "none"
            } else {
                self.own_id.as_str()
            },
            self.media_path.display(),
            self.retry_policy.max_attempts,
            self.retry_policy.initial_delay.as_secs(),
            self.max_in_flight,
            self.dry_run,
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No webhook URL is configured
    /// - A URL is invalid or not http(s)
    /// - The timeout is zero
    /// - Retry values are invalid or exceed one day
    /// - The fan-out mode is unknown
    /// - The in-flight limit is zero
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let urls = Self::resolve_urls(cli, toml)?;

        let secret = cli
            .secret
            .clone()
            .or_else(|| toml.and_then(|t| t.webhook.secret.clone()))
            .unwrap_or_else(|| defaults::SECRET.to_string());

        let timeout = Self::resolve_timeout(cli, toml)?;

        // Flags only enable: true in either source wins
        let strict_status = cli.strict_status || toml.is_some_and(|t| t.webhook.strict_status);

        let fan_out = Self::resolve_fan_out(cli, toml)?;

        let own_id = cli
            .own_id
            .clone()
            .or_else(|| toml.and_then(|t| t.whatsapp.own_id.clone()))
            .unwrap_or_default();

        let media_path = Self::resolve_media_path(cli, toml);

        let retry_policy = Self::build_retry_policy(cli, toml)?;

        let max_in_flight = Self::resolve_max_in_flight(cli, toml)?;

        Ok(Self {
            urls,
            secret,
            timeout,
            strict_status,
            fan_out,
            own_id,
            media_path,
            retry_policy,
            max_in_flight,
            input: cli.input.clone(),
            dry_run: cli.dry_run,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    /// Returns the dispatcher configuration derived from this config.
    ///
    /// Every URL shares the configured secret.
    #[must_use]
    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            endpoints: self
                .urls
                .iter()
                .map(|url| Endpoint::new(url.clone(), self.secret.clone()))
                .collect(),
            identity: self.own_id.clone(),
            storage_root: self.media_path.clone(),
            fan_out: self.fan_out,
        }
    }

    fn resolve_urls(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Vec<Url>, ConfigError> {
        // CLI list replaces the TOML list entirely
        let raw: &[String] = if cli.webhooks.is_empty() {
            toml.map(|t| t.webhook.urls.as_slice()).unwrap_or_default()
        } else {
            &cli.webhooks
        };

        if raw.is_empty() {
            return Err(ConfigError::missing(
                field::URLS,
                "Use --webhook or set webhook.urls in config file",
            ));
        }

        raw.iter().map(String::as_str).map(parse_url).collect()
    }

    fn resolve_timeout(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Duration, ConfigError> {
        // Priority: CLI explicit > TOML > default
        let seconds = cli
            .timeout
            .or_else(|| toml.and_then(|t| t.webhook.timeout))
            .unwrap_or(defaults::TIMEOUT_SECS);

        if seconds == 0 {
            return Err(ConfigError::InvalidDuration {
                field: "timeout",
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(Duration::from_secs(seconds))
    }

    fn resolve_fan_out(cli: &Cli, toml: Option<&TomlConfig>) -> Result<FanOut, ConfigError> {
        if let Some(arg) = cli.fan_out {
            return Ok(arg.into());
        }

        match toml.and_then(|t| t.webhook.fan_out.as_deref()) {
            Some(value) => Ok(value.parse()?),
            None => Ok(FanOut::default()),
        }
    }

    fn resolve_media_path(cli: &Cli, toml: Option<&TomlConfig>) -> PathBuf {
        cli.media_path.clone().unwrap_or_else(|| {
            let raw = toml
                .and_then(|t| t.whatsapp.media_path.as_deref())
                .unwrap_or(defaults::MEDIA_PATH);
            expand_tilde(raw)
        })
    }

    fn resolve_max_in_flight(cli: &Cli, toml: Option<&TomlConfig>) -> Result<usize, ConfigError> {
        let limit = cli
            .max_in_flight
            .or_else(|| toml.and_then(|t| t.webhook.max_in_flight))
            .unwrap_or(defaults::MAX_IN_FLIGHT);

        if limit == 0 {
            return Err(ConfigError::InvalidLimit {
                field: "max_in_flight",
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(limit)
    }

    fn build_retry_policy(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<RetryPolicy, ConfigError> {
        let retry = toml.map(|t| &t.retry);

        // Priority: CLI explicit > TOML > default
        let max_attempts = cli
            .retry_max
            .or_else(|| retry.and_then(|r| r.max_attempts))
            .unwrap_or(defaults::RETRY_MAX_ATTEMPTS);

        let initial_delay_secs = cli
            .retry_delay
            .or_else(|| retry.and_then(|r| r.initial_delay))
            .unwrap_or(defaults::RETRY_INITIAL_DELAY_SECS);

        let max_delay_secs = retry
            .and_then(|r| r.max_delay)
            .unwrap_or(defaults::RETRY_MAX_DELAY_SECS);

        let multiplier = retry
            .and_then(|r| r.multiplier)
            .unwrap_or(defaults::RETRY_MULTIPLIER);

        if max_attempts == 0 {
            return Err(ConfigError::InvalidRetry(
                "max_attempts must be greater than 0".to_string(),
            ));
        }

        if initial_delay_secs == 0 {
            return Err(ConfigError::InvalidRetry(
                "initial_delay must be greater than 0".to_string(),
            ));
        }

        if multiplier <= 0.0 || !multiplier.is_finite() {
            return Err(ConfigError::InvalidRetry(
                "multiplier must be a positive finite number".to_string(),
            ));
        }

        if max_delay_secs > defaults::RETRY_DELAY_LIMIT_SECS {
            return Err(ConfigError::InvalidRetry(format!(
                "max_delay ({max_delay_secs}s) must be <= {}s",
                defaults::RETRY_DELAY_LIMIT_SECS
            )));
        }

        if max_delay_secs < initial_delay_secs {
            return Err(ConfigError::InvalidRetry(format!(
                "max_delay ({max_delay_secs}s) must be >= initial_delay ({initial_delay_secs}s)"
            )));
        }

        Ok(RetryPolicy::new()
            .with_max_attempts(max_attempts)
            .with_initial_delay(Duration::from_secs(initial_delay_secs))
            .with_max_delay(Duration::from_secs(max_delay_secs))
            .with_multiplier(multiplier))
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

// Helper functions

fn parse_url(s: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(s).map_err(|e| ConfigError::InvalidUrl {
        url: s.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::InvalidUrl {
            url: s.to_string(),
            reason: format!("unsupported scheme '{scheme}', expected http or https"),
        }),
    }
}

/// Expands a leading `~` to the user's home directory.
///
/// Paths without a leading `~`, or when no home directory is known, are
/// returned unchanged.
fn expand_tilde(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return PathBuf::from(path),
    };

    match dirs::home_dir() {
        Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
        None => PathBuf::from(path),
    }
}
