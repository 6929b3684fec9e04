//! Multi-endpoint fan-out mode.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// How a forward proceeds when an endpoint fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FanOut {
    /// Stop at the first failing endpoint; later endpoints are not attempted.
    #[default]
    FailFast,
    /// Attempt every endpoint and report all failures together.
    BestEffort,
}

impl FanOut {
    /// Returns the configuration name of this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FailFast => "fail-fast",
            Self::BestEffort => "best-effort",
        }
    }
}

impl fmt::Display for FanOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown fan-out mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown fan-out mode '{0}' (expected 'fail-fast' or 'best-effort')")]
pub struct ParseFanOutError(pub String);

impl FromStr for FanOut {
    type Err = ParseFanOutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Ok(Self::FailFast),
            "best-effort" | "besteffort" | "best_effort" => Ok(Self::BestEffort),
            _ => Err(ParseFanOutError(s.to_string())),
        }
    }
}
