//! Error types for signing and webhook delivery.

use thiserror::Error;

/// Transport-level failure of a single HTTP request.
///
/// Describes what went wrong without dictating recovery strategy; the
/// delivery client decides which of these are worth another attempt.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network connection failed.
    ///
    /// This includes DNS resolution failures, connection refused,
    /// and other network-level errors.
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// The endpoint URL cannot be used for a request.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Why one delivery attempt did not succeed.
#[derive(Debug, Error)]
pub enum AttemptError {
    /// The request failed at the transport level.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The endpoint answered with a non-2xx status (strict mode only).
    #[error("HTTP {status}{}", body_suffix(.body))]
    NonSuccessStatus {
        /// Status code returned by the endpoint
        status: http::StatusCode,
        /// Response body, if it was valid UTF-8
        body: Option<String>,
    },
}

fn body_suffix(body: &Option<String>) -> String {
    body.as_deref()
        .filter(|b| !b.is_empty())
        .map_or_else(String::new, |b| format!(": {b}"))
}

/// Payload signing failure.
#[derive(Debug, Error)]
pub enum SignError {
    /// The secret cannot be used as an HMAC key.
    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    /// The signature cannot be carried in an HTTP header.
    #[error("Invalid signature header: {0}")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),
}

/// Error returned when a payload could not be delivered to an endpoint.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The payload could not be encoded as JSON. Not retried.
    #[error("Failed to marshal body: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The payload could not be signed. Not retried.
    #[error("Failed to create signature: {0}")]
    Sign(#[from] SignError),

    /// The attempt failed in a way another attempt cannot fix.
    #[error("Webhook {endpoint} rejected attempt {attempt}: {source}")]
    Rejected {
        /// Endpoint URL
        endpoint: String,
        /// Attempt number that was rejected (1-based)
        attempt: u32,
        /// The non-retryable failure
        #[source]
        source: AttemptError,
    },

    /// Every attempt failed.
    #[error("Failed to submit webhook to {endpoint} after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded {
        /// Endpoint URL
        endpoint: String,
        /// Number of attempts made
        attempts: u32,
        /// Failure of the final attempt
        #[source]
        last_error: AttemptError,
    },
}

impl DeliveryError {
    /// Returns the endpoint the failure relates to, if it got that far.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Rejected { endpoint, .. } | Self::MaxRetriesExceeded { endpoint, .. } => {
                Some(endpoint)
            }
            Self::Serialize(_) | Self::Sign(_) => None,
        }
    }

    /// Returns how many attempts were made before giving up.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::MaxRetriesExceeded { attempts, .. } => *attempts,
            Self::Rejected { attempt, .. } => *attempt,
            Self::Serialize(_) | Self::Sign(_) => 0,
        }
    }
}
