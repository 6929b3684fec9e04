//! Webhook delivery trait and signed HTTP implementation.

use std::time::Duration;

use http::HeaderValue;
use http::header::{CONTENT_TYPE, HeaderName};

use crate::payload::Payload;
use crate::time::{Sleeper, TokioSleeper};

use super::signature::{self, SIGNATURE_HEADER};
use super::{
    AttemptError, DeliveryError, Endpoint, HttpClient, HttpError, HttpRequest, RetryPolicy,
};

/// Trait for delivering a payload to one endpoint.
///
/// Implementations handle retries internally and only report the final
/// outcome. This is the seam the dispatcher fans out over.
pub trait WebhookDelivery: Send + Sync {
    /// Delivers `payload` to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] if the payload cannot be encoded or signed,
    /// or if every attempt failed.
    fn deliver(
        &self,
        payload: &Payload,
        endpoint: &Endpoint,
    ) -> impl std::future::Future<Output = Result<(), DeliveryError>> + Send;
}

/// Signed HTTP delivery with exponential backoff.
///
/// For each delivery the payload is serialized once, signed with the
/// endpoint's secret, and POSTed with `Content-Type: application/json` and
/// `X-Hub-Signature-256: sha256=<hex>`. Retries resend the identical bytes.
///
/// # Status Codes
///
/// By default only transport failures (connection errors, timeouts) count
/// as failed attempts; any HTTP response, including 4xx/5xx, is treated as
/// delivered. With [`with_strict_status`](Self::with_strict_status) a
/// non-2xx response fails the attempt: 5xx, 408 and 429 are retried, other
/// statuses are rejected immediately.
///
/// # Type Parameters
///
/// - `H`: The HTTP client implementation
/// - `S`: The sleeper used between attempts (defaults to [`TokioSleeper`])
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use wa_relay::webhook::{HttpDelivery, ReqwestClient, RetryPolicy};
///
/// let delivery = HttpDelivery::new(ReqwestClient::with_timeout(Duration::from_secs(10)).unwrap())
///     .with_retry_policy(RetryPolicy::default());
/// ```
#[derive(Debug)]
pub struct HttpDelivery<H, S = TokioSleeper> {
    client: H,
    sleeper: S,
    retry_policy: RetryPolicy,
    request_timeout: Duration,
    strict_status: bool,
}

impl<H> HttpDelivery<H, TokioSleeper> {
    /// Default per-request timeout.
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a delivery client with the default retry policy, a 10 second
    /// request timeout and lenient status handling.
    #[must_use]
    pub fn new(client: H) -> Self {
        Self {
            client,
            sleeper: TokioSleeper,
            retry_policy: RetryPolicy::default(),
            request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
            strict_status: false,
        }
    }
}

impl<H, S> HttpDelivery<H, S> {
    /// Sets a custom sleeper for retry delays.
    ///
    /// This is primarily useful for testing to avoid actual delays.
    #[must_use]
    pub fn with_sleeper<S2>(self, sleeper: S2) -> HttpDelivery<H, S2> {
        HttpDelivery {
            client: self.client,
            sleeper,
            retry_policy: self.retry_policy,
            request_timeout: self.request_timeout,
            strict_status: self.strict_status,
        }
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Treats non-2xx responses as failed attempts.
    #[must_use]
    pub const fn with_strict_status(mut self, strict: bool) -> Self {
        self.strict_status = strict;
        self
    }

    /// Returns the configured retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns true if non-2xx responses fail an attempt.
    #[must_use]
    pub const fn strict_status(&self) -> bool {
        self.strict_status
    }

    /// Serializes and signs `payload` into the request sent to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Serialize`] or [`DeliveryError::Sign`].
    pub fn build_request(
        payload: &Payload,
        endpoint: &Endpoint,
    ) -> Result<HttpRequest, DeliveryError> {
        let body = payload.to_bytes().map_err(DeliveryError::Serialize)?;
        let signature = signature::sign(&body, endpoint.secret().as_bytes())?;

        Ok(HttpRequest::post(endpoint.url().clone(), body)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_header(
                HeaderName::from_static(SIGNATURE_HEADER),
                signature::header_value(&signature)?,
            ))
    }
}

impl<H: HttpClient, S: Sleeper> HttpDelivery<H, S> {
    /// Executes a single attempt, bounded by the request timeout.
    async fn execute_request(&self, request: &HttpRequest) -> Result<(), AttemptError> {
        let response =
            tokio::time::timeout(self.request_timeout, self.client.request(request.clone()))
                .await
                .map_err(|_| HttpError::Timeout)??;

        if response.is_success() {
            return Ok(());
        }

        if !self.strict_status {
            tracing::debug!(
                "Webhook {} answered {}, counted as delivered",
                request.url,
                response.status
            );
            return Ok(());
        }

        Err(AttemptError::NonSuccessStatus {
            status: response.status,
            body: response.body_text().map(ToString::to_string),
        })
    }

    /// Sends with retry logic.
    async fn deliver_with_retry(
        &self,
        payload: &Payload,
        endpoint: &Endpoint,
    ) -> Result<(), DeliveryError> {
        let request = Self::build_request(payload, endpoint)?;
        let mut backoff = self.retry_policy.backoff();
        let mut attempt = 1;

        loop {
            let error = match self.execute_request(&request).await {
                Ok(()) => {
                    tracing::info!(
                        "Successfully submitted webhook to {endpoint} on attempt {attempt}"
                    );
                    return Ok(());
                }
                Err(e) => e,
            };

            tracing::warn!("Attempt {attempt} to submit webhook to {endpoint} failed: {error}");

            if !error.is_retryable() {
                return Err(DeliveryError::Rejected {
                    endpoint: endpoint.to_string(),
                    attempt,
                    source: error,
                });
            }

            // The schedule holds one delay fewer than attempts, so running
            // out of delays means the final attempt just failed
            let Some(delay) = backoff.next() else {
                return Err(DeliveryError::MaxRetriesExceeded {
                    endpoint: endpoint.to_string(),
                    attempts: attempt,
                    last_error: error,
                });
            };

            self.sleeper.sleep(delay).await;
            attempt += 1;
        }
    }
}

impl<H: HttpClient, S: Sleeper> WebhookDelivery for HttpDelivery<H, S> {
    async fn deliver(&self, payload: &Payload, endpoint: &Endpoint) -> Result<(), DeliveryError> {
        self.deliver_with_retry(payload, endpoint).await
    }
}

/// Extension trait for checking if an error is retryable.
///
/// Determines whether a failed attempt represents a transient failure that
/// warrants another attempt.
pub trait IsRetryable {
    /// Returns true if the error is potentially transient and should be retried.
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for HttpError {
    fn is_retryable(&self) -> bool {
        match self {
            // Network errors are typically transient
            Self::Connection(_) | Self::Timeout => true,
            // URL errors are configuration issues, not transient
            Self::InvalidUrl(_) => false,
        }
    }
}

impl IsRetryable for AttemptError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_retryable(),
            Self::NonSuccessStatus { status, .. } => {
                status.is_server_error()
                    || *status == http::StatusCode::TOO_MANY_REQUESTS
                    || *status == http::StatusCode::REQUEST_TIMEOUT
            }
        }
    }
}
