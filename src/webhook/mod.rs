//! Webhook layer: signing and delivering payloads over HTTP.
//!
//! This module provides types and traits for:
//! - Describing destinations ([`Endpoint`])
//! - Building HTTP requests and responses ([`HttpRequest`], [`HttpResponse`])
//! - Abstracting HTTP clients ([`HttpClient`]) with a reqwest implementation ([`ReqwestClient`])
//! - Signing bodies with HMAC-SHA256 ([`sign`], [`verify`])
//! - Delivering with retries ([`WebhookDelivery`], [`HttpDelivery`])
//! - Retry policy configuration ([`RetryPolicy`])

mod client;
mod delivery;
mod endpoint;
mod error;
mod http;
mod retry;
mod signature;

#[cfg(test)]
mod client_tests;
#[cfg(test)]
mod delivery_tests;

pub use client::ReqwestClient;
pub use delivery::{HttpDelivery, IsRetryable, WebhookDelivery};
pub use endpoint::{Endpoint, redacted_url};
pub use error::{AttemptError, DeliveryError, HttpError, SignError};
pub use http::{HttpClient, HttpRequest, HttpResponse};
pub use retry::{Backoff, RetryPolicy};
pub use signature::{SIGNATURE_HEADER, SIGNATURE_PREFIX, header_value, sign, verify};
