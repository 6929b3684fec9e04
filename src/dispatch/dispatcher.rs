//! The per-event entry point.

use std::path::PathBuf;

use crate::event::Event;
use crate::media::MediaExtractor;
use crate::payload::{BuildError, Payload, PayloadBuilder};
use crate::webhook::{DeliveryError, Endpoint, WebhookDelivery};

use super::{FanOut, ForwardError};

/// Immutable process-wide configuration injected into a [`Dispatcher`].
#[derive(Debug, Clone, Default)]
pub struct DispatchConfig {
    /// Destinations, attempted in this order.
    pub endpoints: Vec<Endpoint>,
    /// The relay's own identity, used to compute `from_me`.
    pub identity: String,
    /// Root directory for extracted media.
    pub storage_root: PathBuf,
    /// Behavior when an endpoint fails.
    pub fan_out: FanOut,
}

/// Builds the payload for an event and delivers it to every endpoint.
///
/// The dispatcher holds no mutable state, so one instance can be shared
/// (e.g. behind an `Arc`) by any number of concurrent forwards.
///
/// # Type Parameters
///
/// - `D`: The delivery client used for each endpoint
/// - `M`: The media extractor used by the payload builder
#[derive(Debug)]
pub struct Dispatcher<D, M> {
    builder: PayloadBuilder<M>,
    endpoints: Vec<Endpoint>,
    fan_out: FanOut,
    delivery: D,
}

impl<D, M> Dispatcher<D, M> {
    /// Creates a dispatcher from its configuration and collaborators.
    #[must_use]
    pub fn new(config: DispatchConfig, extractor: M, delivery: D) -> Self {
        Self {
            builder: PayloadBuilder::new(extractor, config.identity, config.storage_root),
            endpoints: config.endpoints,
            fan_out: config.fan_out,
            delivery,
        }
    }

    /// Returns the configured endpoints.
    #[must_use]
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Returns the fan-out mode.
    #[must_use]
    pub const fn fan_out(&self) -> FanOut {
        self.fan_out
    }

    /// Returns the delivery client.
    #[must_use]
    pub const fn delivery(&self) -> &D {
        &self.delivery
    }

    /// Returns the payload builder.
    #[must_use]
    pub const fn builder(&self) -> &PayloadBuilder<M> {
        &self.builder
    }
}

impl<D: WebhookDelivery, M: MediaExtractor> Dispatcher<D, M> {
    /// Builds the payload for `event` without delivering it.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if media extraction fails.
    pub async fn build_payload(&self, event: &Event) -> Result<Payload, BuildError> {
        self.builder.build(event).await
    }

    /// Forwards one event to every configured endpoint.
    ///
    /// A payload that fails to build is never sent anywhere. In
    /// [`FanOut::FailFast`] mode the first failing endpoint ends the forward
    /// and its error is returned; in [`FanOut::BestEffort`] mode every
    /// endpoint is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`ForwardError`] describing the first (or every) failure.
    pub async fn forward(&self, event: Event) -> Result<(), ForwardError> {
        let kind = event.kind();

        let payload = match self.builder.build(&event).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Failed to build {kind} payload: {e}");
                return Err(e.into());
            }
        };

        tracing::info!(
            "Forwarding {kind} event to {} webhook(s)",
            self.endpoints.len()
        );

        match self.fan_out {
            FanOut::FailFast => self.deliver_fail_fast(kind, &payload).await,
            FanOut::BestEffort => self.deliver_best_effort(kind, &payload).await,
        }
    }

    async fn deliver_fail_fast(&self, kind: &str, payload: &Payload) -> Result<(), ForwardError> {
        for endpoint in &self.endpoints {
            if let Err(e) = self.delivery.deliver(payload, endpoint).await {
                tracing::error!("Failed to forward {kind} event: {e}");
                return Err(e.into());
            }
        }
        Ok(())
    }

    async fn deliver_best_effort(&self, kind: &str, payload: &Payload) -> Result<(), ForwardError> {
        let mut errors: Vec<DeliveryError> = Vec::new();

        for endpoint in &self.endpoints {
            if let Err(e) = self.delivery.deliver(payload, endpoint).await {
                tracing::error!("Failed to forward {kind} event: {e}");
                errors.push(e);
            }
        }

        if errors.is_empty() {
            return Ok(());
        }

        Err(ForwardError::Partial {
            failed: errors.len(),
            total: self.endpoints.len(),
            errors,
        })
    }
}
