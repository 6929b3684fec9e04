//! Error type for forwarding one event.

use thiserror::Error;

use crate::payload::BuildError;
use crate::webhook::DeliveryError;

/// Why an event was not forwarded.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The payload could not be built; nothing was delivered.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// An endpoint failed and the remaining endpoints were skipped.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// Every endpoint was attempted and some of them failed.
    #[error("{failed} of {total} webhooks failed: {}", join_errors(.errors))]
    Partial {
        /// Number of failed endpoints
        failed: usize,
        /// Number of configured endpoints
        total: usize,
        /// One error per failed endpoint, in endpoint order
        errors: Vec<DeliveryError>,
    },
}

fn join_errors(errors: &[DeliveryError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ForwardError {
    /// Returns true if the failure happened before any delivery was attempted.
    #[must_use]
    pub const fn is_build(&self) -> bool {
        matches!(self, Self::Build(_))
    }

    /// Returns the delivery errors contained in this failure.
    #[must_use]
    pub fn delivery_errors(&self) -> &[DeliveryError] {
        match self {
            Self::Build(_) => &[],
            Self::Delivery(e) => std::slice::from_ref(e),
            Self::Partial { errors, .. } => errors,
        }
    }
}
