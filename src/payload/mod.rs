//! Payload layer: normalizes events into the webhook JSON contract.
//!
//! - [`Payload`]: flat, key-sorted JSON object sent to endpoints
//! - [`PayloadBuilder`]: converts an [`Event`](crate::event::Event) into a [`Payload`]
//! - [`BuildError`]: why a payload could not be built
//!
//! # Presence Rule
//!
//! A field appears in a payload only if its source value is non-empty.
//! Absent values are never emitted as `null`, `""` or `false`.

mod builder;
mod error;
mod map;


pub use builder::{PayloadBuilder, is_from_me};
pub use error::BuildError;
pub use map::Payload;
