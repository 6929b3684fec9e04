//! wa-relay: WhatsApp event to webhook forwarder
//!
//! A library for turning WhatsApp message and receipt events into
//! normalized JSON payloads and delivering them, signed with HMAC-SHA256,
//! to one or more HTTP webhooks with bounded retry.

pub mod config;
pub mod dispatch;
pub mod event;
pub mod media;
pub mod payload;
pub mod time;
pub mod webhook;
