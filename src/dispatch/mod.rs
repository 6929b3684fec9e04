//! Event dispatching.
//!
//! The [`Dispatcher`] is invoked once per incoming event. It builds the
//! payload and hands it to the delivery client for every configured
//! endpoint, in order, according to the configured [`FanOut`] mode.

mod dispatcher;
mod error;
mod fan_out;


pub use dispatcher::{DispatchConfig, Dispatcher};
pub use error::ForwardError;
pub use fan_out::{FanOut, ParseFanOutError};
