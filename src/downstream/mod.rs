//! Third-party API clients.
//!
//! The CAPTCHA verifier, the subscription service, and webhook targets are
//! black boxes reachable over HTTP. Every call carries a bounded timeout;
//! a timeout is a downstream failure, never a hang.

pub mod client;

pub use client::{CaptchaVerdict, DownstreamClient, DownstreamError};
