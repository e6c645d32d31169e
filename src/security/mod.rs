//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → origin.rs (allow-list the Origin header)
//!     → rate_limit.rs (fixed-window per client + route)
//!     → validator.rs (honeypot, timing, score, signature, allow-lists)
//!     → Pass to downstream call
//! ```
//!
//! # Design Decisions
//! - Checks are ordered cheapest-first and short-circuit
//! - Throttling and rejection are decision values, never errors
//! - No trust in client input

pub mod origin;
pub mod rate_limit;
pub mod validator;

pub use rate_limit::{RateDecision, RateLimiter};
pub use validator::{RejectReason, SecurityDecision};
