//! Credential-protecting outbound proxy gateway.
//!
//! Sits between an untrusted browser client and three third-party APIs
//! (CAPTCHA verification, email-list subscription, webhook delivery).
//! Injects server-held secrets, enforces per-route rate limits, validates
//! caller-supplied signals, and relays downstream responses unmodified in
//! content while auditing every request/response pair.

pub mod audit;
pub mod config;
pub mod downstream;
pub mod gateway;
pub mod lifecycle;
pub mod observability;
pub mod secrets;
pub mod security;

pub use config::GatewayConfig;
pub use gateway::GatewayServer;
pub use lifecycle::Shutdown;
