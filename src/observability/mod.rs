//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, `audit` target for the sink)
//!     → metrics.rs (counters by route / outcome / status)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields, never interpolated payloads
//! - Secrets are redacted before anything reaches this layer
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
