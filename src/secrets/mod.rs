//! Server-held credentials.
//!
//! # Data Flow
//! ```text
//! process environment
//!     → SecretVault::from_env (startup, fail-fast)
//!     → vault.get(env_ref) per request
//!     → Secret::expose() only at outbound request construction
//! ```
//!
//! # Design Decisions
//! - A missing secret for an enabled route aborts startup
//! - `Secret` redacts itself in Debug/Display and never derives Serialize
//! - The vault is read-only after initialization

pub mod vault;

pub use vault::{Secret, SecretVault, REDACTED};
