//! Process lifecycle: startup ordering lives in `main.rs` (config →
//! secrets → metrics → bind → serve); shutdown coordination lives here.

pub mod shutdown;

pub use shutdown::Shutdown;
