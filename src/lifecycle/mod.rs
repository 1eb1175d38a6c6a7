//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → Metrics exporter → Bind listener → Serve
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Stop accepting → Drain in-flight responses (cleanup runs) → Exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, the metrics exporter included
//! - Listener binds last (traffic only when ready)
//! - In-flight bodies are never cut short by shutdown, so their artifacts are deleted

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
