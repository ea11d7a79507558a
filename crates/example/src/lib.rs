//! Support code for the `quillsign-demo` binary.

pub mod audit;
pub mod telemetry;

pub use audit::register_audit_hooks;
pub use telemetry::{TracingConfig, TracingFormat};
