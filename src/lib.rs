//! Automatic begin/after instrumentation for async service clients, with an
//! instrumented e-signature client built on it.
//!

pub use quillsign_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use quillsign_internal::prelude::*;
}
