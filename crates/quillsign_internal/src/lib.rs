//! # Quillsign Internal Library
//!
//! Re-exports the core Quillsign crates for convenience.

/// Layer 1: hook registry and event naming.
pub use quillsign_hooks;

/// Layer 2: operation instrumentation.
pub use quillsign_instrument;

/// Layer 3: the instrumented signature client.
pub use quillsign_client;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use quillsign_client::{
        ClientConfig, ClientError, SignClient, SignatureApi, SignatureApiOperations,
    };
    pub use quillsign_hooks::{EventNames, HookError, HookRegistry};
    pub use quillsign_instrument::{
        InstrumentError, Instrumented, InstrumentedView, Operations, operations,
    };
}
