//! Error types for operation instrumentation.

use quillsign_hooks::HookError;

/// Errors raised by the instrumentation layer itself.
///
/// Failures of the underlying operation are never wrapped in this type;
/// they reach the caller with their original identity.
#[derive(Debug, thiserror::Error)]
pub enum InstrumentError {
    /// A wrapped operation was invoked on an instance without a registry.
    #[error("hooks not initialized: '{operation}' was invoked on an instance without a hook registry")]
    HooksNotInitialized {
        /// The operation that was invoked.
        operation: String,
    },

    /// The invoked name is not declared by the instrumented type.
    #[error("'{operation}' is not an operation of {type_name}")]
    UnknownOperation {
        /// The instrumented type.
        type_name: &'static str,
        /// The undeclared name.
        operation: String,
    },

    /// Two operations derive the same event name.
    #[error("operations '{first}' and '{second}' both derive event '{event}'")]
    EventNameCollision {
        /// The shared event name.
        event: String,
        /// The operation that claimed the event first.
        first: String,
        /// The operation that collided with it.
        second: String,
    },

    /// Arguments or a resolved value could not be turned into a hook payload.
    #[error("failed to serialize hook payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// A hook handler failed.
    #[error(transparent)]
    Hook(#[from] HookError),
}

impl InstrumentError {
    /// Returns `true` for the misconfiguration raised when no registry is attached.
    #[must_use]
    pub fn is_hooks_not_initialized(&self) -> bool {
        matches!(self, Self::HooksNotInitialized { .. })
    }
}
