//! Error types for hook registration and dispatch.

/// Boxed error returned by fallible hook handlers.
pub type BoxError = Box<dyn core::error::Error + Send + Sync>;

/// Errors that can occur while registering or firing hooks.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// The registration can never be dispatched.
    ///
    /// Handlers are callable by construction, so this is raised for the
    /// other half of a registration: an event name no fire call could match.
    #[error("invalid handler registration for event '{event}': {reason}")]
    InvalidHandler {
        /// The rejected event name.
        event: String,
        /// Why the registration was rejected.
        reason: &'static str,
    },

    /// A synchronous handler returned an error.
    #[error("handler for '{event}' failed: {source}")]
    Handler {
        /// The event whose handler failed.
        event: String,
        /// The error returned by the handler.
        #[source]
        source: BoxError,
    },

    /// An asynchronous handler was fired with no tokio runtime to run it on.
    #[error("async handler for '{event}' fired outside of a tokio runtime")]
    NoRuntime {
        /// The event that was fired.
        event: String,
    },
}

impl HookError {
    /// Returns the event name this error relates to.
    #[must_use]
    pub fn event(&self) -> &str {
        match self {
            Self::InvalidHandler { event, .. }
            | Self::Handler { event, .. }
            | Self::NoRuntime { event } => event,
        }
    }
}
