//! Audit logging through instrumentation hooks.

use quillsign_hooks::{HookError, ON_ERROR};
use quillsign_instrument::Instrumented;

/// Registers a logging handler for every begin/after event of `client`, plus
/// `onError`.
///
/// Returns the number of handlers registered, or `0` if `client` has no
/// registry.
pub fn register_audit_hooks<T>(client: &Instrumented<T>) -> Result<usize, HookError> {
    let Some(hooks) = client.hooks() else {
        tracing::warn!("client has no hook registry; audit logging disabled");
        return Ok(0);
    };

    let mut registered = 0;
    for (operation, events) in client.plan().wrapped() {
        hooks.register(events.begin.as_str(), move |arguments| {
            tracing::info!(operation, %arguments, "operation started");
        })?;
        hooks.register(events.after.as_str(), move |result| {
            tracing::info!(operation, %result, "operation completed");
        })?;
        registered += 2;
    }

    hooks.register(ON_ERROR, |failure| {
        tracing::error!(%failure, "request failed");
    })?;
    Ok(registered + 1)
}
