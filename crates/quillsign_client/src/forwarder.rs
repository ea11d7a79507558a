//! Forwards transport failures to a hook registry.

use std::sync::Arc;

use quillsign_hooks::{HookRegistry, ON_ERROR};

use crate::transport::{RequestFailure, RequestOutcome, TransportObserver};

/// A [`TransportObserver`] that fires [`ON_ERROR`] with each failure.
///
/// The payload is the [`RequestFailure`] as JSON. Handler errors are logged;
/// they never replace the error already returned to the caller.
#[derive(Debug, Clone)]
pub struct HookForwarder {
    hooks: Arc<HookRegistry>,
}

impl HookForwarder {
    /// Forwards to `hooks`.
    #[must_use]
    pub fn new(hooks: Arc<HookRegistry>) -> Self {
        Self { hooks }
    }
}

impl TransportObserver for HookForwarder {
    fn on_success(&self, outcome: &RequestOutcome) {
        tracing::debug!(
            method = %outcome.method,
            path = %outcome.path,
            status = outcome.status,
            "request succeeded"
        );
    }

    fn on_error(&self, failure: &RequestFailure) {
        let payload = match serde_json::to_value(failure) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode request failure");
                return;
            }
        };
        if let Err(err) = self.hooks.fire(ON_ERROR, &payload) {
            tracing::warn!(error = %err, "onError handler failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn failure() -> RequestFailure {
        RequestFailure {
            method: "GET".into(),
            path: "account".into(),
            status: Some(401),
            error_name: Some("unauthorized".into()),
            message: "Unauthorized api key".into(),
        }
    }

    #[test]
    fn failure_is_fired_as_json() {
        let hooks = Arc::new(HookRegistry::new());
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);
        hooks
            .register(ON_ERROR, move |payload| {
                *seen_clone.lock().unwrap() = Some(payload.clone());
            })
            .unwrap();

        HookForwarder::new(Arc::clone(&hooks)).on_error(&failure());

        let payload = seen.lock().unwrap().take().unwrap();
        assert_eq!(payload["status"], 401);
        assert_eq!(payload["error_name"], "unauthorized");
        assert_eq!(payload["path"], "account");
    }

    #[test]
    fn failing_handler_is_contained() {
        let hooks = Arc::new(HookRegistry::new());
        hooks
            .register_fallible(ON_ERROR, |_| Err("sink offline"))
            .unwrap();
        HookForwarder::new(hooks).on_error(&failure());
    }
}
