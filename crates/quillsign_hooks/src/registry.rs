//! Hook registration and dispatch.
//!
//! The [`HookRegistry`] maps an event name to at most one [`Handler`].
//! Each instrumented object owns its own registry; handlers never leak
//! between instances.
//!
//! # Sync vs Async Handlers
//!
//! - **Sync** ([`register`](HookRegistry::register),
//!   [`register_fallible`](HookRegistry::register_fallible)): run inline
//!   inside [`fire`](HookRegistry::fire). A failure is returned to the caller
//!   of `fire`, so a failing begin-handler aborts the operation before it
//!   starts and a failing after-handler turns a success into an error.
//! - **Async** ([`register_async`](HookRegistry::register_async)): spawned on
//!   the current tokio runtime and not awaited. Failures can only be logged.
//!
//! # Overwrite Semantics
//!
//! Registering a second handler for an event replaces the first. This is
//! intentional and not validated; the replacement is logged at `debug`.
//!
//! # Example
//!
//! ```
//! use quillsign_hooks::HookRegistry;
//! use serde_json::json;
//!
//! let hooks = HookRegistry::new();
//! hooks
//!     .register("onBeginSubmit", |args| println!("submit {args}"))?
//!     .register_fallible("onAfterSubmit", |value| {
//!         if value.get("id").is_none() {
//!             return Err("missing id");
//!         }
//!         Ok(())
//!     })?;
//!
//! hooks.fire("onBeginSubmit", &json!(["doc-1"]))?;
//! assert!(hooks.fire("onAfterSubmit", &json!({})).is_err());
//! # Ok::<(), quillsign_hooks::HookError>(())
//! ```

use core::fmt;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use hashbrown::HashMap;
use parking_lot::RwLock;
use serde_json::Value;

use crate::error::{BoxError, HookError};

// ─────────────────────────────────────────────────────────────────────────────
// Handler
// ─────────────────────────────────────────────────────────────────────────────

type SyncFn = dyn Fn(&Value) -> Result<(), BoxError> + Send + Sync;
type AsyncFn = dyn Fn(Value) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync;

/// Type-erased hook handler.
///
/// Most users should use the typed `register*` methods on [`HookRegistry`]
/// instead of building a `Handler` directly.
#[derive(Clone)]
pub enum Handler {
    /// Invoked inline; its error propagates out of `fire`.
    Sync(Arc<SyncFn>),
    /// Spawned on the current runtime; fire-and-continue.
    Async(Arc<AsyncFn>),
}

impl Handler {
    /// Wraps a fallible synchronous function.
    #[must_use]
    pub fn sync(handler: impl Fn(&Value) -> Result<(), BoxError> + Send + Sync + 'static) -> Self {
        Self::Sync(Arc::new(handler))
    }

    /// Wraps an asynchronous function.
    #[must_use]
    pub fn from_async<F, Fut>(handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        Self::Async(Arc::new(move |payload| handler(payload).boxed()))
    }

    /// Returns `true` if the handler runs detached from `fire`.
    #[must_use]
    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Handler::Sync"),
            Self::Async(_) => f.write_str("Handler::Async"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HookRegistry
// ─────────────────────────────────────────────────────────────────────────────

/// Per-instance registry of event handlers.
///
/// # Thread Safety
///
/// Registration takes a write lock; [`fire`](Self::fire) clones the handler
/// out of a read lock and runs it with no lock held. Concurrent `register`
/// and `fire` calls therefore never race on the map, and a handler may
/// itself register or fire events without deadlocking.
#[derive(Default)]
pub struct HookRegistry {
    /// Maps event name to its single handler.
    handlers: RwLock<HashMap<String, Handler>>,
}

impl HookRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Registers an infallible synchronous handler for `event`.
    pub fn register<F>(&self, event: impl Into<String>, handler: F) -> Result<&Self, HookError>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.register_handler(
            event,
            Handler::sync(move |payload| {
                handler(payload);
                Ok(())
            }),
        )?;
        Ok(self)
    }

    /// Registers a fallible synchronous handler for `event`.
    ///
    /// An `Err` returned by the handler surfaces from [`fire`](Self::fire)
    /// as [`HookError::Handler`].
    pub fn register_fallible<F, E>(
        &self,
        event: impl Into<String>,
        handler: F,
    ) -> Result<&Self, HookError>
    where
        F: Fn(&Value) -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.register_handler(
            event,
            Handler::sync(move |payload| handler(payload).map_err(Into::into)),
        )?;
        Ok(self)
    }

    /// Registers an asynchronous handler for `event`.
    ///
    /// The returned future is spawned when the event fires and is not
    /// awaited; callers that need completion must synchronize themselves.
    pub fn register_async<F, Fut>(
        &self,
        event: impl Into<String>,
        handler: F,
    ) -> Result<&Self, HookError>
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.register_handler(event, Handler::from_async(handler))?;
        Ok(self)
    }

    /// Registers a pre-built [`Handler`] for `event`.
    ///
    /// This is the lower-level registration method used by the typed
    /// variants. Any previous handler for `event` is replaced.
    pub fn register_handler(
        &self,
        event: impl Into<String>,
        handler: Handler,
    ) -> Result<(), HookError> {
        let event = event.into();
        if let Some(reason) = invalid_event_reason(&event) {
            return Err(HookError::InvalidHandler { event, reason });
        }

        let mut handlers = self.handlers.write();
        if handlers.insert(event.clone(), handler).is_some() {
            tracing::debug!(event = %event, "replaced previously registered hook handler");
        }
        Ok(())
    }

    /// Fires `event` with `payload`.
    ///
    /// With no handler registered this is a no-op. A synchronous handler's
    /// error is returned; an asynchronous handler is spawned and `Ok(())` is
    /// returned immediately.
    pub fn fire(&self, event: &str, payload: &Value) -> Result<(), HookError> {
        let handler = self.handlers.read().get(event).cloned();
        let Some(handler) = handler else {
            tracing::trace!(event, "no hook handler registered");
            return Ok(());
        };

        tracing::trace!(event, async_handler = handler.is_async(), "firing hook");
        match handler {
            Handler::Sync(handler) => handler(payload).map_err(|source| HookError::Handler {
                event: event.to_owned(),
                source,
            }),
            Handler::Async(handler) => {
                let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
                    HookError::NoRuntime {
                        event: event.to_owned(),
                    }
                })?;
                let future = handler(payload.clone());
                let event = event.to_owned();
                runtime.spawn(async move {
                    if let Err(error) = future.await {
                        tracing::warn!(event = %event, %error, "async hook handler failed");
                    }
                });
                Ok(())
            }
        }
    }

    /// Removes and returns the handler for `event`, if any.
    pub fn remove(&self, event: &str) -> Option<Handler> {
        self.handlers.write().remove(event)
    }

    /// Returns `true` if a handler is registered for `event`.
    #[must_use]
    pub fn contains(&self, event: &str) -> bool {
        self.handlers.read().contains_key(event)
    }

    /// Returns the number of events with a registered handler.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    /// Returns `true` if no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    /// Returns the registered event names, sorted.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        let mut events: Vec<String> = self.handlers.read().keys().cloned().collect();
        events.sort_unstable();
        events
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("events", &self.events())
            .finish()
    }
}

fn invalid_event_reason(event: &str) -> Option<&'static str> {
    if event.is_empty() {
        Some("event name is empty")
    } else if event.chars().any(char::is_whitespace) {
        Some("event name contains whitespace")
    } else {
        None
    }
}
