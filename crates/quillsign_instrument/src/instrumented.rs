//! The instrumenting decorator.
//!
//! [`Instrumented<T>`] owns a plain implementation object, the hook registry
//! of this instance, and the frozen [`InstrumentationPlan`] for `T`. Calls
//! are routed through [`invoke`](Instrumented::invoke), which fires the
//! begin/after events of wrapped operations around the real call.
//!
//! # Call Sequence
//!
//! ```text
//! caller
//!   → registry present?          (no → HooksNotInitialized, operation never runs)
//!   → fire onBegin<Op>(arguments)
//!   → operation(...).await        (error → returned untouched, no after-event)
//!   → fire onAfter<Op>(resolved value)
//!   → caller receives the value unchanged
//! ```

use core::fmt;
use std::sync::Arc;

use quillsign_hooks::HookRegistry;
use serde::Serialize;
use serde_json::Value;

use crate::error::InstrumentError;
use crate::operation::Operations;
use crate::plan::{ExemptionSet, InstrumentationPlan, PlannedOperation};

// ─────────────────────────────────────────────────────────────────────────────
// Arguments
// ─────────────────────────────────────────────────────────────────────────────

/// The captured argument list of one call, as a JSON array.
#[derive(Debug, Clone, PartialEq)]
pub struct Arguments(Value);

impl Arguments {
    /// Captures an argument tuple such as `(&name,)` or `(&id, &email)`.
    pub fn capture<A: Serialize + ?Sized>(arguments: &A) -> Result<Self, InstrumentError> {
        Ok(Self(serde_json::to_value(arguments)?))
    }

    /// The argument list of a call taking no arguments.
    #[must_use]
    pub fn empty() -> Self {
        Self(Value::Array(Vec::new()))
    }

    /// Returns the captured payload.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the arguments, returning the payload.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Instrumented
// ─────────────────────────────────────────────────────────────────────────────

/// An implementation object wrapped with begin/after instrumentation.
///
/// Forwarding methods with the inner type's signatures are generated by the
/// `#[operations]` macro as a `<Type>Operations` trait implemented for every
/// [`InstrumentedView<Type>`](crate::InstrumentedView), this wrapper included.
pub struct Instrumented<T> {
    inner: T,
    hooks: Option<Arc<HookRegistry>>,
    plan: InstrumentationPlan,
}

impl<T: Operations> Instrumented<T> {
    /// Wraps `inner` with a fresh hook registry and no extra exemptions.
    pub fn new(inner: T) -> Result<Self, InstrumentError> {
        Self::builder(inner).build()
    }

    /// Wraps `inner` without a hook registry.
    ///
    /// Every wrapped operation fails with
    /// [`HooksNotInitialized`](InstrumentError::HooksNotInitialized) until a
    /// registry is attached with [`attach_hooks`](Self::attach_hooks).
    pub fn detached(inner: T) -> Result<Self, InstrumentError> {
        Self::builder(inner).without_hooks().build()
    }

    /// Starts building an instrumented object.
    #[must_use]
    pub fn builder(inner: T) -> InstrumentedBuilder<T> {
        InstrumentedBuilder {
            inner,
            hooks: Some(Arc::new(HookRegistry::new())),
            exemptions: ExemptionSet::new(),
        }
    }
}

impl<T> Instrumented<T> {
    /// Returns this instance's hook registry, if one is attached.
    #[must_use]
    pub fn hooks(&self) -> Option<&Arc<HookRegistry>> {
        self.hooks.as_ref()
    }

    /// Attaches a registry, returning the one it replaces.
    pub fn attach_hooks(&mut self, hooks: Arc<HookRegistry>) -> Option<Arc<HookRegistry>> {
        self.hooks.replace(hooks)
    }

    /// Returns the wrapped implementation object.
    ///
    /// Calls made through this reference are not instrumented.
    #[must_use]
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Consumes the wrapper, returning the implementation object.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Returns the frozen instrumentation plan.
    #[must_use]
    pub fn plan(&self) -> &InstrumentationPlan {
        &self.plan
    }

    /// Invokes `operation` through the instrumentation layer.
    ///
    /// `call` receives the implementation object and performs the real
    /// operation. For a wrapped operation the registry must be attached; the
    /// begin-event fires with `arguments` before `call` runs and the
    /// after-event fires with the serialized result once it resolves. The
    /// resolved value is returned unchanged. Errors from `call` are returned
    /// as-is and fire no event.
    pub async fn invoke<'a, R, E, F, Fut>(
        &'a self,
        operation: &str,
        arguments: Arguments,
        call: F,
    ) -> Result<R, E>
    where
        F: FnOnce(&'a T) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        R: Serialize,
        E: From<InstrumentError>,
    {
        let events = match self.plan.get(operation) {
            Some(PlannedOperation::Wrapped(events)) => events,
            Some(PlannedOperation::Exempt | PlannedOperation::Skipped) => {
                return call(&self.inner).await;
            }
            None => {
                return Err(InstrumentError::UnknownOperation {
                    type_name: self.plan.type_name(),
                    operation: operation.to_owned(),
                }
                .into());
            }
        };

        let hooks = self
            .hooks
            .as_deref()
            .ok_or_else(|| InstrumentError::HooksNotInitialized {
                operation: operation.to_owned(),
            })?;

        tracing::trace!(operation, event = %events.begin, "operation begin");
        hooks
            .fire(&events.begin, arguments.as_value())
            .map_err(InstrumentError::from)?;

        let output = call(&self.inner).await?;

        let resolved = serde_json::to_value(&output).map_err(InstrumentError::from)?;
        tracing::trace!(operation, event = %events.after, "operation resolved");
        hooks
            .fire(&events.after, &resolved)
            .map_err(InstrumentError::from)?;

        Ok(output)
    }
}

impl<T: fmt::Debug> fmt::Debug for Instrumented<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instrumented")
            .field("inner", &self.inner)
            .field("hooks", &self.hooks)
            .field("type_name", &self.plan.type_name())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// InstrumentedBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for [`Instrumented`].
///
/// Defaults to a fresh, empty registry and no extra exemptions.
#[derive(Debug)]
pub struct InstrumentedBuilder<T> {
    inner: T,
    hooks: Option<Arc<HookRegistry>>,
    exemptions: ExemptionSet,
}

impl<T: Operations> InstrumentedBuilder<T> {
    /// Uses `hooks` as this instance's registry.
    #[must_use]
    pub fn hooks(mut self, hooks: Arc<HookRegistry>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Builds the instance without a registry.
    #[must_use]
    pub fn without_hooks(mut self) -> Self {
        self.hooks = None;
        self
    }

    /// Exempts `operation` on this instance.
    #[must_use]
    pub fn exempt(mut self, operation: impl Into<String>) -> Self {
        self.exemptions.insert(operation);
        self
    }

    /// Replaces the instance exemptions.
    #[must_use]
    pub fn exemptions(mut self, exemptions: ExemptionSet) -> Self {
        self.exemptions = exemptions;
        self
    }

    /// Synthesizes the plan and builds the instrumented object.
    pub fn build(self) -> Result<Instrumented<T>, InstrumentError> {
        let plan = InstrumentationPlan::synthesize(T::operation_set(), &self.exemptions)?;
        Ok(Instrumented {
            inner: self.inner,
            hooks: self.hooks,
            plan,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{OperationDecl, OperationSet};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error("business failure")]
        Business,
        #[error(transparent)]
        Instrument(#[from] InstrumentError),
    }

    #[derive(Debug, Default)]
    struct Counter {
        calls: AtomicUsize,
    }

    impl Counter {
        async fn bump(&self, by: usize) -> Result<usize, TestError> {
            Ok(self.calls.fetch_add(by, Ordering::SeqCst) + by)
        }

        async fn fail(&self) -> Result<usize, TestError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(TestError::Business)
        }
    }

    static COUNTER_OPS: OperationSet = OperationSet::new(
        "Counter",
        &[
            OperationDecl::new("bump"),
            OperationDecl::new("fail"),
            OperationDecl::new("peek").exempt(),
        ],
    );

    impl Operations for Counter {
        fn operation_set() -> &'static OperationSet {
            &COUNTER_OPS
        }
    }

    async fn bump(counter: &Instrumented<Counter>, by: usize) -> Result<usize, TestError> {
        let arguments = Arguments::capture(&(&by,))?;
        counter
            .invoke("bump", arguments, move |inner| inner.bump(by))
            .await
    }

    #[test]
    fn arguments_capture_as_array() {
        let arguments = Arguments::capture(&(&"a", &2)).unwrap();
        assert_eq!(arguments.as_value(), &serde_json::json!(["a", 2]));
        assert_eq!(Arguments::empty().into_value(), serde_json::json!([]));
    }

    #[tokio::test]
    async fn wrapped_call_fires_begin_then_after() {
        let counter = Instrumented::new(Counter::default()).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let hooks = counter.hooks().unwrap();

        for event in ["onBeginBump", "onAfterBump"] {
            let log = Arc::clone(&log);
            hooks
                .register(event, move |payload| {
                    log.lock().unwrap().push((event, payload.clone()));
                })
                .unwrap();
        }

        assert_eq!(bump(&counter, 3).await.unwrap(), 3);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                ("onBeginBump", serde_json::json!([3])),
                ("onAfterBump", serde_json::json!(3)),
            ]
        );
    }

    #[tokio::test]
    async fn detached_instance_fails_before_running() {
        let counter = Instrumented::detached(Counter::default()).unwrap();
        let err = bump(&counter, 1).await.unwrap_err();
        assert!(matches!(err, TestError::Instrument(ref e) if e.is_hooks_not_initialized()));
        assert_eq!(counter.inner().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn attaching_hooks_enables_calls() {
        let mut counter = Instrumented::detached(Counter::default()).unwrap();
        assert!(counter.attach_hooks(Arc::new(HookRegistry::new())).is_none());
        assert_eq!(bump(&counter, 2).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn operation_error_propagates_without_after_event() {
        let counter = Instrumented::new(Counter::default()).unwrap();
        let after = Arc::new(AtomicUsize::new(0));
        let after_clone = Arc::clone(&after);
        counter
            .hooks()
            .unwrap()
            .register("onAfterFail", move |_| {
                after_clone.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        let err = counter
            .invoke("fail", Arguments::empty(), |inner| inner.fail())
            .await
            .unwrap_err();
        assert!(matches!(err, TestError::Business));
        assert_eq!(after.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_operation_is_rejected() {
        let counter = Instrumented::new(Counter::default()).unwrap();
        let err = counter
            .invoke("reset", Arguments::empty(), |inner| inner.bump(0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TestError::Instrument(InstrumentError::UnknownOperation { .. })
        ));
    }

    #[tokio::test]
    async fn exempt_operation_runs_without_registry() {
        let counter = Instrumented::detached(Counter::default()).unwrap();
        let value = counter
            .invoke("peek", Arguments::empty(), |inner| inner.bump(0))
            .await
            .unwrap();
        assert_eq!(value, 0);
    }

    #[tokio::test]
    async fn instance_exemption_bypasses_hooks() {
        let counter = Instrumented::builder(Counter::default())
            .without_hooks()
            .exempt("bump")
            .build()
            .unwrap();
        assert!(!counter.plan().is_wrapped("bump"));
        assert_eq!(bump(&counter, 5).await.unwrap(), 5);
    }
}
