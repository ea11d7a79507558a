//! Dispatching operations through an instrumented instance.
//!
//! The `<Type>Operations` trait generated by `#[operations]` is implemented
//! for every [`InstrumentedView<Type>`]: the [`Instrumented`] wrapper itself,
//! and [`Inherited`] views that reach an ancestor object embedded in a
//! derived one. Calls made through a view are governed by the plan and
//! registry of the instance the view borrows from.
//!
//! ```text
//! Instrumented<Derived>                  Derived's operations, Derived's plan
//!   .parent() -> Inherited<.., Base>     Base's operations,    Derived's plan
//!     .parent() -> Inherited<.., Root>   Root's operations,    Derived's plan
//! ```

use crate::instrumented::Instrumented;

/// Access to a `P` object through an instrumented instance.
pub trait InstrumentedView<P> {
    /// The type the instance wraps.
    type Target;

    /// Returns the instance whose plan and registry govern calls.
    fn instrumented(&self) -> &Instrumented<Self::Target>;

    /// Projects the wrapped object onto the `P` it contains.
    fn project<'t>(&self, target: &'t Self::Target) -> &'t P
    where
        Self: 't;

    /// Returns the `P` object, for calls that bypass instrumentation.
    fn operand(&self) -> &P {
        self.project(self.instrumented().inner())
    }
}

impl<T> InstrumentedView<T> for Instrumented<T> {
    type Target = T;

    fn instrumented(&self) -> &Instrumented<T> {
        self
    }

    fn project<'t>(&self, target: &'t T) -> &'t T
    where
        Self: 't,
    {
        target
    }
}

/// A view of the `Q` ancestor embedded in the `P` seen by `S`.
///
/// Built by the `parent()` accessor that `#[operations(extends = .., via = ..)]`
/// generates.
pub struct Inherited<'a, S: ?Sized, P, Q> {
    source: &'a S,
    project: fn(&P) -> &Q,
}

impl<'a, S: ?Sized, P, Q> Inherited<'a, S, P, Q> {
    /// Creates a view reaching `Q` through `project`.
    pub fn new(source: &'a S, project: fn(&P) -> &Q) -> Self {
        Self { source, project }
    }
}

impl<S: ?Sized, P, Q> Clone for Inherited<'_, S, P, Q> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ?Sized, P, Q> Copy for Inherited<'_, S, P, Q> {}

impl<S, P, Q> InstrumentedView<Q> for Inherited<'_, S, P, Q>
where
    S: InstrumentedView<P> + ?Sized,
{
    type Target = S::Target;

    fn instrumented(&self) -> &Instrumented<S::Target> {
        self.source.instrumented()
    }

    fn project<'t>(&self, target: &'t S::Target) -> &'t Q
    where
        Self: 't,
    {
        (self.project)(self.source.project(target))
    }
}
