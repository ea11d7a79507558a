//! Instrumentation plan synthesis.
//!
//! [`InstrumentationPlan::synthesize`] is the one-shot transformation that
//! decides, for every operation a type exposes, whether calls are wrapped
//! with begin/after events. The resulting plan is immutable.
//!
//! # Rules
//!
//! - The declaration chain is walked from the most-derived set to the root;
//!   each distinct operation name is planned once, from its most-derived
//!   declaration.
//! - An operation is exempt iff that declaration is marked exempt or its
//!   name is in the [`ExemptionSet`] given at construction. Marks on an
//!   overridden ancestor declaration do not carry over.
//! - Dynamically shaped operations are skipped with a warning rather than
//!   failing the whole plan.
//! - Two operations deriving the same event name fail synthesis, as does one
//!   set declaring the same name twice.
//! - Ancestors are told apart by identity, not by type name, so a chain may
//!   hold same-named types from different modules.

use std::collections::BTreeSet;

use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;
use quillsign_hooks::EventNames;

use crate::error::InstrumentError;
use crate::operation::{OperationSet, OperationShape};

// ─────────────────────────────────────────────────────────────────────────────
// ExemptionSet
// ─────────────────────────────────────────────────────────────────────────────

/// Operation names excluded from instrumentation for one instance.
///
/// Complements the `#[exempt]` marks carried by declarations. Consulted once,
/// when the plan is synthesized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExemptionSet {
    names: BTreeSet<String>,
}

impl ExemptionSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an operation name.
    #[must_use]
    pub fn with(mut self, operation: impl Into<String>) -> Self {
        self.insert(operation);
        self
    }

    /// Adds an operation name, returning `false` if it was already present.
    pub fn insert(&mut self, operation: impl Into<String>) -> bool {
        self.names.insert(operation.into())
    }

    /// Returns `true` if `operation` is exempt.
    #[must_use]
    pub fn contains(&self, operation: &str) -> bool {
        self.names.contains(operation)
    }

    /// Iterates over the exempt names in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Returns the number of names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ExemptionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for ExemptionSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.names.extend(iter.into_iter().map(Into::into));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// InstrumentationPlan
// ─────────────────────────────────────────────────────────────────────────────

/// How calls to one operation are treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedOperation {
    /// Calls fire the contained begin/after events.
    Wrapped(EventNames),
    /// Calls go straight to the operation.
    Exempt,
    /// The signature could not be captured; calls go straight to the operation.
    Skipped,
}

/// The frozen outcome of synthesizing instrumentation for one type.
#[derive(Debug, Clone)]
pub struct InstrumentationPlan {
    type_name: &'static str,
    operations: IndexMap<&'static str, PlannedOperation>,
}

impl InstrumentationPlan {
    /// Synthesizes the plan for `set` and its ancestors.
    pub fn synthesize(
        set: &OperationSet,
        exemptions: &ExemptionSet,
    ) -> Result<Self, InstrumentError> {
        let mut operations = IndexMap::new();
        let mut claimed: HashMap<String, &'static str> = HashMap::new();
        let mut visited: Vec<&OperationSet> = Vec::new();

        for class in set.chain() {
            if visited.iter().any(|seen| core::ptr::eq(*seen, class)) {
                tracing::warn!(
                    type_name = class.type_name(),
                    "operation set chain loops back on itself; stopping the walk"
                );
                break;
            }
            visited.push(class);

            let mut declared_here: HashSet<&str> = HashSet::new();
            for decl in class.operations() {
                let name = decl.name();
                if !declared_here.insert(name) {
                    let qualified = format!("{}::{name}", class.type_name());
                    return Err(InstrumentError::EventNameCollision {
                        event: EventNames::for_operation(name).begin,
                        first: qualified.clone(),
                        second: qualified,
                    });
                }
                if operations.contains_key(name) {
                    // Overridden further down the chain.
                    continue;
                }

                let events = EventNames::for_operation(name);
                if let Some(first) = claimed.insert(events.begin.clone(), name) {
                    return Err(InstrumentError::EventNameCollision {
                        event: events.begin,
                        first: first.to_owned(),
                        second: name.to_owned(),
                    });
                }

                let planned = if decl.is_exempt() || exemptions.contains(name) {
                    PlannedOperation::Exempt
                } else if decl.shape() == OperationShape::Dynamic {
                    tracing::warn!(
                        type_name = class.type_name(),
                        operation = name,
                        "operation signature cannot be captured; skipping instrumentation"
                    );
                    PlannedOperation::Skipped
                } else {
                    PlannedOperation::Wrapped(events)
                };
                operations.insert(name, planned);
            }
        }

        for name in exemptions.iter() {
            if !operations.contains_key(name) {
                tracing::warn!(
                    type_name = set.type_name(),
                    operation = name,
                    "exemption names an undeclared operation"
                );
            }
        }

        let plan = Self {
            type_name: set.type_name(),
            operations,
        };
        tracing::debug!(
            type_name = plan.type_name,
            wrapped = plan.wrapped().count(),
            total = plan.operations.len(),
            "synthesized instrumentation plan"
        );
        Ok(plan)
    }

    /// Returns the name of the instrumented type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns how `operation` is treated, or `None` if it is undeclared.
    #[must_use]
    pub fn get(&self, operation: &str) -> Option<&PlannedOperation> {
        self.operations.get(operation)
    }

    /// Returns the events of a wrapped operation.
    #[must_use]
    pub fn events(&self, operation: &str) -> Option<&EventNames> {
        match self.operations.get(operation) {
            Some(PlannedOperation::Wrapped(events)) => Some(events),
            _ => None,
        }
    }

    /// Returns `true` if calls to `operation` fire events.
    #[must_use]
    pub fn is_wrapped(&self, operation: &str) -> bool {
        self.events(operation).is_some()
    }

    /// Returns `true` if `operation` is declared anywhere in the chain.
    #[must_use]
    pub fn declares(&self, operation: &str) -> bool {
        self.operations.contains_key(operation)
    }

    /// Iterates over wrapped operations and their events, in declaration order.
    pub fn wrapped(&self) -> impl Iterator<Item = (&'static str, &EventNames)> {
        self.operations
            .iter()
            .filter_map(|(name, planned)| match planned {
                PlannedOperation::Wrapped(events) => Some((*name, events)),
                _ => None,
            })
    }

    /// Iterates over every planned operation, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &PlannedOperation)> {
        self.operations.iter().map(|(name, planned)| (*name, planned))
    }
}
