//! Hook registry for instrumented operations.
//!
//! This crate provides the observation side of Quillsign's instrumentation
//! layer: a registry mapping event names to a single handler each, and the
//! naming rules that turn an operation name into its lifecycle events.
//!
//! # Design Principles
//!
//! - At most one handler per event name; the last registration wins
//! - Firing an event nobody listens to is a no-op
//! - Handler failures propagate to whoever fired the event
//!
//! # Architecture
//!
//! - **Naming** ([`naming`]): `onBegin<Op>` / `onAfter<Op>` derivation
//! - **Registry** ([`registry`]): registration and dispatch
//! - **Errors** ([`error`]): [`HookError`]
//!
//! # Example
//!
//! ```
//! use quillsign_hooks::{EventNames, HookRegistry};
//! use serde_json::json;
//!
//! let hooks = HookRegistry::new();
//! let events = EventNames::for_operation("submitDocument");
//!
//! hooks.register(&events.begin, |args| {
//!     println!("submitting {args}");
//! })?;
//!
//! hooks.fire(&events.begin, &json!(["contract.pdf"]))?;
//! // No handler for the after-event: silently ignored.
//! hooks.fire(&events.after, &json!({"id": "abc"}))?;
//! # Ok::<(), quillsign_hooks::HookError>(())
//! ```

pub mod error;
pub mod naming;
pub mod registry;

pub use error::{BoxError, HookError};
pub use naming::{EventNames, EventPrefix, ON_ERROR, derive_event_name};
pub use registry::{Handler, HookRegistry};
