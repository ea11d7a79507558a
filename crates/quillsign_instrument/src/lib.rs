//! Automatic begin/after instrumentation of asynchronous operations.
//!
//! Given a type exposing async operations, this crate produces a wrapped
//! object whose every non-exempt operation fires `onBegin<Op>` with the call
//! arguments before running and `onAfter<Op>` with the resolved value after
//! succeeding, without the operation's author writing any observation code.
//!
//! # Quick Start
//!
//! ```
//! use quillsign_instrument::{InstrumentError, Instrumented, operations};
//! use serde::Serialize;
//!
//! #[derive(Debug, thiserror::Error)]
//! enum ApiError {
//!     #[error(transparent)]
//!     Instrument(#[from] InstrumentError),
//! }
//!
//! #[derive(Debug, Serialize, PartialEq)]
//! struct Created {
//!     id: String,
//! }
//!
//! struct Documents;
//!
//! #[operations]
//! impl Documents {
//!     async fn create(&self, name: String) -> Result<Created, ApiError> {
//!         Ok(Created { id: format!("doc-{name}") })
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let documents = Instrumented::new(Documents)?;
//!     documents.hooks().unwrap().register("onBeginCreate", |args| {
//!         assert_eq!(args, &serde_json::json!(["a"]));
//!     })?;
//!
//!     // Forwarding method generated by `#[operations]`.
//!     let created = documents.create("a".to_string()).await?;
//!     assert_eq!(created, Created { id: "doc-a".into() });
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`OperationSet`] / [`Operations`]: what a type declares (usually via [`operations`])
//! - [`InstrumentationPlan`]: the one-shot synthesis of which calls are wrapped
//! - [`Instrumented`]: the per-instance decorator owning the [`HookRegistry`]
//! - [`InstrumentedView`] / [`Inherited`]: dispatch of own and inherited operations
//! - [`InstrumentError`]: misconfiguration and hook failures
//!
//! [`HookRegistry`]: quillsign_hooks::HookRegistry

// Self-reference so `#[operations]`-generated code can use `quillsign_instrument::` paths within this crate.
extern crate self as quillsign_instrument;

pub mod error;
pub mod instrumented;
pub mod operation;
pub mod plan;
pub mod view;

pub use error::InstrumentError;
pub use instrumented::{Arguments, Instrumented, InstrumentedBuilder};
pub use operation::{OperationDecl, OperationSet, OperationShape, Operations};
pub use plan::{ExemptionSet, InstrumentationPlan, PlannedOperation};
pub use view::{Inherited, InstrumentedView};

// Re-export proc macros.
pub use instrument_macros::operations;
