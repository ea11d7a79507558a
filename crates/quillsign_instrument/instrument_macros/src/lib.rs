//! Procedural macros for Quillsign operation instrumentation.
//!
//! Provides `#[operations]`, which discovers the async operations of an
//! impl block and generates their declarations and instrumented proxies.

mod common;
mod operations;

use proc_macro::TokenStream;
use quillsign_macro_utils::{QuillsignCrate, resolve_crate_path};

/// Declares the async operations of an impl block for instrumentation.
///
/// Every `async fn` taking `&self` is an operation, named after the
/// lowerCamelCase form of the method (`get_document_data` becomes
/// `getDocumentData`). Other items are left alone.
///
/// Generates:
/// - an `Operations` impl listing the declarations, and
/// - a `<Type>Operations` trait with one forwarding method per operation,
///   same parameters as the original and the result returned as
///   `impl Future`. It is implemented for every `InstrumentedView<Type>`,
///   `Instrumented<Type>` included.
///
/// Two methods deriving the same operation name (`create` and `_create`)
/// are a compile error.
///
/// # Attributes
///
/// - `#[exempt]` on a method: calls are forwarded without firing events.
///   The mark is not inherited by overriding declarations.
/// - `#[operations(extends = Base, via = field)]`: links `Base`'s
///   declarations as the parent set and adds a `parent()` accessor whose
///   view exposes `Base`'s operations, reached through `self.field` and
///   instrumented under the derived instance's plan.
///
/// Generic methods are declared dynamic: forwarded directly and reported
/// as skipped when the plan is synthesized. Non-exempt operations must
/// return `Result<T, E>` with `E: From<InstrumentError>`.
///
/// # Example
///
/// ```ignore
/// use quillsign_instrument::operations;
///
/// struct Documents;
///
/// #[operations]
/// impl Documents {
///     async fn submit(&self, name: String) -> Result<Receipt, ApiError> {
///         // ...
///     }
///
///     #[exempt]
///     async fn download(&self, id: String) -> Result<Vec<u8>, ApiError> {
///         // ...
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn operations(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut args = operations::OperationsArgs::default();
    let parser = syn::meta::parser(|meta| args.parse(meta));
    syn::parse_macro_input!(attr with parser);

    let input = syn::parse_macro_input!(item as syn::ItemImpl);
    let qi = resolve_crate_path(QuillsignCrate::Instrument);
    operations::generate_operations(&input, &args, &qi).into()
}
