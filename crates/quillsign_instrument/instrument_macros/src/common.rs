//! Shared utilities for operation macro code generation.

use syn::{Attribute, FnArg, Ident, Pat, ReturnType, Signature, Type};

/// Validates that an operation takes `&self`.
pub(crate) fn validate_receiver(sig: &Signature) -> syn::Result<()> {
    match sig.inputs.first() {
        Some(FnArg::Receiver(receiver)) => {
            if receiver.mutability.is_some() {
                return Err(syn::Error::new_spanned(
                    receiver,
                    "#[operations] methods must take `&self`, not `&mut self`; \
                     instrumented calls only hold a shared reference",
                ));
            }
            if receiver.reference.is_none() {
                return Err(syn::Error::new_spanned(
                    receiver,
                    "#[operations] methods must take `&self`, not `self` by value",
                ));
            }
            Ok(())
        }
        _ => Err(syn::Error::new_spanned(
            sig.fn_token,
            "#[operations] methods must take `&self` as the first parameter",
        )),
    }
}

/// Returns `true` if the method is an operation: async with a receiver.
pub(crate) fn is_operation(sig: &Signature) -> bool {
    sig.asyncness.is_some() && matches!(sig.inputs.first(), Some(FnArg::Receiver(_)))
}

/// Returns `true` if the signature cannot be captured as a fixed argument list.
///
/// Type or const generics and `impl Trait` arguments make a method dynamic.
/// Lifetime-only generics do not.
pub(crate) fn is_dynamic(sig: &Signature) -> bool {
    let generic = sig.generics.type_params().next().is_some()
        || sig.generics.const_params().next().is_some();
    let impl_trait_arg = sig.inputs.iter().any(|arg| {
        matches!(arg, FnArg::Typed(pat_type) if matches!(*pat_type.ty, Type::ImplTrait(_)))
    });
    generic || impl_trait_arg
}

/// Extracts `(ident, type)` for every non-receiver parameter.
///
/// Only plain identifier patterns are accepted, since each argument is
/// forwarded by name.
pub(crate) fn typed_params(sig: &Signature) -> syn::Result<Vec<(Ident, Type)>> {
    sig.inputs
        .iter()
        .filter_map(|arg| match arg {
            FnArg::Typed(pat_type) => Some(pat_type),
            FnArg::Receiver(_) => None,
        })
        .map(|pat_type| match &*pat_type.pat {
            Pat::Ident(pat_ident) if pat_ident.subpat.is_none() => {
                Ok((pat_ident.ident.clone(), (*pat_type.ty).clone()))
            }
            other => Err(syn::Error::new_spanned(
                other,
                "#[operations] arguments must be plain identifiers",
            )),
        })
        .collect()
}

/// Checks if a return type is `Result<T, E>`.
pub(crate) fn is_result_type(return_type: &ReturnType) -> bool {
    if let ReturnType::Type(_, ty) = return_type
        && let Type::Path(type_path) = ty.as_ref()
        && let Some(segment) = type_path.path.segments.last()
    {
        return segment.ident == "Result";
    }
    false
}

/// Returns `true` if the attributes contain `#[exempt]`.
pub(crate) fn has_exempt_attr(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident("exempt"))
}

/// Returns the `#[doc]` attributes.
pub(crate) fn doc_attrs(attrs: &[Attribute]) -> Vec<&Attribute> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .collect()
}

/// Returns the last path segment of the impl target.
pub(crate) fn type_name_str(ty: &Type) -> syn::Result<String> {
    if let Type::Path(type_path) = ty
        && let Some(segment) = type_path.path.segments.last()
    {
        return Ok(segment.ident.to_string());
    }
    Err(syn::Error::new_spanned(
        ty,
        "#[operations] impl target must be a path type",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn dynamic_detection() {
        let generic: Signature = parse_quote!(async fn f<T: Into<String>>(&self, t: T));
        let impl_arg: Signature = parse_quote!(async fn f(&self, t: impl AsRef<str>));
        let lifetime_only: Signature = parse_quote!(async fn f<'a>(&self, t: &'a str));
        assert!(is_dynamic(&generic));
        assert!(is_dynamic(&impl_arg));
        assert!(!is_dynamic(&lifetime_only));
    }

    #[test]
    fn operation_detection() {
        let op: Signature = parse_quote!(async fn f(&self));
        let sync: Signature = parse_quote!(fn f(&self));
        let assoc: Signature = parse_quote!(async fn f(x: u8));
        assert!(is_operation(&op));
        assert!(!is_operation(&sync));
        assert!(!is_operation(&assoc));
    }

    #[test]
    fn receiver_validation() {
        let shared: Signature = parse_quote!(async fn f(&self));
        let exclusive: Signature = parse_quote!(async fn f(&mut self));
        let owned: Signature = parse_quote!(async fn f(self));
        assert!(validate_receiver(&shared).is_ok());
        assert!(validate_receiver(&exclusive).is_err());
        assert!(validate_receiver(&owned).is_err());
    }

    #[test]
    fn typed_params_require_identifiers() {
        let ok: Signature = parse_quote!(async fn f(&self, id: String, mut n: u8));
        let params = typed_params(&ok).unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[1].0, "n");

        let tuple: Signature = parse_quote!(async fn f(&self, (a, b): (u8, u8)));
        assert!(typed_params(&tuple).is_err());
    }

    #[test]
    fn result_detection() {
        let result: ReturnType = parse_quote!(-> Result<u8, Error>);
        let qualified: ReturnType = parse_quote!(-> std::io::Result<u8>);
        let plain: ReturnType = parse_quote!(-> u8);
        assert!(is_result_type(&result));
        assert!(is_result_type(&qualified));
        assert!(!is_result_type(&plain));
        assert!(!is_result_type(&ReturnType::Default));
    }
}
