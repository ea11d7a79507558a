//! Code generation for `#[operations]` on impl blocks.

use std::collections::HashMap;

use proc_macro2::TokenStream;
use quillsign_hooks::naming::operation_name;
use quote::{format_ident, quote};
use syn::meta::ParseNestedMeta;
use syn::{ImplItem, ImplItemFn, ItemImpl, ReturnType};

use crate::common::{
    doc_attrs, has_exempt_attr, is_dynamic, is_operation, is_result_type, type_name_str,
    typed_params, validate_receiver,
};

/// Name of the generated accessor for inherited operations.
const PARENT_ACCESSOR: &str = "parent";

/// Arguments accepted by `#[operations(...)]`.
#[derive(Default)]
pub(crate) struct OperationsArgs {
    /// Type whose operation set this one extends.
    extends: Option<syn::Path>,
    /// Field holding the parent object.
    via: Option<syn::Member>,
}

impl OperationsArgs {
    pub(crate) fn parse(&mut self, meta: ParseNestedMeta<'_>) -> syn::Result<()> {
        if meta.path.is_ident("extends") {
            self.extends = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("via") {
            self.via = Some(meta.value()?.parse()?);
            Ok(())
        } else {
            Err(meta.error(
                "unsupported #[operations] argument; expected `extends = Type` or `via = field`",
            ))
        }
    }

    /// Returns the parent type and the field holding it, if any.
    fn parent(&self) -> syn::Result<Option<(&syn::Path, &syn::Member)>> {
        match (&self.extends, &self.via) {
            (Some(parent), Some(field)) => Ok(Some((parent, field))),
            (None, None) => Ok(None),
            (Some(parent), None) => Err(syn::Error::new_spanned(
                parent,
                "`extends` requires `via = field` naming the field that holds the parent",
            )),
            (None, Some(field)) => Err(syn::Error::new_spanned(
                field,
                "`via` is only meaningful together with `extends = Type`",
            )),
        }
    }
}

/// One discovered operation.
struct Operation {
    method: ImplItemFn,
    name: String,
    exempt: bool,
    dynamic: bool,
}

/// Generates declarations and forwarding proxies for an impl block.
///
/// `qi` is the resolved path to `quillsign_instrument`.
pub(crate) fn generate_operations(
    input: &ItemImpl,
    args: &OperationsArgs,
    qi: &TokenStream,
) -> TokenStream {
    expand(input, args, qi).unwrap_or_else(syn::Error::into_compile_error)
}

fn expand(input: &ItemImpl, args: &OperationsArgs, qi: &TokenStream) -> syn::Result<TokenStream> {
    if let Some((_, path, _)) = &input.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[operations] must be applied to an inherent impl block",
        ));
    }
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "#[operations] does not support generic impl blocks",
        ));
    }

    let self_ty = &input.self_ty;
    let type_name = type_name_str(self_ty)?;
    let parent = args.parent()?;
    let operations = discover(input, parent.is_some())?;

    // Input impl block with #[exempt] stripped
    let cleaned_items = input.items.iter().map(|item| match item {
        ImplItem::Fn(method) => {
            let mut cleaned = method.clone();
            cleaned.attrs.retain(|attr| !attr.path().is_ident("exempt"));
            ImplItem::Fn(cleaned)
        }
        other => other.clone(),
    });
    let impl_attrs = &input.attrs;

    let decls = operations.iter().map(|op| {
        let name = &op.name;
        let exempt = op.exempt.then(|| quote!(.exempt()));
        let dynamic = op.dynamic.then(|| quote!(.dynamic()));
        quote! { #qi::OperationDecl::new(#name) #exempt #dynamic }
    });
    let extends = parent.map(|(parent, _)| {
        quote! { .extends(<#parent as #qi::Operations>::operation_set) }
    });

    let trait_name = format_ident!("{}Operations", type_name);
    let trait_doc = format!("Instrumented forwarding methods for [`{type_name}`].");
    let mut declarations = operations
        .iter()
        .map(proxy_signature)
        .collect::<syn::Result<Vec<_>>>()?;
    let mut proxies = operations
        .iter()
        .map(|op| proxy(op, self_ty, qi))
        .collect::<syn::Result<Vec<_>>>()?;

    if let Some((parent, field)) = parent {
        let accessor = format_ident!("{}", PARENT_ACCESSOR);
        let parent_name = parent
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .unwrap_or_default();
        let doc = format!(
            "Returns the operations inherited from `{parent_name}`, dispatched through this \
             instance's plan and registry."
        );
        let signature = quote! {
            #[doc = #doc]
            fn #accessor(&self) -> #qi::Inherited<'_, Self, #self_ty, #parent>
        };
        proxies.push(quote! {
            #signature {
                #qi::Inherited::new(self, |__child: &#self_ty| &__child.#field)
            }
        });
        declarations.push(signature);
    }

    Ok(quote! {
        #(#impl_attrs)*
        impl #self_ty {
            #(#cleaned_items)*
        }

        impl #qi::Operations for #self_ty {
            fn operation_set() -> &'static #qi::OperationSet {
                static OPERATIONS: #qi::OperationSet =
                    #qi::OperationSet::new(#type_name, &[#(#decls),*]) #extends;
                &OPERATIONS
            }
        }

        #[doc = #trait_doc]
        pub trait #trait_name {
            #(#declarations;)*
        }

        impl<__View> #trait_name for __View
        where
            __View: #qi::InstrumentedView<#self_ty> + ?Sized,
        {
            #(#proxies)*
        }
    })
}

/// Collects every async `&self` method, validating operation shape.
///
/// Two methods deriving the same operation name (`create` and `_create`)
/// are rejected, as they would share one event pair.
fn discover(input: &ItemImpl, has_parent: bool) -> syn::Result<Vec<Operation>> {
    let mut operations = Vec::new();
    let mut claimed: HashMap<String, syn::Ident> = HashMap::new();

    for item in &input.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        let exempt = has_exempt_attr(&method.attrs);

        if !is_operation(&method.sig) {
            if exempt {
                return Err(syn::Error::new_spanned(
                    &method.sig.ident,
                    "#[exempt] only applies to async methods taking `&self`",
                ));
            }
            continue;
        }

        validate_receiver(&method.sig)?;
        typed_params(&method.sig)?;
        let dynamic = is_dynamic(&method.sig);

        if !exempt && !dynamic && !is_result_type(&method.sig.output) {
            return Err(syn::Error::new_spanned(
                &method.sig.output,
                "instrumented operations must return `Result<T, E>`; \
                 mark the method #[exempt] to opt out",
            ));
        }

        let ident = &method.sig.ident;
        if has_parent && ident == PARENT_ACCESSOR {
            return Err(syn::Error::new_spanned(
                ident,
                "`parent` is reserved for the inherited-operations accessor of `extends`",
            ));
        }

        let name = operation_name(&ident.to_string());
        if let Some(first) = claimed.insert(name.clone(), ident.clone()) {
            return Err(syn::Error::new_spanned(
                ident,
                format!("`{ident}` and `{first}` both derive the operation name `{name}`"),
            ));
        }

        operations.push(Operation {
            name,
            method: method.clone(),
            exempt,
            dynamic,
        });
    }

    Ok(operations)
}

/// Builds the trait-side signature: the original parameters, with the
/// result returned as `impl Future`.
fn proxy_signature(op: &Operation) -> syn::Result<TokenStream> {
    let sig = &op.method.sig;
    let ident = &sig.ident;
    let generics = &sig.generics;
    let where_clause = &sig.generics.where_clause;
    let output = match &sig.output {
        ReturnType::Default => quote!(()),
        ReturnType::Type(_, ty) => quote!(#ty),
    };
    let params = typed_params(sig)?
        .into_iter()
        .map(|(name, ty)| quote! { #name: #ty });
    let docs = method_docs(op);

    Ok(quote! {
        #docs
        fn #ident #generics (&self, #(#params),*)
            -> impl ::core::future::Future<Output = #output> #where_clause
    })
}

/// Returns the method's doc comments, or a generated line if it has none.
fn method_docs(op: &Operation) -> TokenStream {
    let docs = doc_attrs(&op.method.attrs);
    if !docs.is_empty() {
        return quote! { #(#docs)* };
    }
    let line = if op.exempt || op.dynamic {
        format!("Calls `{}` without instrumentation.", op.name)
    } else {
        format!("Calls `{}`, firing its begin and after events.", op.name)
    };
    quote! { #[doc = #line] }
}

fn proxy(op: &Operation, self_ty: &syn::Type, qi: &TokenStream) -> syn::Result<TokenStream> {
    let sig = &op.method.sig;
    let ident = &sig.ident;
    let generics = &sig.generics;
    let where_clause = &sig.generics.where_clause;
    let output = &sig.output;
    let name = &op.name;
    let params = typed_params(sig)?;
    let args: Vec<_> = params.iter().map(|(ident, _)| ident).collect();
    let typed = params.iter().map(|(name, ty)| quote! { #name: #ty });
    let view = quote! { #qi::InstrumentedView::<#self_ty> };

    let body = if op.exempt || op.dynamic {
        quote! {
            #view::operand(self).#ident(#(#args),*).await
        }
    } else {
        let capture = if args.is_empty() {
            quote! { #qi::Arguments::empty() }
        } else {
            quote! { #qi::Arguments::capture(&(#(&#args,)*))? }
        };
        quote! {
            let __arguments = #capture;
            let __view = self;
            #qi::Instrumented::invoke(
                #view::instrumented(__view),
                #name,
                __arguments,
                move |__target| #view::project(__view, __target).#ident(#(#args),*),
            )
            .await
        }
    };

    Ok(quote! {
        async fn #ident #generics (&self, #(#typed),*) #output #where_clause {
            #body
        }
    })
}
