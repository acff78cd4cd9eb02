//! The `#[controller]` attribute.
//!
//! Applied to an inherent `impl` block, it keeps the block as written and
//! adds a `::lectern::Controller` impl whose action table is every `pub`
//! method shaped `fn(&self, &ActionRequest) -> ActionResult<T>`, async or not.

use lectern_core::RESERVED_ACTIONS;
use proc_macro::TokenStream;
use quote::quote;
use syn::{
    FnArg, GenericArgument, Ident, ImplItem, ImplItemFn, ItemImpl, LitStr, PathArguments,
    ReturnType, Token, Type, Visibility, bracketed,
    parse::{Parse, ParseStream},
    parse_macro_input,
    punctuated::Punctuated,
};

/// Arguments for the `#[controller]` macro.
pub(crate) struct ControllerArgs {
    /// Controller name used for responder hooks.
    pub name: Option<String>,
    /// The common action output type.
    pub output: Option<Type>,
    /// Methods that must never be reachable as actions.
    pub protected: Vec<Ident>,
}

impl Parse for ControllerArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut name = None;
        let mut output = None;
        let mut protected = Vec::new();

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "name" => {
                    let lit: LitStr = input.parse()?;
                    name = Some(lit.value());
                }
                "output" => {
                    output = Some(input.parse()?);
                }
                "protected" => {
                    let content;
                    bracketed!(content in input);
                    let names = Punctuated::<Ident, Token![,]>::parse_terminated(&content)?;
                    protected.extend(names);
                }
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {}", other),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(ControllerArgs {
            name,
            output,
            protected,
        })
    }
}

pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ControllerArgs);
    let input = parse_macro_input!(item as ItemImpl);

    match generate(&args, &input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn generate(args: &ControllerArgs, input: &ItemImpl) -> syn::Result<proc_macro2::TokenStream> {
    if let Some((_, path, _)) = &input.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[controller] goes on an inherent impl block, not a trait impl",
        ));
    }

    let self_ty = &input.self_ty;
    let (impl_generics, _, where_clause) = input.generics.split_for_impl();

    let protected: Vec<String> = args.protected.iter().map(Ident::to_string).collect();
    let mut actions = Vec::new();
    for item in &input.items {
        let ImplItem::Fn(method) = item else { continue };
        if !is_action(method) {
            continue;
        }

        let name = method.sig.ident.to_string();
        if protected.contains(&name) {
            continue;
        }
        if RESERVED_ACTIONS.iter().any(|reserved| *reserved == name) {
            return Err(syn::Error::new_spanned(
                &method.sig.ident,
                format!("`{}` is reserved and cannot be an action", name),
            ));
        }
        actions.push(method);
    }

    let output = match (&args.output, actions.first()) {
        (Some(ty), _) => ty.clone(),
        (None, Some(first)) => output_of(first).ok_or_else(|| {
            syn::Error::new_spanned(
                &first.sig.output,
                "cannot infer the action output type; add `output = Type`",
            )
        })?,
        (None, None) => {
            return Err(syn::Error::new_spanned(
                self_ty,
                "controller has no actions; add `output = Type` or a `pub fn(&self, &ActionRequest)` method",
            ));
        }
    };

    let controller_name = match &args.name {
        Some(name) => name.clone(),
        None => default_name(self_ty)?,
    };

    let action_names: Vec<String> = actions.iter().map(|m| m.sig.ident.to_string()).collect();
    let arms = actions.iter().map(|method| {
        let ident = &method.sig.ident;
        let literal = ident.to_string();
        if method.sig.asyncness.is_some() {
            quote! {
                #literal => ::core::option::Option::Some(::std::boxed::Box::pin(
                    <#self_ty>::#ident(self, __request)
                )),
            }
        } else {
            quote! {
                #literal => ::core::option::Option::Some(::std::boxed::Box::pin(async move {
                    <#self_ty>::#ident(self, __request)
                })),
            }
        }
    });

    Ok(quote! {
        #input

        impl #impl_generics ::lectern::Controller for #self_ty #where_clause {
            type Output = #output;

            fn name(&self) -> &str {
                #controller_name
            }

            fn actions(&self) -> &[&'static str] {
                &[#(#action_names),*]
            }

            fn protected(&self) -> &[&'static str] {
                &[#(#protected),*]
            }

            fn invoke<'__a>(
                &'__a self,
                __action: &str,
                __request: &'__a ::lectern::ActionRequest,
            ) -> ::core::option::Option<
                ::lectern::BoxFuture<'__a, ::lectern::ActionResult<Self::Output>>,
            > {
                match __action {
                    #(#arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    })
}

/// `pub fn name(&self, request: &T) -> R`: a public method borrowing self
/// and taking exactly one reference argument.
fn is_action(method: &ImplItemFn) -> bool {
    if !matches!(method.vis, Visibility::Public(_)) {
        return false;
    }

    let mut inputs = method.sig.inputs.iter();
    let borrows_self = matches!(
        inputs.next(),
        Some(FnArg::Receiver(receiver)) if receiver.reference.is_some() && receiver.mutability.is_none()
    );
    let takes_request = matches!(
        inputs.next(),
        Some(FnArg::Typed(arg)) if matches!(*arg.ty, Type::Reference(_))
    );

    borrows_self && takes_request && inputs.next().is_none()
}

/// The `T` of an `ActionResult<T>` or `Result<T, E>` return type.
fn output_of(method: &ImplItemFn) -> Option<Type> {
    let ReturnType::Type(_, ty) = &method.sig.output else {
        return None;
    };
    let Type::Path(path) = &**ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    let PathArguments::AngleBracketed(generics) = &segment.arguments else {
        return None;
    };

    generics.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty.clone()),
        _ => None,
    })
}

/// `MainController` becomes `main`.
fn default_name(self_ty: &Type) -> syn::Result<String> {
    let Type::Path(path) = self_ty else {
        return Err(syn::Error::new_spanned(self_ty, "add `name = \"...\"` for this type"));
    };
    let segment = path
        .path
        .segments
        .last()
        .ok_or_else(|| syn::Error::new_spanned(self_ty, "add `name = \"...\"` for this type"))?;

    let ident = segment.ident.to_string();
    let base = ident
        .strip_suffix("Controller")
        .filter(|base| !base.is_empty())
        .unwrap_or(&ident);
    Ok(base.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn args() -> ControllerArgs {
        ControllerArgs {
            name: None,
            output: None,
            protected: Vec::new(),
        }
    }

    #[test]
    fn test_reserved_names_are_rejected() {
        for reserved in RESERVED_ACTIONS {
            let ident = Ident::new(reserved, proc_macro2::Span::call_site());
            let input: ItemImpl = parse_quote! {
                impl MainController {
                    pub fn #ident(&self, request: &ActionRequest) -> ActionResult<String> {
                        Ok(String::new())
                    }
                }
            };

            let err = generate(&args(), &input).unwrap_err();
            assert!(err.to_string().contains("reserved"), "{reserved} was accepted");
        }
    }

    #[test]
    fn test_protected_reserved_name_is_skipped() {
        let input: ItemImpl = parse_quote! {
            impl MainController {
                pub fn index(&self, request: &ActionRequest) -> ActionResult<String> {
                    Ok(String::new())
                }

                pub fn invoke(&self, request: &ActionRequest) -> ActionResult<String> {
                    Ok(String::new())
                }
            }
        };
        let args = ControllerArgs {
            protected: vec![parse_quote!(invoke)],
            ..args()
        };

        assert!(generate(&args, &input).is_ok());
    }

    #[test]
    fn test_default_name() {
        assert_eq!(default_name(&parse_quote!(MainController)).unwrap(), "main");
        assert_eq!(default_name(&parse_quote!(Feeds)).unwrap(), "feeds");
        assert_eq!(default_name(&parse_quote!(Controller)).unwrap(), "controller");
    }
}
