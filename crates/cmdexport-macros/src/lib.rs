//! # Cmdexport Macros
//!
//! `#[export]` keeps the annotated function as written and adds a slot to the
//! `cmdexport::COMMANDS` region, exported under the function's rendered signature.
//!
//! ## Invariants
//! - The rendered signature only uses spellings the table builder's vocabulary accepts.
//!   A parameter or return type outside that set is a compile error at the type.
//! - The slot symbol and the `Export::signature` it points at are the same string, so a
//!   rendered signature must be unique within a binary.
//! - No `Vec` of a zero-sized element is exported; its count would not be backed by bytes.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::format_ident;
use quote::quote;
use syn::FnArg;
use syn::GenericArgument;
use syn::ItemFn;
use syn::LitStr;
use syn::Pat;
use syn::PathArguments;
use syn::ReturnType;
use syn::Type;
use syn::ext::IdentExt;
use syn::parse_macro_input;
use syn::spanned::Spanned;

const DEFAULT_PREFIX: &str = "ex_";

const SCALARS: &[&str] = &[
    "i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64", "f32", "f64", "bool", "String",
];

/// Exports a free function into the command region.
///
/// The slot symbol is named after the rendered signature, so two exports with the same
/// prefix, name and types anywhere in one binary fail to link as duplicate symbols.
/// Give one of them another name or another `prefix`.
///
/// ```ignore
/// #[export]
/// fn add(a: i32, b: i32) -> i32 { a + b }
///
/// #[export(prefix = "admin_")]
/// fn shutdown() {}
/// ```
#[proc_macro_attribute]
pub fn export(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut prefix = DEFAULT_PREFIX.to_string();
    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("prefix") {
            let lit: LitStr = meta.value()?.parse()?;
            prefix = lit.value();
            Ok(())
        } else {
            Err(meta.error("unsupported export option, expected `prefix = \"...\"`"))
        }
    });
    parse_macro_input!(attr with parser);

    let func = parse_macro_input!(item as ItemFn);
    match expand(&prefix, &func) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

struct Param {
    name: String,
    rendered: String,
    /// The type the frame is decoded into.
    decode_ty: TokenStream2,
    /// Passed as `&String` where the function takes `&str`.
    by_ref: bool,
}

fn expand(prefix: &str, func: &ItemFn) -> syn::Result<TokenStream2> {
    let sig = &func.sig;
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new(sig.generics.span(), "exported functions cannot be generic"));
    }
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new(asyncness.span(), "exported functions cannot be async"));
    }
    if let Some(variadic) = &sig.variadic {
        return Err(syn::Error::new(variadic.span(), "exported functions cannot be variadic"));
    }

    let mut params = Vec::new();
    for input in &sig.inputs {
        params.push(param(input)?);
    }

    let (ret, fallible) = match &sig.output {
        ReturnType::Default => (None, false),
        ReturnType::Type(_, ty) => match result_ok_type(ty) {
            Some(ok) => (Some(render(ok)?), true),
            None => (Some(render(ty)?), false),
        },
    };

    let signature = signature(prefix, &sig.ident.unraw().to_string(), &params, ret.as_deref());
    let arity = params.len();

    let decoders = params.iter().enumerate().map(|(index, p)| {
        let ident = format_ident!("__arg{}", index);
        let ty = &p.decode_ty;
        quote! {
            let #ident: #ty = ::cmdexport::shim::decode_arg(wire, args, #index)?;
        }
    });
    let call_args = params.iter().enumerate().map(|(index, p)| {
        let ident = format_ident!("__arg{}", index);
        if p.by_ref { quote!(&#ident) } else { quote!(#ident) }
    });

    let fn_name = &sig.ident;
    let call = quote!(#fn_name(#(#call_args),*));
    let encode = if fallible {
        quote!(::cmdexport::shim::encode_result(wire, #call))
    } else {
        quote!(::cmdexport::shim::encode_return(wire, #call))
    };

    Ok(quote! {
        #func

        const _: () = {
            fn __cmdexport_invoke(
                wire: &::cmdexport::cmdpack::WireConfig,
                args: &[::cmdexport::cmdpack::ArgFrame],
            ) -> ::core::result::Result<::std::vec::Vec<u8>, ::cmdexport::Fault> {
                ::cmdexport::shim::check_arity(args, #arity)?;
                #(#decoders)*
                #encode
            }

            static __CMDEXPORT_ENTRY: ::cmdexport::Export = ::cmdexport::Export {
                signature: #signature,
                invoke: __cmdexport_invoke,
            };

            fn __cmdexport_describe() -> &'static ::cmdexport::Export {
                &__CMDEXPORT_ENTRY
            }

            #[::cmdexport::linkme::distributed_slice(::cmdexport::COMMANDS)]
            #[linkme(crate = ::cmdexport::linkme)]
            #[unsafe(export_name = #signature)]
            static __CMDEXPORT_SLOT: ::cmdexport::Slot = ::cmdexport::Slot(__cmdexport_describe);
        };
    })
}

fn signature(prefix: &str, name: &str, params: &[Param], ret: Option<&str>) -> String {
    let params = params
        .iter()
        .map(|p| format!("{}: {}", p.name, p.rendered))
        .collect::<Vec<_>>()
        .join(", ");
    match ret {
        Some(ret) if ret != "()" => format!("{prefix}{name}({params}) -> {ret}"),
        _ => format!("{prefix}{name}({params})"),
    }
}

fn param(input: &FnArg) -> syn::Result<Param> {
    let typed = match input {
        FnArg::Typed(typed) => typed,
        FnArg::Receiver(receiver) => {
            return Err(syn::Error::new(receiver.span(), "exported functions cannot take self"));
        }
    };
    let name = match &*typed.pat {
        Pat::Ident(pat) => pat.ident.unraw().to_string(),
        other => return Err(syn::Error::new(other.span(), "use a plain identifier for exported parameters")),
    };

    if let Type::Reference(reference) = &*typed.ty {
        if reference.mutability.is_none() && is_ident(&reference.elem, "str") {
            return Ok(Param {
                name,
                rendered: "&str".to_string(),
                decode_ty: quote!(::std::string::String),
                by_ref: true,
            });
        }
        return Err(syn::Error::new(reference.span(), "only `&str` may be borrowed by an exported function"));
    }

    let ty = &typed.ty;
    Ok(Param { name, rendered: render(ty)?, decode_ty: quote!(#ty), by_ref: false })
}

/// Renders `ty` in the spelling the signature translator reads.
fn render(ty: &Type) -> syn::Result<String> {
    match ty {
        Type::Paren(inner) => render(&inner.elem),
        Type::Group(inner) => render(&inner.elem),
        Type::Tuple(tuple) if tuple.elems.is_empty() => Ok("()".to_string()),
        Type::Array(array) => {
            let len = match &array.len {
                syn::Expr::Lit(syn::ExprLit { lit: syn::Lit::Int(n), .. }) => n.base10_digits().to_string(),
                other => return Err(syn::Error::new(other.span(), "array length must be an integer literal")),
            };
            Ok(format!("[{}; {}]", render(&array.elem)?, len))
        }
        Type::Path(path) if path.qself.is_none() => {
            let segment = path.path.segments.last().ok_or_else(|| unsupported(ty))?;
            let ident = segment.ident.to_string();
            match &segment.arguments {
                PathArguments::None if SCALARS.contains(&ident.as_str()) => Ok(ident),
                PathArguments::AngleBracketed(args) if ident == "Vec" => {
                    let mut types = args.args.iter().filter_map(|arg| match arg {
                        GenericArgument::Type(ty) => Some(ty),
                        _ => None,
                    });
                    match (types.next(), types.next()) {
                        (Some(element), None) if zero_sized(element) => Err(syn::Error::new(
                            element.span(),
                            "`Vec` of a zero-sized element cannot be exported",
                        )),
                        (Some(element), None) => Ok(format!("Vec<{}>", render(element)?)),
                        _ => Err(unsupported(ty)),
                    }
                }
                _ => Err(unsupported(ty)),
            }
        }
        _ => Err(unsupported(ty)),
    }
}

/// `()`, `[T; 0]`, or an array of those.
fn zero_sized(ty: &Type) -> bool {
    match ty {
        Type::Paren(inner) => zero_sized(&inner.elem),
        Type::Group(inner) => zero_sized(&inner.elem),
        Type::Tuple(tuple) => tuple.elems.is_empty(),
        Type::Array(array) => {
            let empty = matches!(
                &array.len,
                syn::Expr::Lit(syn::ExprLit { lit: syn::Lit::Int(n), .. }) if n.base10_digits() == "0"
            );
            empty || zero_sized(&array.elem)
        }
        _ => false,
    }
}

fn unsupported(ty: &Type) -> syn::Error {
    syn::Error::new(ty.span(), "unsupported type for an exported function")
}

/// `T` if `ty` is spelled `Result<T, ..>`.
fn result_ok_type(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else { return None };
    let segment = path.path.segments.last()?;
    if segment.ident != "Result" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else { return None };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}

fn is_ident(ty: &Type, name: &str) -> bool {
    matches!(ty, Type::Path(path) if path.qself.is_none() && path.path.is_ident(name))
}
