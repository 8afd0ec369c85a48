//! Expansion of the `#[injectable]` struct attribute.
//!
//! Emits the struct with `#[inject]` attributes stripped, an `Injectable`
//! impl resolving each injection point, and one `BeanEntry` in the
//! distributed slice per declared capability.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{Expr, Fields, Ident, ItemStruct, Lit, Meta, Path, PathArguments, Token, Type};

#[derive(Default)]
struct Args {
    capabilities: Vec<Path>,
    singleton: bool,
    prototype: bool,
    wired: bool,
    priority: Option<u16>,
    markers: Vec<String>,
}

fn parse_args(attr: TokenStream) -> syn::Result<Args> {
    let mut args = Args::default();
    let metas = Punctuated::<Meta, Token![,]>::parse_terminated.parse2(attr)?;
    for meta in metas {
        match &meta {
            Meta::Path(path) if path.is_ident("singleton") => args.singleton = true,
            Meta::Path(path) if path.is_ident("prototype") => args.prototype = true,
            Meta::Path(path) if path.is_ident("wired") => args.wired = true,
            Meta::NameValue(pair) if pair.path.is_ident("capability") => {
                let Expr::Path(capability) = &pair.value else {
                    return Err(syn::Error::new_spanned(
                        &pair.value,
                        "expected a trait path, e.g. `capability = GreeterService`",
                    ));
                };
                args.capabilities.push(capability.path.clone());
            }
            Meta::List(list) if list.path.is_ident("capabilities") => {
                let paths =
                    list.parse_args_with(Punctuated::<Path, Token![,]>::parse_terminated)?;
                args.capabilities.extend(paths);
            }
            Meta::NameValue(pair) if pair.path.is_ident("priority") => {
                let Expr::Lit(literal) = &pair.value else {
                    return Err(syn::Error::new_spanned(
                        &pair.value,
                        "expected an integer, e.g. `priority = 1`",
                    ));
                };
                let Lit::Int(int) = &literal.lit else {
                    return Err(syn::Error::new_spanned(
                        &literal.lit,
                        "expected an integer, e.g. `priority = 1`",
                    ));
                };
                args.priority = Some(int.base10_parse()?);
            }
            Meta::NameValue(pair) if pair.path.is_ident("marker") => {
                let Expr::Lit(literal) = &pair.value else {
                    return Err(syn::Error::new_spanned(
                        &pair.value,
                        "expected a string, e.g. `marker = \"component\"`",
                    ));
                };
                let Lit::Str(text) = &literal.lit else {
                    return Err(syn::Error::new_spanned(
                        &literal.lit,
                        "expected a string, e.g. `marker = \"component\"`",
                    ));
                };
                args.markers.push(text.value());
            }
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "unrecognized #[injectable] argument; expected `capability = Path`, \
                     `capabilities(..)`, `singleton`, `prototype`, `priority = N`, \
                     `marker = \"name\"` or `wired`",
                ));
            }
        }
    }

    if args.singleton && args.prototype {
        return Err(syn::Error::new(
            proc_macro2::Span::call_site(),
            "`singleton` and `prototype` are mutually exclusive",
        ));
    }
    if args.capabilities.is_empty()
        && (args.singleton
            || args.prototype
            || args.wired
            || args.priority.is_some()
            || !args.markers.is_empty())
    {
        return Err(syn::Error::new(
            proc_macro2::Span::call_site(),
            "scope, priority and marker arguments require a `capability`",
        ));
    }
    Ok(args)
}

/// One `#[inject]` field, classified by its type shape.
enum Point {
    /// `Arc<dyn Capability>`: the single best implementation. Requires the
    /// owning type to provide a default value for the field.
    Single { field: Ident, inner: Type },
    /// `Option<Arc<dyn Capability>>`: the single best implementation, with
    /// `None` as the pre-injection default.
    OptionalSingle { field: Ident, inner: Type },
    /// `Vec<Arc<dyn Capability>>`: every registered implementation.
    Collection { field: Ident, inner: Type },
    /// `Arc<Self>` (or the owning type by name): skipped with a warning at
    /// injection time rather than recursing.
    SelfRef { field: Ident },
}

/// The type argument of `outer<..>` when `ty` is exactly that shape.
fn generic_inner(ty: &Type, outer: &str) -> Option<Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != outer {
        return None;
    }
    let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        return None;
    };
    let mut types = arguments.args.iter().filter_map(|argument| match argument {
        syn::GenericArgument::Type(inner) => Some(inner.clone()),
        _ => None,
    });
    let inner = types.next()?;
    if types.next().is_some() {
        return None;
    }
    Some(inner)
}

fn is_self_type(ty: &Type, owner: &Ident) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    path.path.is_ident("Self") || path.path.is_ident(owner)
}

fn is_map_shaped(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    path.path
        .segments
        .last()
        .is_some_and(|segment| segment.ident == "HashMap" || segment.ident == "BTreeMap")
}

fn classify(field: &Ident, ty: &Type, owner: &Ident) -> syn::Result<Point> {
    if let Some(inner) = generic_inner(ty, "Arc") {
        if is_self_type(&inner, owner) {
            return Ok(Point::SelfRef {
                field: field.clone(),
            });
        }
        return Ok(Point::Single {
            field: field.clone(),
            inner,
        });
    }
    if let Some(element) = generic_inner(ty, "Option") {
        if let Some(inner) = generic_inner(&element, "Arc") {
            if is_self_type(&inner, owner) {
                return Ok(Point::SelfRef {
                    field: field.clone(),
                });
            }
            return Ok(Point::OptionalSingle {
                field: field.clone(),
                inner,
            });
        }
    }
    if let Some(element) = generic_inner(ty, "Vec") {
        if let Some(inner) = generic_inner(&element, "Arc") {
            if is_self_type(&inner, owner) {
                return Ok(Point::SelfRef {
                    field: field.clone(),
                });
            }
            return Ok(Point::Collection {
                field: field.clone(),
                inner,
            });
        }
    }
    if is_map_shaped(ty) {
        return Err(syn::Error::new_spanned(
            ty,
            "map-shaped injection points are not supported; inject a \
             Vec<Arc<dyn Capability>> and key it yourself",
        ));
    }
    Err(syn::Error::new_spanned(
        ty,
        "injection points must be Arc<dyn Capability>, Option<Arc<dyn Capability>> \
         or Vec<Arc<dyn Capability>>",
    ))
}

pub fn expand(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    let args = parse_args(attr)?;
    let mut item_struct: ItemStruct = syn::parse2(item)?;
    let owner = item_struct.ident.clone();
    let owner_text = owner.to_string();

    let mut points = Vec::new();
    if let Fields::Named(fields) = &mut item_struct.fields {
        for field in &mut fields.named {
            let marked = field.attrs.iter().any(|attr| attr.path().is_ident("inject"));
            if !marked {
                continue;
            }
            field.attrs.retain(|attr| !attr.path().is_ident("inject"));
            let Some(name) = field.ident.clone() else {
                continue;
            };
            points.push(classify(&name, &field.ty, &owner)?);
        }
    } else {
        let marked = match &item_struct.fields {
            Fields::Unnamed(fields) => fields
                .unnamed
                .iter()
                .any(|field| field.attrs.iter().any(|attr| attr.path().is_ident("inject"))),
            _ => false,
        };
        if marked {
            return Err(syn::Error::new_spanned(
                &item_struct.fields,
                "#[inject] requires named fields",
            ));
        }
    }

    if args.wired && !points.is_empty() {
        return Err(syn::Error::new_spanned(
            &item_struct.ident,
            "`wired` declares construction satisfies all injection points; \
             remove the #[inject] attributes or the flag",
        ));
    }

    let injectable_impl = if points.is_empty() {
        quote! {
            impl ::beanwire::Injectable for #owner {}
        }
    } else {
        let resolves = points.iter().any(|point| {
            matches!(
                point,
                Point::Single { .. } | Point::OptionalSingle { .. } | Point::Collection { .. }
            )
        });
        let statements = points.iter().map(|point| match point {
            Point::Single { field, inner } => quote! {
                self.#field = context.get_bean::<#inner>()?;
            },
            Point::OptionalSingle { field, inner } => quote! {
                self.#field = ::std::option::Option::Some(context.get_bean::<#inner>()?);
            },
            Point::Collection { field, inner } => quote! {
                self.#field = context.get_beans::<#inner>()?;
            },
            Point::SelfRef { field } => {
                let field_text = field.to_string();
                quote! {
                    ::beanwire::tracing::warn!(
                        "Skipping self-referential injection point '{}.{}'",
                        #owner_text,
                        #field_text
                    );
                }
            }
        });
        let quiet = (!resolves).then(|| quote! { let _ = context; });
        quote! {
            impl ::beanwire::Injectable for #owner {
                fn inject(
                    &mut self,
                    context: &::beanwire::Context,
                ) -> ::beanwire::Result<()> {
                    #quiet
                    #(#statements)*
                    ::std::result::Result::Ok(())
                }
            }
        }
    };

    let mut marker_tokens = Vec::new();
    if args.singleton {
        marker_tokens.push(quote!(::beanwire::Marker::Singleton));
    }
    if args.prototype {
        marker_tokens.push(quote!(::beanwire::Marker::Prototype));
    }
    if args.wired {
        marker_tokens.push(quote!(::beanwire::Marker::Wired));
    }
    for marker in &args.markers {
        marker_tokens.push(quote!(::beanwire::Marker::Custom(#marker)));
    }

    let priority = match args.priority {
        Some(value) => quote!(#value),
        None => quote!(::beanwire::DEFAULT_PRIORITY),
    };

    let entries = args.capabilities.iter().enumerate().map(|(index, capability)| {
        let capability_text = capability
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .unwrap_or_default();
        let entry_static = format_ident!(
            "__BEANWIRE_ENTRY_{}_{}",
            owner_text.to_uppercase(),
            index
        );
        quote! {
            #[::beanwire::linkme::distributed_slice(::beanwire::BEANS)]
            #[linkme(crate = ::beanwire::linkme)]
            static #entry_static: ::beanwire::BeanEntry = ::beanwire::BeanEntry {
                capability: || ::std::any::TypeId::of::<dyn #capability>(),
                capability_name: #capability_text,
                implementation: || ::std::any::TypeId::of::<#owner>(),
                implementation_name: #owner_text,
                priority: #priority,
                markers: &[#(#marker_tokens),*],
                construct: || ::std::result::Result::Ok(::std::boxed::Box::new(
                    <#owner as ::std::default::Default>::default(),
                )),
                seal: ::beanwire::seal_bean!(dyn #capability, #owner),
                recast: ::beanwire::recast_bean!(dyn #capability, #owner),
            };
        }
    });

    Ok(quote! {
        #item_struct

        #injectable_impl

        #(#entries)*
    })
}
