//! Expansion of the `#[capability]` trait attribute.
//!
//! Emits the trait unchanged plus one `CapabilityInfo` entry in the
//! distributed slice, carrying an upcast shim per non-marker supertrait.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Ident, ItemTrait, TypeParamBound};

/// Supertraits that are thread-safety or utility markers, not capability
/// edges.
const MARKER_SUPERTRAITS: &[&str] = &[
    "Send", "Sync", "Unpin", "Sized", "Any", "Debug", "Display", "Clone", "Copy",
];

pub fn expand(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    if !attr.is_empty() {
        return Err(syn::Error::new_spanned(
            attr,
            "#[capability] takes no arguments",
        ));
    }

    let item_trait: ItemTrait = syn::parse2(item)?;
    if !item_trait.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &item_trait.generics,
            "#[capability] traits cannot be generic: resolution is keyed by a single TypeId",
        ));
    }

    let name = &item_trait.ident;
    let (mut saw_send, mut saw_sync) = (false, false);
    let mut extends: Vec<(Ident, syn::Path)> = Vec::new();

    for bound in &item_trait.supertraits {
        let TypeParamBound::Trait(trait_bound) = bound else {
            continue;
        };
        let Some(segment) = trait_bound.path.segments.last() else {
            continue;
        };
        let ident = segment.ident.to_string();
        saw_send |= ident == "Send";
        saw_sync |= ident == "Sync";
        if MARKER_SUPERTRAITS.contains(&ident.as_str()) {
            continue;
        }
        extends.push((segment.ident.clone(), trait_bound.path.clone()));
    }

    if !saw_send || !saw_sync {
        return Err(syn::Error::new_spanned(
            &item_trait.ident,
            "#[capability] traits must declare `Send + Sync` supertraits so \
             resolved instances can be shared across threads",
        ));
    }

    let name_text = name.to_string();
    let info_static = format_ident!("__BEANWIRE_CAPABILITY_{}", name_text.to_uppercase());

    let edges = extends.iter().map(|(super_ident, super_path)| {
        let super_text = super_ident.to_string();
        quote! {
            ::beanwire::SuperCapability {
                id: || ::std::any::TypeId::of::<dyn #super_path>(),
                name: #super_text,
                upcast: |handle: &::beanwire::BeanHandle| -> ::std::option::Option<::beanwire::BeanHandle> {
                    let narrow: ::std::sync::Arc<dyn #name> = handle.view::<dyn #name>()?;
                    let broad: ::std::sync::Arc<dyn #super_path> = narrow;
                    ::std::option::Option::Some(handle.with_capability(broad))
                },
            }
        }
    });

    Ok(quote! {
        #item_trait

        #[::beanwire::linkme::distributed_slice(::beanwire::CAPABILITIES)]
        #[linkme(crate = ::beanwire::linkme)]
        static #info_static: ::beanwire::CapabilityInfo = ::beanwire::CapabilityInfo {
            id: || ::std::any::TypeId::of::<dyn #name>(),
            name: #name_text,
            extends: &[#(#edges),*],
        };
    })
}
