//! Procedural macros for the keybus distributor.
//!
//! - `#[derive(Event)]`: Implements `keybus::Event` for a struct, routing it by
//!   the field marked `#[key]`. Generics and bounds are preserved.
//!
//! Usage:
//! ```rust,ignore
//! use keybus::Event;
//!
//! #[derive(Event)]
//! struct Notification {
//!     #[key]
//!     username: String,
//!     body: String,
//! }
//! ```
use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Member, parse_macro_input, spanned::Spanned};

/// Derives `keybus::Event`, taking the routing key from the `#[key]` field.
///
/// The key field can be of any type implementing `ToString`. Exactly one
/// field must carry the attribute. Only structs are supported.
#[proc_macro_derive(Event, attributes(key))]
pub fn derive_event(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_event(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_event(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new(
            ident.span(),
            "#[derive(Event)] is only supported on structs; implement keybus::Event manually",
        ));
    };

    let key_field = key_member(&data.fields)?;
    let name = ident.to_string();

    Ok(quote! {
        impl #impl_generics keybus::Event for #ident #ty_generics #where_clause {
            fn key(&self) -> keybus::Result<keybus::Key> {
                ::std::result::Result::Ok(keybus::Key::from(
                    ::std::string::ToString::to_string(&self.#key_field),
                ))
            }

            fn name(&self) -> ::std::borrow::Cow<'static, str> {
                ::std::borrow::Cow::Borrowed(#name)
            }
        }
    })
}

fn key_member(fields: &Fields) -> syn::Result<Member> {
    let mut found = None;
    for (idx, field) in fields.iter().enumerate() {
        if !field.attrs.iter().any(|a| a.path().is_ident("key")) {
            continue;
        }
        if found.is_some() {
            return Err(syn::Error::new(
                field.span(),
                "only one field can be marked #[key]",
            ));
        }
        found = Some(match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(idx.into()),
        });
    }
    found.ok_or_else(|| {
        syn::Error::new(
            fields.span(),
            "#[derive(Event)] needs one field marked #[key]",
        )
    })
}
