use crate::parse::{parse_handler_args, parse_param_args, Direction};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Fields};

/// `#[derive(Handler)]`: reads `#[handler(category = N, method = N, auth_level = N)]` on the
/// struct and `#[param(index = N, dir = "in" | "out")]` on its fields, and emits:
/// - `HandlerSchema` (the `(category, method, auth_level)` triple plus sorted parameter trees)
/// - `Handler` (the dispatch/registry trait object), whose `is_valid`/`process`/notification
///   draining delegate to a hand-written `HandlerLogic` impl for the same type.
pub fn expand(input: DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;

    let handler_attr = input
        .attrs
        .iter()
        .find(|a| a.path().is_ident("handler"))
        .ok_or_else(|| syn::Error::new_spanned(&input, "missing #[handler(category = N, method = N)]"))?;
    let handler_args = parse_handler_args(handler_attr)?;

    let data = match &input.data {
        syn::Data::Struct(data) => data,
        _ => return Err(syn::Error::new_spanned(&input, "Handler can only be derived for structs")),
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(&input, "Handler requires named fields"));
    };

    let mut inputs = Vec::new();
    let mut outputs = Vec::new();

    for field in &fields.named {
        let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("param")) else {
            continue;
        };
        let args = parse_param_args(attr)?;
        let entry = (args.index, field.ident.clone().unwrap(), field.ty.clone());
        match args.direction {
            Direction::In => inputs.push(entry),
            Direction::Out => outputs.push(entry),
        }
    }

    inputs.sort_by_key(|(index, _, _)| *index);
    outputs.sort_by_key(|(index, _, _)| *index);

    let input_nodes = inputs.iter().map(|(index, ident, ty)| param_node(*index, ident, ty, true));
    let output_nodes = outputs.iter().map(|(index, ident, ty)| param_node(*index, ident, ty, false));

    let deserialize_stmts = inputs.iter().map(|(_, ident, _)| {
        quote! { self.#ident = ::arke_core::wire::WireCodec::read(r)?; }
    });
    let serialize_stmts = outputs.iter().map(|(_, ident, _)| {
        quote! { ::arke_core::wire::WireCodec::write(&mut self.#ident, w)?; }
    });

    let category = handler_args.category;
    let method = handler_args.method;
    let auth_level = handler_args.auth_level;

    Ok(quote! {
        impl ::arke_core::schema::HandlerSchema for #name {
            const CATEGORY: u8 = #category;
            const METHOD: u8 = #method;
            const REQUIRED_AUTH_LEVEL: u8 = #auth_level;
            const INPUT: &'static [::arke_core::schema::ParamNode] = &[ #(#input_nodes),* ];
            const OUTPUT: &'static [::arke_core::schema::ParamNode] = &[ #(#output_nodes),* ];
        }

        impl ::arke_core::handler::Handler for #name
        where
            #name: ::arke_core::handler::HandlerLogic,
        {
            fn deserialize_input(&mut self, r: &mut dyn ::std::io::Read) -> Result<(), ::arke_core::wire::WireError> {
                #(#deserialize_stmts)*
                Ok(())
            }

            fn serialize_output(&mut self, w: &mut dyn ::std::io::Write) -> Result<(), ::arke_core::wire::WireError> {
                #(#serialize_stmts)*
                Ok(())
            }

            fn is_valid(&self) -> ::arke_core::response::ResponseCode {
                ::arke_core::handler::HandlerLogic::is_valid(self)
            }

            fn process(
                &mut self,
                db: &mut dyn ::arke_core::db::DbContext,
                authenticated_id: &mut ::arke_support::AuthenticatedId,
            ) -> Result<::arke_core::response::ResponseCode, ::arke_core::db::DbError> {
                ::arke_core::handler::HandlerLogic::process(self, db, authenticated_id)
            }

            fn drain_notifications(&mut self) -> Vec<::arke_core::handler::Notification> {
                ::std::mem::take(::arke_core::handler::HandlerLogic::outbox(self))
            }

            fn category(&self) -> u8 {
                #category
            }

            fn method(&self) -> u8 {
                #method
            }

            fn required_auth_level(&self) -> u8 {
                #auth_level
            }
        }
    })
}

fn param_node(index: i32, ident: &syn::Ident, ty: &syn::Type, is_input: bool) -> TokenStream {
    let name = ident.to_string();
    let kind = quote!(#ty).to_string();
    let direction = if is_input {
        quote! { ::arke_core::schema::Direction::In }
    } else {
        quote! { ::arke_core::schema::Direction::Out }
    };

    quote! {
        ::arke_core::schema::ParamNode {
            name: #name,
            index: #index,
            direction: #direction,
            kind: #kind,
        }
    }
}
