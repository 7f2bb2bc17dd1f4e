use crate::parse::parse_field_args;
use crate::util::lit_str_value;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields};

/// `#[derive(WireCodec)]`: for structs, serializes fields in ascending `#[field(index = N)]`
/// order (the "object has no codec of its own, children sorted by index" rule from the
/// parameter-tree construction algorithm). For enums, serializes as the declared
/// `#[wire(repr = "...")]` underlying integer kind.
pub fn expand(input: DeriveInput) -> syn::Result<TokenStream> {
    match &input.data {
        Data::Struct(data) => expand_struct(&input, data),
        Data::Enum(data) => expand_enum(&input, data),
        Data::Union(_) => Err(syn::Error::new_spanned(&input, "WireCodec cannot be derived for unions")),
    }
}

fn expand_struct(input: &DeriveInput, data: &syn::DataStruct) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(&data.fields, "WireCodec requires named fields"));
    };

    let mut entries = Vec::new();
    for field in &fields.named {
        let attr = field
            .attrs
            .iter()
            .find(|a| a.path().is_ident("field"))
            .ok_or_else(|| syn::Error::new_spanned(field, "missing #[field(index = N)]"))?;
        let index = parse_field_args(attr)?;
        entries.push((index, field.ident.clone().unwrap(), field.ty.clone()));
    }
    entries.sort_by_key(|(index, _, _)| *index);

    let write_stmts = entries.iter().map(|(_, name, _)| {
        quote! { ::arke_core::wire::WireCodec::write(&mut self.#name, w)?; }
    });
    let read_stmts = entries.iter().map(|(_, name, ty)| {
        quote! { #name: <#ty as ::arke_core::wire::WireCodec>::read(r)?, }
    });

    Ok(quote! {
        impl ::arke_core::wire::WireCodec for #name {
            fn write(&mut self, w: &mut dyn ::std::io::Write) -> Result<(), ::arke_core::wire::WireError> {
                #(#write_stmts)*
                Ok(())
            }

            fn read(r: &mut dyn ::std::io::Read) -> Result<Self, ::arke_core::wire::WireError> {
                Ok(#name {
                    #(#read_stmts)*
                })
            }
        }
    })
}

fn expand_enum(input: &DeriveInput, data: &syn::DataEnum) -> syn::Result<TokenStream> {
    let name = &input.ident;

    let repr_attr = input
        .attrs
        .iter()
        .find(|a| a.path().is_ident("wire"))
        .ok_or_else(|| syn::Error::new_spanned(input, "enums require #[wire(repr = \"u8\")]"))?;
    let repr = parse_wire_repr(repr_attr)?;
    let repr_ty: syn::Type = syn::parse_str(&repr)?;

    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(variant, "WireCodec enums must be field-less"));
        }
    }

    let variant_idents: Vec<_> = data.variants.iter().map(|v| &v.ident).collect();

    Ok(quote! {
        impl ::arke_core::wire::WireCodec for #name {
            fn write(&mut self, w: &mut dyn ::std::io::Write) -> Result<(), ::arke_core::wire::WireError> {
                let mut raw = *self as #repr_ty;
                ::arke_core::wire::WireCodec::write(&mut raw, w)
            }

            fn read(r: &mut dyn ::std::io::Read) -> Result<Self, ::arke_core::wire::WireError> {
                let raw = <#repr_ty as ::arke_core::wire::WireCodec>::read(r)?;
                #(
                    if raw == #name::#variant_idents as #repr_ty {
                        return Ok(#name::#variant_idents);
                    }
                )*
                Err(::arke_core::wire::WireError::InvalidEnum(raw as i64))
            }
        }
    })
}

fn parse_wire_repr(attr: &syn::Attribute) -> syn::Result<String> {
    use syn::punctuated::Punctuated;
    use syn::{Meta, Token};

    let metas: Punctuated<Meta, Token![,]> = attr.parse_args_with(Punctuated::parse_terminated)?;
    for meta in metas {
        if let Meta::NameValue(nv) = meta {
            if nv.path.is_ident("repr") {
                return lit_str_value(&nv.value);
            }
        }
    }
    Err(syn::Error::new_spanned(attr, "missing `repr`"))
}
