use crate::util::{eval_index_expr, lit_str_value};
use syn::punctuated::Punctuated;
use syn::{Meta, Token};

#[derive(Clone, Copy, Eq, PartialEq)]
pub enum Direction {
    In,
    Out,
}

pub struct ParamArgs {
    pub index: i32,
    pub direction: Direction,
}

/// Parses a handler field's `#[param(index = N, dir = "in" | "out")]`.
pub fn parse_param_args(attr: &syn::Attribute) -> syn::Result<ParamArgs> {
    let metas: Punctuated<Meta, Token![,]> = attr.parse_args_with(Punctuated::parse_terminated)?;

    let mut index = None;
    let mut direction = None;

    for meta in metas {
        if let Meta::NameValue(nv) = meta {
            if nv.path.is_ident("index") {
                index = Some(eval_index_expr(&nv.value)?);
            } else if nv.path.is_ident("dir") {
                direction = Some(match lit_str_value(&nv.value)?.as_str() {
                    "in" => Direction::In,
                    "out" => Direction::Out,
                    _ => return Err(syn::Error::new_spanned(nv, "dir must be \"in\" or \"out\"")),
                });
            }
        }
    }

    Ok(ParamArgs {
        index: index.ok_or_else(|| syn::Error::new_spanned(attr, "missing `index`"))?,
        direction: direction.ok_or_else(|| syn::Error::new_spanned(attr, "missing `dir`"))?,
    })
}

/// Parses a plain (non-directional) nested-object field's `#[field(index = N)]`.
pub fn parse_field_args(attr: &syn::Attribute) -> syn::Result<i32> {
    let metas: Punctuated<Meta, Token![,]> = attr.parse_args_with(Punctuated::parse_terminated)?;

    for meta in metas {
        if let Meta::NameValue(nv) = meta {
            if nv.path.is_ident("index") {
                return eval_index_expr(&nv.value);
            }
        }
    }

    Err(syn::Error::new_spanned(attr, "missing `index`"))
}

pub struct HandlerArgs {
    pub category: u8,
    pub method: u8,
    pub auth_level: u8,
}

/// Parses the handler container's `#[handler(category = N, method = N, auth_level = N)]`.
pub fn parse_handler_args(attr: &syn::Attribute) -> syn::Result<HandlerArgs> {
    let metas: Punctuated<Meta, Token![,]> = attr.parse_args_with(Punctuated::parse_terminated)?;

    let mut category = None;
    let mut method = None;
    let mut auth_level = 0u8;

    for meta in metas {
        if let Meta::NameValue(nv) = meta {
            let value = eval_index_expr(&nv.value)?;
            if nv.path.is_ident("category") {
                category = Some(value as u8);
            } else if nv.path.is_ident("method") {
                method = Some(value as u8);
            } else if nv.path.is_ident("auth_level") {
                auth_level = value as u8;
            }
        }
    }

    Ok(HandlerArgs {
        category: category.ok_or_else(|| syn::Error::new_spanned(attr, "missing `category`"))?,
        method: method.ok_or_else(|| syn::Error::new_spanned(attr, "missing `method`"))?,
        auth_level,
    })
}
