mod handler;
mod parse;
mod util;
mod wire_codec;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

#[proc_macro_derive(WireCodec, attributes(field, wire))]
pub fn derive_wire_codec(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    wire_codec::expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[proc_macro_derive(Handler, attributes(param, handler))]
pub fn derive_handler(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    handler::expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
