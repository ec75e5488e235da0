use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Derive macro for enumerated values that travel as their name.
///
/// Implements `particle_core::Symbol` and `From<Self>` for
/// `particle_core::Natural`, so the enum dispatches to a string value.
/// Only fieldless variants are accepted.
///
/// # Example
///
/// ```ignore
/// use particle_core::Symbol;
///
/// #[derive(Symbol)]
/// enum Color {
///     Red,
///     #[symbol(rename = "dark-blue")]
///     DarkBlue,
/// }
/// ```
#[proc_macro_derive(Symbol, attributes(symbol))]
pub fn derive_symbol(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match derive_symbol_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn derive_symbol_impl(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;

    let data = match &input.data {
        syn::Data::Enum(data) => data,
        syn::Data::Struct(_) => {
            return Err(syn::Error::new_spanned(input, "Symbol can only be derived for enums"));
        }
        syn::Data::Union(_) => {
            return Err(syn::Error::new_spanned(input, "Symbol cannot be derived for unions"));
        }
    };

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Symbol cannot be derived for generic enums",
        ));
    }

    let arms = data
        .variants
        .iter()
        .map(|variant| {
            if !matches!(variant.fields, syn::Fields::Unit) {
                return Err(syn::Error::new_spanned(
                    variant,
                    "Symbol variants cannot carry fields",
                ));
            }
            let ident = &variant.ident;
            let symbol = parse_variant_attrs(&variant.attrs)?
                .rename
                .unwrap_or_else(|| ident.to_string());
            Ok(quote! { #name::#ident => #symbol })
        })
        .collect::<syn::Result<Vec<_>>>()?;

    Ok(quote! {
        impl ::particle_core::Symbol for #name {
            fn symbol(&self) -> &'static str {
                match *self {
                    #(#arms,)*
                }
            }
        }

        impl<'a> ::std::convert::From<#name> for ::particle_core::Natural<'a> {
            fn from(value: #name) -> Self {
                ::particle_core::Natural::symbol(&value)
            }
        }
    })
}

#[derive(Default)]
struct VariantAttrs {
    rename: Option<String>,
}

fn parse_variant_attrs(attrs: &[syn::Attribute]) -> syn::Result<VariantAttrs> {
    let mut result = VariantAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("symbol") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: syn::LitStr = meta.value()?.parse()?;
                result.rename = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported symbol attribute"))
            }
        })?;
    }

    Ok(result)
}
