use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Attribute, Error, LitStr};

/// Implements `umbra_utils::ShaderUniformIndex` for a fieldless enum.
///
/// Every variant maps to the GLSL uniform of the same name in lowerCamelCase
/// (`SpotSoftness` -> `spotSoftness`). Use `#[uniform(name = "...")]` to override.
#[proc_macro_derive(UniformIndex, attributes(uniform))]
pub fn uniform_index(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as syn::ItemEnum);

    if input.variants.is_empty() {
        return Error::new(
            input.span(),
            "Uniform Shader Indexers must have at least one variant",
        )
        .to_compile_error()
        .into();
    }

    let mut uniform_names = Vec::with_capacity(input.variants.len());
    for var in &input.variants {
        if !var.fields.is_empty() {
            return Error::new(var.span(), "Uniform Shader Indexer variants can't hold data")
                .to_compile_error()
                .into();
        }

        let name = match name_override(&var.attrs) {
            Ok(Some(name)) => name,
            Ok(None) => lower_camel_case(&var.ident.to_string()),
            Err(e) => return e.to_compile_error().into(),
        };
        uniform_names.push(name);
    }

    let type_ident = &input.ident;

    let type_ident_str = type_ident
        .to_string()
        .replace("Uniform", "")
        .replace("Index", "");

    let variants = input.variants.iter().map(|var| &var.ident);
    let variants2 = input.variants.iter().map(|var| &var.ident);
    let variants3 = input.variants.iter().map(|var| &var.ident);
    let index_max = input.variants.len() - 1;

    quote! {
        impl ::umbra_utils::ShaderUniformIndex for #type_ident {
            const MAX: usize = #index_max;

            #[inline]
            fn index(&self) -> usize {
               *self as usize
            }

            #[inline]
            fn by_index(index: usize) -> Option<Self> {
                index.try_into().ok()
            }

            #[inline]
            fn name() -> &'static str {
                #type_ident_str
            }

            #[inline]
            fn uniform_name(&self) -> &'static str {
                match self {
                    #(Self::#variants3 => #uniform_names,)*
                }
            }
        }

        impl ::std::convert::TryFrom<usize> for #type_ident {
            type Error = ();
            fn try_from(value: usize) -> Result<Self, Self::Error> {
                match value {
                    #(x if x == Self::#variants as usize => Ok(Self::#variants),)*
                    _ => Err(()),
                }
            }
        }

        impl ::std::convert::TryFrom<u64> for #type_ident {
            type Error = ();
            fn try_from(value: u64) -> Result<Self, Self::Error> {
                match value {
                    #(x if x == Self::#variants2 as u64 => Ok(Self::#variants2),)*
                    _ => Err(()),
                }
            }
        }
    }
    .into()
}

fn name_override(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut name = None;
    for attr in attrs {
        if !attr.path().is_ident("uniform") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let lit: LitStr = meta.value()?.parse()?;
                name = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("expected `name = \"...\"`"))
            }
        })?;
    }
    Ok(name)
}

fn lower_camel_case(ident: &str) -> String {
    let mut chars = ident.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
