use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, LitStr, parse_macro_input};

pub fn derive_to_value_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match input.data {
        syn::Data::Struct(data) => match data.fields {
            syn::Fields::Named(fields) => fields.named,
            _ => {
                return syn::Error::new_spanned(
                    name,
                    "ToValue only supports structs with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new_spanned(name, "ToValue only supports structs")
                .to_compile_error()
                .into();
        }
    };

    let mut inserts = Vec::new();
    for field in &fields {
        let (key, ignore) = match parse_field_attrs(field) {
            Ok(attrs) => attrs,
            Err(e) => return e.to_compile_error().into(),
        };
        if ignore {
            continue;
        }
        let ident = &field.ident;
        inserts.push(quote! {
            map.insert(#key.to_string(), uliquid::value::ToValue::to_value(&self.#ident));
        });
    }

    TokenStream::from(quote! {
        impl #impl_generics uliquid::value::ToValue for #name #ty_generics #where_clause {
            fn to_value(&self) -> uliquid::value::Value {
                let mut map = std::collections::HashMap::new();
                #(#inserts)*
                uliquid::value::Value::Map(map)
            }
        }
    })
}

/// Reads `#[liquid("name")]`, `#[liquid(rename = "name")]` and `#[liquid(ignore)]`.
fn parse_field_attrs(field: &syn::Field) -> syn::Result<(String, bool)> {
    let mut name = field
        .ident
        .as_ref()
        .map(|i| i.to_string().trim_start_matches("r#").to_string())
        .unwrap_or_default();
    let mut ignore = false;

    for attr in &field.attrs {
        if !attr.path().is_ident("liquid") {
            continue;
        }
        if let Ok(s) = attr.parse_args::<LitStr>() {
            name = s.value();
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("ignore") {
                ignore = true;
                Ok(())
            } else if meta.path.is_ident("rename") {
                let s: LitStr = meta.value()?.parse()?;
                name = s.value();
                Ok(())
            } else {
                Err(meta.error("expected `ignore` or `rename = \"...\"`"))
            }
        })?;
    }
    Ok((name, ignore))
}
