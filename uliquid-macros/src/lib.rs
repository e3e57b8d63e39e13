mod assets;
mod to_value;

use proc_macro::TokenStream;

/// Embeds every template file matching a glob (relative to the crate root) and
/// registers it with the asset store at startup.
///
/// ```ignore
/// uliquid::template_assets!("templates/**/*.liquid");
/// ```
#[proc_macro]
pub fn template_assets(input: TokenStream) -> TokenStream {
    assets::template_assets_impl(input)
}

/// Implements `uliquid::value::ToValue` for a struct with named fields, producing a map.
///
/// Field attributes: `#[liquid("name")]` or `#[liquid(rename = "name")]` to change the
/// key, `#[liquid(ignore)]` to leave the field out.
#[proc_macro_derive(ToValue, attributes(liquid))]
pub fn derive_to_value(input: TokenStream) -> TokenStream {
    to_value::derive_to_value_impl(input)
}
