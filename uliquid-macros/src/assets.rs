use glob::glob;
use proc_macro::TokenStream;
use quote::{format_ident, quote};
use std::collections::hash_map::DefaultHasher;
use std::env;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use syn::{LitStr, parse_macro_input};

pub fn template_assets_impl(input: TokenStream) -> TokenStream {
    let pattern = parse_macro_input!(input as LitStr);
    let pattern_str = pattern.value();

    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") else {
        return syn::Error::new(pattern.span(), "CARGO_MANIFEST_DIR is not set")
            .to_compile_error()
            .into();
    };
    let full_pattern = PathBuf::from(manifest_dir).join(&pattern_str);

    let files: Vec<String> = match glob(&full_pattern.to_string_lossy()) {
        Ok(paths) => paths
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file())
            .map(|path| path.to_string_lossy().to_string())
            .collect(),
        Err(e) => {
            return syn::Error::new(pattern.span(), format!("Invalid glob pattern: {}", e))
                .to_compile_error()
                .into();
        }
    };

    // `include_str!` also makes cargo rebuild when a template changes.
    let assets = files.iter().map(|f| quote! { (#f, include_str!(#f)) });

    // One registration function per pattern, so the macro can be invoked repeatedly.
    let mut hasher = DefaultHasher::new();
    pattern_str.hash(&mut hasher);
    let fn_name = format_ident!("__uliquid_register_templates_{}", hasher.finish());

    TokenStream::from(quote! {
        #[uliquid::ctor::ctor]
        fn #fn_name() {
            let assets = vec![#(#assets),*];
            if let Err(e) = uliquid::template_loader::load_assets(assets) {
                uliquid::log::error!("Failed to register template assets: {}", e);
            }
        }
    })
}
