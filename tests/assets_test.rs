use std::collections::HashMap;

use uliquid::template_loader::{self, AssetLoader, Loader};
use uliquid::{Environment, LiquidError, MemoryLoader, template_assets};

template_assets!("tests/templates/assets/*.liquid");

#[test]
fn test_assets_registered_at_startup() {
    let source = AssetLoader
        .load("signature")
        .expect("Assets were not loaded automatically. The ctor-based registration failed.");
    assert_eq!(source, " -- {{ signature }}");
}

#[test]
fn test_render_embedded_template() {
    let env = Environment::new().rethrow_errors(true);
    let mut vars = HashMap::new();
    vars.insert("name", "Ann");
    assert_eq!(env.render("letter", &vars).unwrap(), "Dear Ann, -- Ann");
}

#[test]
fn test_memory_loader_copies_assets() {
    let loader = MemoryLoader::new();
    loader.load_assets();
    assert!(loader.load("letter").unwrap().starts_with("Dear"));
}

#[test]
fn test_duplicate_asset_names_are_rejected() {
    let err = template_loader::load_assets(vec![("elsewhere/letter.liquid", "dup")]).unwrap_err();
    assert!(matches!(err, LiquidError::TemplateLoad(_)));
}
