use std::collections::HashMap;
use std::path::{Path, PathBuf};

use uliquid::{Environment, FileSystemLoader, LiquidError, MemoryLoader, ToValue, Value};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn templates_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/templates")
}

fn product(name: &str, price: i64) -> Value {
    let mut map = HashMap::new();
    map.insert("name", Value::Str(name.to_string()));
    map.insert("price", Value::I64(price));
    map.to_value()
}

fn shop() -> HashMap<&'static str, Value> {
    let mut vars = HashMap::new();
    vars.insert("title", Value::Str("Shop".to_string()));
    vars.insert("products", Value::List(vec![product("Hat", 12), product("Cap", 5)]));
    vars
}

#[test]
fn test_file_system_partials() {
    init();
    let env = Environment::new()
        .with_loader(FileSystemLoader::new(templates_dir()))
        .rethrow_errors(true);
    let out = env.render("page", &shop()).unwrap();
    assert_eq!(out, "<h1>Shop</h1>\n[Hat*][Cap]");
}

#[test]
fn test_memory_loader_from_glob() {
    init();
    let loader = MemoryLoader::new();
    let pattern = templates_dir().join("*.liquid");
    loader.load_glob(&pattern.to_string_lossy()).unwrap();
    let env = Environment::new().with_loader(loader).rethrow_errors(true);

    let mut vars = HashMap::new();
    vars.insert("list", vec![1, 2, 3]);
    assert_eq!(env.render("list", &vars).unwrap(), "1, 2, 3");
    assert_eq!(env.render("page", &shop()).unwrap(), "<h1>Shop</h1>\n[Hat*][Cap]");
}

#[test]
fn test_include_outside_root_is_rejected() {
    init();
    let env = Environment::new().with_loader(FileSystemLoader::new(templates_dir()));
    let out = env.render_str("a{% include '../secret' %}b", &()).unwrap();
    assert_eq!(
        out,
        "aLiquid error: Template Load Error: Illegal template name '../secret'b"
    );
}

#[test]
fn test_include_with_variable_name() {
    init();
    let loader = MemoryLoader::new();
    loader.add("greeting", "Hi {{ greeting }}!");
    let env = Environment::new().with_loader(loader).rethrow_errors(true);

    let mut vars = HashMap::new();
    vars.insert("which", "greeting");
    vars.insert("who", "Bo");
    assert_eq!(env.render_str("{% include which with who %}", &vars).unwrap(), "Hi Bo!");
}

#[test]
fn test_missing_partial_in_strict_mode() {
    init();
    let env = Environment::new()
        .with_loader(MemoryLoader::new())
        .rethrow_errors(true);
    let err = env.render_str("{% include 'ghost' %}", &()).unwrap_err();
    assert_eq!(err, LiquidError::TemplateLoad("Template 'ghost' not found".to_string()));
}
