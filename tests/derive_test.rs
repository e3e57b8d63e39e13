use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uliquid::{Environment, ToValue, Value, to_value};

#[derive(ToValue)]
struct Product {
    name: String,
    #[liquid("cost")]
    price: Decimal,
    #[liquid(ignore)]
    #[allow(dead_code)]
    secret: String,
    #[liquid(rename = "kind")]
    r#type: String,
    tags: Vec<String>,
    released: Option<NaiveDate>,
}

fn product() -> Product {
    Product {
        name: "Lamp".to_string(),
        price: Decimal::new(1999, 2),
        secret: "hidden".to_string(),
        r#type: "light".to_string(),
        tags: vec!["new".to_string(), "sale".to_string()],
        released: NaiveDate::from_ymd_opt(2024, 5, 1),
    }
}

#[test]
fn test_derive_to_value() {
    let Value::Map(map) = product().to_value() else {
        panic!("expected a map");
    };
    assert_eq!(map.get("name"), Some(&Value::Str("Lamp".to_string())));
    assert_eq!(map.get("cost"), Some(&Value::Decimal(Decimal::new(1999, 2))));
    assert_eq!(map.get("kind"), Some(&Value::Str("light".to_string())));
    assert!(!map.contains_key("secret"));
    assert!(!map.contains_key("price"));
}

#[test]
fn test_render_derived_struct() {
    let env = Environment::new().rethrow_errors(true);
    let mut vars = HashMap::new();
    vars.insert("p", product());
    let out = env
        .render_str(
            "{{ p.name }} {{ p.cost }} {{ p.released }}{% if p.tags contains 'sale' %} on sale{% endif %}{{ p.secret }}",
            &vars,
        )
        .unwrap();
    assert_eq!(out, "Lamp 19.99 2024-05-01 on sale");
}

#[derive(Serialize)]
struct Line {
    sku: &'static str,
    qty: u32,
}

#[derive(Serialize)]
struct Order {
    id: u64,
    lines: Vec<Line>,
    note: Option<String>,
}

#[test]
fn test_serde_values() {
    let order = Order {
        id: 7,
        lines: vec![Line { sku: "A1", qty: 2 }, Line { sku: "B2", qty: 1 }],
        note: None,
    };
    let mut vars = HashMap::new();
    vars.insert("order".to_string(), to_value(&order).unwrap());

    let env = Environment::new().rethrow_errors(true);
    let out = env
        .render_str(
            "#{{ order.id }}:{% for l in order.lines %} {{ l.sku }}x{{ l.qty }}{% endfor %}{% unless order.note %} (no note){% endunless %}",
            &vars,
        )
        .unwrap();
    assert_eq!(out, "#7: A1x2 B2x1 (no note)");
}
