use crate::value::Value;
use regex::Regex;
use std::sync::LazyLock;

static SINGLE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^'(.*)'$").expect("valid regex"));
static DOUBLE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)^"(.*)"$"#).expect("valid regex"));
static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").expect("valid regex"));
static FLOAT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\d+$").expect("valid regex"));
static RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\((\S+)\.\.(\S+)\)$").expect("valid regex"));

/// An atomic markup token recognised without looking at any scope.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal<'a> {
    Value(Value),
    /// `(a..b)`; both endpoints are markup tokens resolved by the caller.
    Range(&'a str, &'a str),
}

/// Parses `token` as a literal. `None` means the token is a variable path.
pub fn parse_literal(token: &str) -> Option<Literal<'_>> {
    match token {
        "" | "nil" | "null" => return Some(Literal::Value(Value::Null)),
        "true" => return Some(Literal::Value(Value::Bool(true))),
        "false" => return Some(Literal::Value(Value::Bool(false))),
        "blank" | "empty" => return Some(Literal::Value(Value::Str(String::new()))),
        _ => {}
    }

    if let Some(caps) = SINGLE_QUOTED
        .captures(token)
        .or_else(|| DOUBLE_QUOTED.captures(token))
    {
        return Some(Literal::Value(Value::Str(caps[1].to_string())));
    }

    if INTEGER.is_match(token) {
        // Integers too wide for i64 degrade to floats.
        return match token.parse::<i64>() {
            Ok(n) => Some(Literal::Value(Value::I64(n))),
            Err(_) => token.parse::<f64>().ok().map(|f| Literal::Value(Value::F64(f))),
        };
    }

    if FLOAT.is_match(token) {
        return token.parse::<f64>().ok().map(|f| Literal::Value(Value::F64(f)));
    }

    if let Some(caps) = RANGE.captures(token) {
        let (_, [left, right]) = caps.extract();
        return Some(Literal::Range(left, right));
    }

    None
}

/// Materialises an inclusive integer range. A descending range is empty.
pub fn integer_range(from: i64, to: i64) -> Value {
    Value::List((from..=to).map(Value::I64).collect())
}
