use crate::Result;
use crate::context::Context;
use crate::error::LiquidError;
use crate::tpl::Node;
use crate::value::Value;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

/// A comparison predicate keyed by its operator string.
pub type Operator = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logic {
    And,
    Or,
}

/// `left operator right`, optionally chained to a child condition with `and`/`or`.
/// The `Else` form always holds.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        left: String,
        operator: Option<String>,
        right: Option<String>,
        child: Option<(Logic, Box<Condition>)>,
    },
    Else,
}

impl Condition {
    pub fn new(left: impl Into<String>, operator: Option<&str>, right: Option<&str>) -> Self {
        Condition::Compare {
            left: left.into(),
            operator: operator.map(str::to_string),
            right: right.map(str::to_string),
            child: None,
        }
    }

    pub fn and(self, other: Condition) -> Self {
        self.chain(Logic::And, other)
    }

    pub fn or(self, other: Condition) -> Self {
        self.chain(Logic::Or, other)
    }

    fn chain(self, logic: Logic, other: Condition) -> Self {
        match self {
            Condition::Compare {
                left,
                operator,
                right,
                ..
            } => Condition::Compare {
                left,
                operator,
                right,
                child: Some((logic, Box::new(other))),
            },
            Condition::Else => Condition::Else,
        }
    }

    pub fn is_else(&self) -> bool {
        matches!(self, Condition::Else)
    }

    pub fn evaluate(&self, ctx: &mut Context<'_>) -> Result<bool> {
        let Condition::Compare {
            left,
            operator,
            right,
            child,
        } = self
        else {
            return Ok(true);
        };

        let left = ctx.resolve(left);
        let result = match operator {
            None => left.is_truthy(),
            Some(op) => {
                let right = ctx.resolve(right.as_deref().unwrap_or(""));
                let predicate = ctx.env().operator(op).ok_or_else(|| {
                    LiquidError::Render(format!("Unknown operator '{}'", op))
                })?;
                predicate(&left, &right)
            }
        };

        match child {
            None => Ok(result),
            Some((Logic::And, c)) => Ok(result && c.evaluate(ctx)?),
            Some((Logic::Or, c)) => Ok(result || c.evaluate(ctx)?),
        }
    }
}

/// A condition with the body rendered when it holds.
#[derive(Debug)]
pub struct Branch {
    pub condition: Condition,
    pub attachment: Vec<Node>,
}

impl Branch {
    pub fn new(condition: Condition) -> Self {
        Self {
            condition,
            attachment: Vec::new(),
        }
    }
}

/// Orders integers and decimals without going through `f64`.
fn exact_cmp(l: &Value, r: &Value) -> Option<Ordering> {
    match (l, r) {
        (Value::I64(a), Value::I64(b)) => Some(a.cmp(b)),
        (Value::Decimal(a), Value::Decimal(b)) => Some(a.cmp(b)),
        (Value::I64(a), Value::Decimal(b)) => Some(Decimal::from(*a).cmp(b)),
        (Value::Decimal(a), Value::I64(b)) => Some(a.cmp(&Decimal::from(*b))),
        _ => None,
    }
}

fn compare(l: &Value, r: &Value) -> Option<Ordering> {
    if let Some(ordering) = exact_cmp(l, r) {
        return Some(ordering);
    }
    if let (Some(a), Some(b)) = (l.to_f64(), r.to_f64()) {
        return a.partial_cmp(&b);
    }
    match (l, r) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn equals(l: &Value, r: &Value) -> bool {
    if let Some(ordering) = exact_cmp(l, r) {
        return ordering == Ordering::Equal;
    }
    if let (Some(a), Some(b)) = (l.to_f64(), r.to_f64()) {
        return (a - b).abs() < f64::EPSILON;
    }
    match (l, r) {
        // `empty` resolves to "" and matches empty collections.
        (Value::Str(s), Value::List(c)) | (Value::List(c), Value::Str(s)) => {
            s.is_empty() && c.is_empty()
        }
        (Value::Str(s), Value::Map(m)) | (Value::Map(m), Value::Str(s)) => {
            s.is_empty() && m.is_empty()
        }
        _ => l == r,
    }
}

fn contains(l: &Value, r: &Value) -> bool {
    match l {
        Value::Str(s) => match r {
            Value::Str(needle) => s.contains(needle.as_str()),
            Value::Null => false,
            other => s.contains(&other.to_string()),
        },
        Value::List(items) => items.iter().any(|item| equals(item, r)),
        Value::Map(m) => m.contains_key(&r.to_key()),
        _ => false,
    }
}

/// The built-in comparison table.
pub fn default_operators() -> HashMap<String, Operator> {
    let mut ops: HashMap<String, Operator> = HashMap::new();
    ops.insert("==".to_string(), Arc::new(equals));
    ops.insert("!=".to_string(), Arc::new(|l: &Value, r: &Value| !equals(l, r)));
    ops.insert("<>".to_string(), Arc::new(|l: &Value, r: &Value| !equals(l, r)));
    ops.insert(
        "<".to_string(),
        Arc::new(|l: &Value, r: &Value| compare(l, r) == Some(Ordering::Less)),
    );
    ops.insert(
        ">".to_string(),
        Arc::new(|l: &Value, r: &Value| compare(l, r) == Some(Ordering::Greater)),
    );
    ops.insert(
        "<=".to_string(),
        Arc::new(|l: &Value, r: &Value| matches!(compare(l, r), Some(Ordering::Less | Ordering::Equal))),
    );
    ops.insert(
        ">=".to_string(),
        Arc::new(|l: &Value, r: &Value| matches!(compare(l, r), Some(Ordering::Greater | Ordering::Equal))),
    );
    ops.insert("contains".to_string(), Arc::new(contains));
    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;
    use crate::value::ToValue;

    fn ctx_with<'a>(env: &'a Environment, entries: Vec<(&str, Value)>) -> Context<'a> {
        Context::with_assigns(
            env,
            entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        )
    }

    #[test]
    fn test_truthiness_without_operator() {
        let env = Environment::new();
        let mut ctx = ctx_with(&env, vec![("zero", Value::I64(0)), ("no", Value::Bool(false))]);
        assert!(Condition::new("zero", None, None).evaluate(&mut ctx).unwrap());
        assert!(Condition::new("''", None, None).evaluate(&mut ctx).unwrap());
        assert!(!Condition::new("no", None, None).evaluate(&mut ctx).unwrap());
        assert!(!Condition::new("missing", None, None).evaluate(&mut ctx).unwrap());
        assert!(Condition::Else.evaluate(&mut ctx).unwrap());
    }

    #[test]
    fn test_comparisons() {
        let env = Environment::new();
        let mut ctx = ctx_with(
            &env,
            vec![
                ("a", Value::I64(10)),
                ("price", Value::Decimal(Decimal::new(1050, 2))),
                ("tags", vec!["sale", "new"].to_value()),
                ("none", Value::List(vec![])),
            ],
        );
        let mut check = |l: &str, op: &str, r: &str| {
            Condition::new(l, Some(op), Some(r)).evaluate(&mut ctx).unwrap()
        };
        assert!(check("a", "==", "10"));
        assert!(check("a", "==", "10.0"));
        assert!(check("a", ">", "5"));
        assert!(check("a", "<=", "10"));
        assert!(!check("a", "<", "'zebra'"));
        assert!(check("price", ">", "10"));
        assert!(check("'abc'", "<", "'abd'"));
        assert!(check("tags", "contains", "'sale'"));
        assert!(check("'hello'", "contains", "'ell'"));
        assert!(check("none", "==", "empty"));
        assert!(check("a", "<>", "11"));
        assert!(check("missing", "==", "nil"));
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        let env = Environment::new();
        let mut ctx = ctx_with(
            &env,
            vec![
                ("a", Value::I64(9_007_199_254_740_993)),
                ("b", Value::I64(9_007_199_254_740_992)),
                ("d", Value::Decimal(Decimal::from(9_007_199_254_740_993i64))),
            ],
        );
        let mut check = |l: &str, op: &str, r: &str| {
            Condition::new(l, Some(op), Some(r)).evaluate(&mut ctx).unwrap()
        };
        assert!(!check("a", "==", "b"));
        assert!(check("a", "!=", "b"));
        assert!(check("a", ">", "b"));
        assert!(!check("a", "<=", "b"));
        assert!(check("a", "==", "d"));
        assert!(check("d", ">", "b"));
    }

    #[test]
    fn test_unknown_operator() {
        let env = Environment::new();
        let mut ctx = ctx_with(&env, vec![]);
        let err = Condition::new("1", Some("=~"), Some("1"))
            .evaluate(&mut ctx)
            .unwrap_err();
        assert_eq!(err, LiquidError::Render("Unknown operator '=~'".to_string()));
    }

    #[test]
    fn test_chaining() {
        let env = Environment::new();
        let mut ctx = ctx_with(&env, vec![]);
        let c = Condition::new("false", None, None).or(Condition::new("true", None, None));
        assert!(c.evaluate(&mut ctx).unwrap());
        let c = Condition::new("true", None, None).and(Condition::new("false", None, None));
        assert!(!c.evaluate(&mut ctx).unwrap());
    }
}
