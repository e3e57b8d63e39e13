mod object;
pub mod serializer;

pub use object::{DynObject, Object};

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Str(String),
    /// Date without time zone
    Date(NaiveDate),

    /// Date and time without time zone
    DateTime(NaiveDateTime),

    /// Arbitrary-precision decimal number
    Decimal(Decimal),

    /// Ordered list of values (e.g. arrays, ranges)
    List(Vec<Value>),

    /// Key-value map (e.g. structs, JSON objects)
    Map(HashMap<String, Value>),

    /// A value computed on first read and then stored in its place.
    Deferred(Deferred),

    /// A host-supplied drop-in object.
    Object(DynObject),
}

/// A zero-argument producer whose result replaces it in the owning scope or container.
#[derive(Clone)]
pub struct Deferred(Arc<dyn Fn() -> Value + Send + Sync>);

impl Deferred {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn produce(&self) -> Value {
        (self.0)()
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<deferred>")
    }
}

impl PartialEq for Deferred {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Value {
    pub fn deferred<F>(f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Value::Deferred(Deferred::new(f))
    }

    pub fn object<O: Object + 'static>(object: O) -> Self {
        Value::Object(DynObject::new(object))
    }

    /// Replaces a deferred producer with the value it produces.
    pub(crate) fn materialize(&mut self) {
        while let Value::Deferred(d) = self {
            *self = d.produce();
        }
    }

    /// Liquid truthiness: only `nil` and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::I64(n) => Some(*n as f64),
            Value::F64(n) => Some(*n),
            Value::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    /// Integer view used for loop bounds and range endpoints. Strings holding a
    /// plain integer are accepted.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Value::I64(n) => Some(*n),
            Value::F64(n) => Some(n.trunc() as i64),
            Value::Decimal(d) => d.trunc().to_i64(),
            Value::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// The string used when a value is a map key or a register key.
    pub fn to_key(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn size(&self) -> Option<usize> {
        match self {
            Value::List(l) => Some(l.len()),
            Value::Map(m) => Some(m.len()),
            Value::Str(s) => Some(s.chars().count()),
            _ => None,
        }
    }

    pub fn first(&self) -> Option<&Value> {
        match self {
            Value::List(l) => l.first(),
            _ => None,
        }
    }

    pub fn last(&self) -> Option<&Value> {
        match self {
            Value::List(l) => l.last(),
            _ => None,
        }
    }

    /// Converts a collection into the items a `for` loop walks. Maps iterate as
    /// `[key, value]` pairs sorted by key.
    pub(crate) fn into_items(self) -> Vec<Value> {
        match self {
            Value::List(l) => l,
            Value::Map(m) => {
                let mut pairs: Vec<(String, Value)> = m.into_iter().collect();
                pairs.sort_by(|a, b| a.0.cmp(&b.0));
                pairs
                    .into_iter()
                    .map(|(k, v)| Value::List(vec![Value::Str(k), v]))
                    .collect()
            }
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null | Value::Map(_) | Value::Deferred(_) => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I64(n) => write!(f, "{}", n),
            Value::F64(n) => write!(f, "{}", n),
            Value::Str(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::List(items) => {
                for item in items {
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Value::Object(o) => match o.to_liquid() {
                Some(v) => write!(f, "{}", v),
                None => Ok(()),
            },
        }
    }
}

/// Anything that can be handed to a template as a variable.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

macro_rules! impl_to_value_int {
    ($($rust_type:ty),*) => {
        $(
            impl ToValue for $rust_type {
                fn to_value(&self) -> Value {
                    Value::I64(*self as i64)
                }
            }
        )*
    };
}

impl_to_value_int!(i8, i16, i32, i64, u8, u16, u32);

// Wide integers keep their magnitude as floats once they leave the i64 range.
macro_rules! impl_to_value_wide_int {
    ($($rust_type:ty),*) => {
        $(
            impl ToValue for $rust_type {
                fn to_value(&self) -> Value {
                    match i64::try_from(*self) {
                        Ok(n) => Value::I64(n),
                        Err(_) => Value::F64(*self as f64),
                    }
                }
            }
        )*
    };
}

impl_to_value_wide_int!(i128, u64, u128, usize, isize);

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::F64(*self as f64)
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::F64(*self)
    }
}

impl ToValue for char {
    fn to_value(&self) -> Value {
        Value::Str(self.to_string())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Str(self.to_string())
    }
}

impl ToValue for NaiveDate {
    fn to_value(&self) -> Value {
        Value::Date(*self)
    }
}

impl ToValue for NaiveDateTime {
    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }
}

impl ToValue for Decimal {
    fn to_value(&self) -> Value {
        Value::Decimal(*self)
    }
}

// Allow Value to be passed as argument
impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl ToValue for () {
    fn to_value(&self) -> Value {
        Value::Null
    }
}

// Blanket implementation for references
impl<T> ToValue for &T
where
    T: ToValue + ?Sized,
{
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(|v| v.to_value()).collect())
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(|v| v.to_value()).collect())
    }
}

impl<T: ToValue> ToValue for HashMap<String, T> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_value()))
                .collect(),
        )
    }
}

impl<T: ToValue> ToValue for HashMap<&str, T> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.to_string(), v.to_value()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::F64(4.5).to_string(), "4.5");
        assert_eq!(Value::Bool(false).to_string(), "false");
        let list = vec![1, 2, 3].to_value();
        assert_eq!(list.to_string(), "123");
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(date.to_value().to_string(), "2024-02-29");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::I64(0).is_truthy());
        assert!(Value::Str(String::new()).is_truthy());
    }

    #[test]
    fn test_materialize_runs_once_in_place() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut v = Value::deferred(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Value::I64(7)
        });
        v.materialize();
        v.materialize();
        assert_eq!(v, Value::I64(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_wide_ints() {
        assert_eq!(42u64.to_value(), Value::I64(42));
        assert_eq!(u64::MAX.to_value(), Value::F64(u64::MAX as f64));
    }

    #[test]
    fn test_map_items_are_sorted_pairs() {
        let mut map = HashMap::new();
        map.insert("b", 2);
        map.insert("a", 1);
        let items = map.to_value().into_items();
        assert_eq!(
            items,
            vec![
                Value::List(vec![Value::Str("a".into()), Value::I64(1)]),
                Value::List(vec![Value::Str("b".into()), Value::I64(2)]),
            ]
        );
    }
}
