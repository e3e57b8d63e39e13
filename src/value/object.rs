use crate::context::Context;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// A host object placed into a template scope.
///
/// Every hook is optional. When an object surfaces from scope or container
/// lookup, the engine first asks it to liquefy itself; if it declines, the object
/// stays in place and its properties are read through [`Object::get`]. Whatever
/// object finally surfaces is handed the active context through
/// [`Object::bind_context`].
pub trait Object: fmt::Debug + Send + Sync {
    /// Looks up a property for `object.key` and `object[key]` paths.
    fn get(&self, key: &str) -> Option<Value> {
        let _ = key;
        None
    }

    /// Returns the plain value that stands in for this object.
    fn to_liquid(&self) -> Option<Value> {
        None
    }

    /// Receives the context the object was resolved in.
    fn bind_context(&self, ctx: &Context<'_>) {
        let _ = ctx;
    }
}

#[derive(Clone)]
pub struct DynObject(Arc<dyn Object>);

impl DynObject {
    pub fn new<O: Object + 'static>(object: O) -> Self {
        Self(Arc::new(object))
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.get(key)
    }

    pub fn to_liquid(&self) -> Option<Value> {
        self.0.to_liquid()
    }

    pub fn bind_context(&self, ctx: &Context<'_>) {
        self.0.bind_context(ctx)
    }
}

impl fmt::Debug for DynObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl PartialEq for DynObject {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
