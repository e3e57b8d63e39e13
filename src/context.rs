use crate::Result;
use crate::environment::Environment;
use crate::error::LiquidError;
use crate::tpl::literal::{Literal, integer_range, parse_literal};
use crate::value::Value;
use log::warn;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// One frame of the variable stack.
pub type Scope = HashMap<String, Value>;

/// Per-render tag state, keyed by tag kind.
pub type Registers = HashMap<String, Value>;

/// How many blocks and partials may be rendered inside one another.
pub const MAX_DEPTH: usize = 100;

static PATH_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]+\]|(?:[\w\-]\??)+").expect("valid regex"));

fn bracketed(part: &str) -> Option<&str> {
    part.strip_prefix('[')?.strip_suffix(']')
}

/// A trailing path segment after the first variable name.
enum Segment {
    /// `.name` or `.0`
    Name(String),
    /// `[expr]`, already resolved
    Index(Value),
}

/// Address of a container slot, used to write memoized values back.
#[derive(Clone)]
enum Key {
    Name(String),
    Index(usize),
}

/// The owning scope and the key path of the value currently being walked.
/// `None` once the walk leaves scope storage (liquefied or computed values).
struct Anchor {
    scope: usize,
    path: Vec<Key>,
}

/// The rendering state of a single top-level render.
///
/// Scopes are kept innermost-last: `scopes[0]` is the root scope and is never popped,
/// lookups search from the end.
pub struct Context<'env> {
    env: &'env Environment,
    scopes: Vec<Scope>,
    registers: Registers,
    errors: Vec<LiquidError>,
    rethrow: bool,
    depth: usize,
}

impl<'env> Context<'env> {
    pub fn new(env: &'env Environment) -> Self {
        Self::with_assigns(env, Scope::new())
    }

    pub fn with_assigns(env: &'env Environment, assigns: Scope) -> Self {
        Self {
            env,
            scopes: vec![assigns],
            registers: Registers::new(),
            errors: Vec::new(),
            rethrow: env.rethrows_errors(),
            depth: 0,
        }
    }

    /// Abort on the first render error instead of splicing an inline marker.
    pub fn rethrow_errors(mut self, rethrow: bool) -> Self {
        self.rethrow = rethrow;
        self
    }

    pub fn rethrows(&self) -> bool {
        self.rethrow
    }

    pub fn env(&self) -> &'env Environment {
        self.env
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    /// The map register of a tag kind, created on first use.
    pub(crate) fn register_map(&mut self, tag: &str) -> &mut HashMap<String, Value> {
        let entry = self
            .registers
            .entry(tag.to_string())
            .or_insert_with(|| Value::Map(HashMap::new()));
        if !matches!(entry, Value::Map(_)) {
            *entry = Value::Map(HashMap::new());
        }
        match entry {
            Value::Map(map) => map,
            _ => unreachable!("register was just replaced with a map"),
        }
    }

    pub fn errors(&self) -> &[LiquidError] {
        &self.errors
    }

    pub fn get(&mut self, name: &str) -> Value {
        self.resolve(name)
    }

    /// Writes into the innermost scope.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.innermost().insert(name.into(), value);
    }

    /// Writes into the root scope.
    pub fn set_global(&mut self, name: impl Into<String>, value: Value) {
        self.scopes[0].insert(name.into(), value);
    }

    /// True when `key` resolves to anything but `nil`, `false`, `0` or `""`.
    /// A present key holding one of those is indistinguishable from a missing one.
    pub fn has_key(&mut self, key: &str) -> bool {
        match self.resolve(key) {
            Value::Null | Value::Bool(false) | Value::I64(0) => false,
            Value::F64(f) => f != 0.0 && !f.is_nan(),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn push(&mut self) {
        self.scopes.push(Scope::new());
    }

    /// Overlays `scope` onto the innermost scope without pushing a frame.
    pub fn merge(&mut self, scope: Scope) {
        self.innermost().extend(scope);
    }

    pub fn pop(&mut self) -> Result<Scope> {
        if self.scopes.len() == 1 {
            return Err(LiquidError::ScopeUnderflow);
        }
        self.scopes.pop().ok_or(LiquidError::ScopeUnderflow)
    }

    /// Runs `body` inside a fresh scope. The scope is popped on every exit path and
    /// the body's error, if any, is returned after the pop.
    ///
    /// Counts toward the nesting limit, see [`Context::nested`].
    pub fn stack<T, F>(&mut self, body: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.nested(|ctx| {
            ctx.push();
            let result = body(ctx);
            ctx.pop()?;
            result
        })
    }

    /// Runs a block or partial body one level deeper. Fails without running `body`
    /// once [`MAX_DEPTH`] levels are already open.
    pub fn nested<T, F>(&mut self, body: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        if self.depth >= MAX_DEPTH {
            return Err(LiquidError::Render("Nesting too deep".to_string()));
        }
        self.depth += 1;
        let result = body(self);
        self.depth -= 1;
        result
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Calls the filter `name` with `args`; unknown filters return their first argument.
    pub fn invoke(&mut self, name: &str, args: Vec<Value>) -> Result<Value> {
        let env = self.env;
        let Some(filter) = env.strainer().get(name) else {
            return Ok(args.into_iter().next().unwrap_or(Value::Null));
        };
        filter(&*self, &args).map_err(|e| match e {
            LiquidError::Filter { .. } => e,
            other => LiquidError::filter(name, other.to_string()),
        })
    }

    /// Records a render failure. Returns the inline marker to splice into the
    /// output, or the error itself when the context rethrows.
    pub fn handle_error(&mut self, err: LiquidError) -> Result<String> {
        self.errors.push(err.clone());
        if self.rethrow {
            return Err(err);
        }
        warn!("Recovered render error: {}", err);
        Ok(err.inline_marker())
    }

    /// Resolves a markup token: a literal if it is one, a variable path otherwise.
    pub fn resolve(&mut self, key: &str) -> Value {
        match parse_literal(key) {
            Some(Literal::Value(v)) => v,
            Some(Literal::Range(from, to)) => {
                let bounds = (self.resolve(from).to_i64(), self.resolve(to).to_i64());
                match bounds {
                    (Some(from), Some(to)) => integer_range(from, to),
                    _ => {
                        warn!("Range '{}' has non-numeric endpoints", key);
                        Value::Null
                    }
                }
            }
            None => self.variable(key),
        }
    }

    /// Resolves a path expression such as `product.variants[0].title` or `[key].size`.
    pub fn variable(&mut self, markup: &str) -> Value {
        let parts: Vec<&str> = PATH_PART.find_iter(markup).map(|m| m.as_str()).collect();
        let Some((first, rest)) = parts.split_first() else {
            return Value::Null;
        };

        let name = match bracketed(first) {
            Some(inner) => self.resolve(inner).to_key(),
            None => first.to_string(),
        };
        let Some(scope) = self.scopes.iter().rposition(|s| s.contains_key(&name)) else {
            return Value::Null;
        };
        let mut anchor = Some(Anchor {
            scope,
            path: vec![Key::Name(name)],
        });
        let mut current = match self.read_anchored(anchor.as_ref()) {
            Some(v) => self.surface(v, &mut anchor),
            None => return Value::Null,
        };

        // Bracketed segments are resolved only once the walk reaches them.
        for part in rest {
            let segment = match bracketed(part) {
                Some(inner) => Segment::Index(self.resolve(inner)),
                None => Segment::Name(part.to_string()),
            };
            match self.step(current, segment, &mut anchor) {
                Some(next) => current = next,
                None => return Value::Null,
            }
        }
        current
    }

    fn step(&mut self, current: Value, segment: Segment, anchor: &mut Option<Anchor>) -> Option<Value> {
        match segment {
            Segment::Index(key) => {
                let key = match (&current, &key) {
                    (Value::List(_), _) => Key::Index(usize::try_from(key.to_i64()?).ok()?),
                    (Value::Map(_), _) => Key::Name(key.to_key()),
                    (Value::Object(o), _) => {
                        let found = o.get(&key.to_key())?;
                        return Some(self.detached(found, anchor));
                    }
                    _ => return None,
                };
                self.descend(current, key, anchor)
            }
            Segment::Name(part) => {
                if matches!(&current, Value::Map(m) if m.contains_key(&part)) {
                    return self.descend(current, Key::Name(part), anchor);
                }
                if let Value::Object(o) = &current
                    && let Some(found) = o.get(&part)
                {
                    return Some(self.detached(found, anchor));
                }
                if matches!(current, Value::List(_)) && part.bytes().all(|b| b.is_ascii_digit()) {
                    let index = part.parse().ok()?;
                    return self.descend(current, Key::Index(index), anchor);
                }
                let builtin = match part.as_str() {
                    "size" => current.size().map(|n| Value::I64(n as i64)),
                    "first" => current.first().cloned(),
                    "last" => current.last().cloned(),
                    _ => None,
                }?;
                Some(self.detached(builtin, anchor))
            }
        }
    }

    /// Reads the child `key` of `current`, memoizing deferred values in place.
    fn descend(&mut self, current: Value, key: Key, anchor: &mut Option<Anchor>) -> Option<Value> {
        let raw = match anchor {
            Some(a) => {
                a.path.push(key);
                self.read_anchored(Some(&*a))?
            }
            None => {
                let mut child = match (current, key) {
                    (Value::Map(mut m), Key::Name(k)) => m.remove(&k)?,
                    (Value::List(mut l), Key::Index(i)) if i < l.len() => l.swap_remove(i),
                    _ => return None,
                };
                child.materialize();
                child
            }
        };
        Some(self.surface(raw, anchor))
    }

    fn detached(&mut self, value: Value, anchor: &mut Option<Anchor>) -> Value {
        *anchor = None;
        let mut value = value;
        value.materialize();
        self.surface(value, anchor)
    }

    fn read_anchored(&mut self, anchor: Option<&Anchor>) -> Option<Value> {
        let anchor = anchor?;
        let (head, tail) = anchor.path.split_first()?;
        let Key::Name(head) = head else {
            return None;
        };
        let mut slot = self.scopes.get_mut(anchor.scope)?.get_mut(head)?;
        for key in tail {
            slot = match (slot, key) {
                (Value::Map(m), Key::Name(k)) => m.get_mut(k)?,
                (Value::List(l), Key::Index(i)) => l.get_mut(*i)?,
                _ => return None,
            };
        }
        slot.materialize();
        Some(slot.clone())
    }

    /// Applies the liquefy and context-binding hooks to a value leaving a lookup.
    fn surface(&self, value: Value, anchor: &mut Option<Anchor>) -> Value {
        let value = match value {
            Value::Object(o) => match o.to_liquid() {
                Some(mut liquid) => {
                    *anchor = None;
                    liquid.materialize();
                    liquid
                }
                None => Value::Object(o),
            },
            other => other,
        };
        if let Value::Object(o) = &value {
            o.bind_context(self);
        }
        value
    }

    fn innermost(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }
}
