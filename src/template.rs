use std::time::Instant;

use log::debug;

use crate::Result;
use crate::context::{Context, Scope};
use crate::environment::Environment;
use crate::error::LiquidError;
use crate::tpl::Node;
use crate::tpl::render::render_all;
use crate::value::{ToValue, Value};

/// A parsed template, immutable and shareable across renders.
#[derive(Debug)]
pub struct Template {
    name: String,
    root: Vec<Node>,
}

impl Template {
    pub(crate) fn new(name: impl Into<String>, root: Vec<Node>) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[Node] {
        &self.root
    }

    /// Renders with a fresh context whose root scope holds `assigns`.
    ///
    /// `assigns` must convert to a map, or to nil for a template without variables.
    pub fn render<T: ToValue + ?Sized>(&self, env: &Environment, assigns: &T) -> Result<String> {
        let scope: Scope = match assigns.to_value() {
            Value::Map(map) => map,
            Value::Null => Scope::new(),
            other => {
                return Err(LiquidError::Render(format!(
                    "Template assigns must be a map, got {:?}",
                    other
                )));
            }
        };
        let mut ctx = Context::with_assigns(env, scope);
        self.render_with(&mut ctx)
    }

    /// Renders against an existing context, keeping its scopes and registers.
    pub fn render_with(&self, ctx: &mut Context<'_>) -> Result<String> {
        let start = Instant::now();
        let mut out = String::new();
        let result = render_all(&self.root, ctx, &mut out);
        let elapsed = start.elapsed().as_millis();

        match result {
            Ok(()) => {
                debug!(
                    "Render: template={}, elapsed={}ms, errors={}",
                    self.name,
                    elapsed,
                    ctx.errors().len()
                );
                Ok(out)
            }
            Err(e) => {
                debug!(
                    "Render: template={}, elapsed={}ms, error={:?}",
                    self.name, elapsed, e
                );
                let marker = ctx.handle_error(e)?;
                out.push_str(&marker);
                Ok(out)
            }
        }
    }
}
