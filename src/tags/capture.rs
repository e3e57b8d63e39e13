use crate::Result;
use crate::context::Context;
use crate::error::LiquidError;
use crate::tpl::render::render_to_string;
use crate::tpl::{Block, Node, Tag};
use crate::value::Value;
use regex::Regex;
use std::sync::LazyLock;

static SYNTAX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\w+)").expect("valid regex"));

/// `capture` stores its rendered body in the innermost scope, `cache` in the root scope.
#[derive(Debug)]
struct Capture {
    to: String,
    global: bool,
    nodelist: Vec<Node>,
}

fn parse(tag: &str, markup: &str, global: bool) -> Result<Box<dyn Block>> {
    let caps = SYNTAX.captures(markup).ok_or_else(|| {
        LiquidError::Syntax(format!(
            "Syntax error in '{tag}' - Valid syntax: {tag} [var]"
        ))
    })?;
    Ok(Box::new(Capture {
        to: caps[1].to_string(),
        global,
        nodelist: Vec::new(),
    }))
}

pub(crate) fn capture(tag: &str, markup: &str) -> Result<Box<dyn Block>> {
    parse(tag, markup, false)
}

pub(crate) fn cache(tag: &str, markup: &str) -> Result<Box<dyn Block>> {
    parse(tag, markup, true)
}

impl Tag for Capture {
    fn render(&self, ctx: &mut Context<'_>, _out: &mut String) -> Result<()> {
        let body = Value::Str(ctx.nested(|ctx| render_to_string(&self.nodelist, ctx))?);
        if self.global {
            ctx.set_global(self.to.as_str(), body);
        } else {
            ctx.set(self.to.as_str(), body);
        }
        Ok(())
    }
}

impl Block for Capture {
    fn nodelist(&mut self) -> &mut Vec<Node> {
        &mut self.nodelist
    }
}
