pub(crate) mod cache;
pub mod condition;
pub(crate) mod lexer;
pub mod literal;
pub mod output;
pub(crate) mod parser;
pub mod render;

use crate::Result;
use crate::context::Context;
use crate::error::LiquidError;
use output::Output;
use std::fmt;

/// A compiled template node.
#[derive(Debug)]
pub enum Node {
    Text(String),
    Output(Output),
    Tag(Box<dyn Tag>),
    Block(Box<dyn Block>),
}

impl Node {
    pub fn render(&self, ctx: &mut Context<'_>, out: &mut String) -> Result<()> {
        match self {
            Node::Text(t) => {
                out.push_str(t);
                Ok(())
            }
            Node::Output(o) => o.render(ctx, out),
            Node::Tag(t) => t.render(ctx, out),
            Node::Block(b) => b.render(ctx, out),
        }
    }
}

/// A leaf tag: parsed once from its markup, rendered any number of times.
pub trait Tag: fmt::Debug + Send + Sync {
    fn render(&self, ctx: &mut Context<'_>, out: &mut String) -> Result<()>;
}

/// A tag owning a body, closed by `end<name>`.
pub trait Block: Tag {
    /// The node list that receives nodes parsed from here on.
    fn nodelist(&mut self) -> &mut Vec<Node>;

    /// Consumes a nested clause such as `else`, `elsif` or `when`. Tags the block
    /// does not know are a syntax error.
    fn unknown_tag(&mut self, tag: &str, markup: &str) -> Result<()> {
        let _ = markup;
        Err(LiquidError::Syntax(format!("Unknown tag '{}'", tag)))
    }
}

pub type TagConstructor = fn(tag: &str, markup: &str) -> Result<Box<dyn Tag>>;
pub type BlockConstructor = fn(tag: &str, markup: &str) -> Result<Box<dyn Block>>;

/// Registry entry for a tag name.
#[derive(Clone, Copy)]
pub enum TagFactory {
    Tag(TagConstructor),
    Block(BlockConstructor),
}

impl fmt::Debug for TagFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagFactory::Tag(_) => f.write_str("TagFactory::Tag"),
            TagFactory::Block(_) => f.write_str("TagFactory::Block"),
        }
    }
}
