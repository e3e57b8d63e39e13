use crate::Result;
use crate::error::LiquidError;
use crate::tpl::lexer::{Token, tokenize};
use crate::tpl::output::Output;
use crate::tpl::{Block, Node, TagFactory};
use std::collections::HashMap;

/// A block whose `end` tag has not been seen yet.
struct OpenBlock {
    name: String,
    block: Box<dyn Block>,
}

/// Builds the node tree for a template.
///
/// Open blocks are kept on a stack; nodes go to the innermost block's current node
/// list, which the block itself may switch when it consumes a clause (`else`, `when`).
struct Parser<'a> {
    tags: &'a HashMap<String, TagFactory>,
    root: Vec<Node>,
    open: Vec<OpenBlock>,
}

impl<'a> Parser<'a> {
    fn new(tags: &'a HashMap<String, TagFactory>) -> Self {
        Self {
            tags,
            root: Vec::new(),
            open: Vec::new(),
        }
    }

    fn parse(mut self, source: &str) -> Result<Vec<Node>> {
        for token in tokenize(source)? {
            match token {
                Token::Text(t) => self.append_node(Node::Text(t.to_string())),
                Token::Output(markup) => self.append_node(Node::Output(Output::parse(markup))),
                Token::Tag { name, markup } => self.handle_tag(name, markup)?,
            }
        }

        if let Some(unclosed) = self.open.last() {
            return Err(LiquidError::Syntax(format!(
                "'{}' tag was never closed",
                unclosed.name
            )));
        }
        Ok(self.root)
    }

    fn handle_tag(&mut self, name: &str, markup: &str) -> Result<()> {
        if let Some(factory) = self.tags.get(name).copied() {
            match factory {
                TagFactory::Tag(construct) => {
                    let tag = construct(name, markup)?;
                    self.append_node(Node::Tag(tag));
                }
                TagFactory::Block(construct) => {
                    let block = construct(name, markup)?;
                    self.open.push(OpenBlock {
                        name: name.to_string(),
                        block,
                    });
                }
            }
            return Ok(());
        }

        if let Some(closing) = name.strip_prefix("end") {
            return self.close_block(name, closing);
        }

        match self.open.last_mut() {
            Some(open) => open.block.unknown_tag(name, markup),
            None => Err(LiquidError::Syntax(format!("Unknown tag '{}'", name))),
        }
    }

    fn close_block(&mut self, tag: &str, closing: &str) -> Result<()> {
        match self.open.pop() {
            Some(open) if open.name == closing => {
                self.append_node(Node::Block(open.block));
                Ok(())
            }
            Some(open) => Err(LiquidError::Syntax(format!(
                "'{}' is not a valid delimiter for {} tags. use end{}",
                tag, open.name, open.name
            ))),
            None => Err(LiquidError::Syntax(format!("Unexpected '{}'", tag))),
        }
    }

    /// Append a node to the current active node list.
    fn append_node(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(open) => open.block.nodelist().push(node),
            None => self.root.push(node),
        }
    }
}

/// Parse template source into its root node list using the given tag registry.
pub(crate) fn parse_template(source: &str, tags: &HashMap<String, TagFactory>) -> Result<Vec<Node>> {
    Parser::new(tags).parse(source)
}
