use crate::Result;
use crate::context::Context;
use crate::tpl::{Block, Node, Tag};

/// Parses its body and never renders it.
#[derive(Debug, Default)]
struct Comment {
    nodelist: Vec<Node>,
}

pub(crate) fn comment(_tag: &str, _markup: &str) -> Result<Box<dyn Block>> {
    Ok(Box::new(Comment::default()))
}

impl Tag for Comment {
    fn render(&self, _ctx: &mut Context<'_>, _out: &mut String) -> Result<()> {
        Ok(())
    }
}

impl Block for Comment {
    fn nodelist(&mut self) -> &mut Vec<Node> {
        &mut self.nodelist
    }

    // Commented-out clauses such as a stray `else` are accepted.
    fn unknown_tag(&mut self, _tag: &str, _markup: &str) -> Result<()> {
        Ok(())
    }
}
