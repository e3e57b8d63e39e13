use crate::Result;
use crate::context::Context;
use crate::tpl::render::render_to_string;
use crate::tpl::{Block, Node, Tag};
use crate::value::Value;

/// Emits its body only when it differs from the previous `ifchanged` output.
#[derive(Debug, Default)]
struct IfChanged {
    nodelist: Vec<Node>,
}

pub(crate) fn ifchanged(_tag: &str, _markup: &str) -> Result<Box<dyn Block>> {
    Ok(Box::new(IfChanged::default()))
}

impl Tag for IfChanged {
    fn render(&self, ctx: &mut Context<'_>, out: &mut String) -> Result<()> {
        let body = ctx.stack(|ctx| render_to_string(&self.nodelist, ctx))?;
        let unchanged = matches!(ctx.registers().get("ifchanged"), Some(Value::Str(last)) if *last == body);
        if !unchanged {
            out.push_str(&body);
            ctx.registers_mut().insert("ifchanged".to_string(), Value::Str(body));
        }
        Ok(())
    }
}

impl Block for IfChanged {
    fn nodelist(&mut self) -> &mut Vec<Node> {
        &mut self.nodelist
    }
}
