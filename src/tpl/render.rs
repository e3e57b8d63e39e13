use crate::Result;
use crate::context::Context;
use crate::tpl::Node;

/// Renders `nodes` in document order into `out`.
///
/// A failing node leaves no partial output. Unless the context rethrows, the failure
/// is logged on the context and its inline marker takes the node's place, so sibling
/// nodes still render. A rethrowing context propagates the first failure untouched;
/// the top-level render records it once.
pub fn render_all(nodes: &[Node], ctx: &mut Context<'_>, out: &mut String) -> Result<()> {
    for node in nodes {
        let mark = out.len();
        if let Err(err) = node.render(ctx, out) {
            out.truncate(mark);
            if ctx.rethrows() {
                return Err(err);
            }
            let marker = ctx.handle_error(err)?;
            out.push_str(&marker);
        }
    }
    Ok(())
}

/// Renders `nodes` into a fresh string.
pub fn render_to_string(nodes: &[Node], ctx: &mut Context<'_>) -> Result<String> {
    let mut out = String::new();
    render_all(nodes, ctx, &mut out)?;
    Ok(out)
}
