use crate::Result;
use crate::context::Context;
use crate::error::LiquidError;
use crate::tags::QUOTED_FRAGMENT;
use crate::tpl::condition::{Branch, Condition};
use crate::tpl::render::render_all;
use crate::tpl::{Block, Node, Tag};
use regex::Regex;
use std::sync::LazyLock;

static SYNTAX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("({})", QUOTED_FRAGMENT)).expect("valid regex"));
static WHEN_SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"({q})(?:(?:\s+or\s+|\s*,\s*)((?:{q}).*))?",
        q = QUOTED_FRAGMENT
    ))
    .expect("valid regex")
});

/// `{% case x %}{% when a, b %}..{% else %}..{% endcase %}`
///
/// Every matching `when` renders, in source order; `else` renders only when none did.
#[derive(Debug)]
struct Case {
    left: String,
    /// Nodes between `case` and the first clause; never rendered.
    preamble: Vec<Node>,
    branches: Vec<Branch>,
}

pub(crate) fn case(_tag: &str, markup: &str) -> Result<Box<dyn Block>> {
    let caps = SYNTAX.captures(markup).ok_or_else(|| {
        LiquidError::Syntax("Syntax error in 'case' - Valid syntax: case [condition]".to_string())
    })?;
    Ok(Box::new(Case {
        left: caps[1].to_string(),
        preamble: Vec::new(),
        branches: Vec::new(),
    }))
}

impl Case {
    fn record_when(&mut self, markup: &str) -> Result<()> {
        let mut values = Vec::new();
        let mut rest = Some(markup);
        while let Some(current) = rest.filter(|m| !m.trim().is_empty()) {
            let caps = WHEN_SYNTAX.captures(current).ok_or_else(|| {
                LiquidError::Syntax(
                    "Syntax error in tag 'case' - Valid when condition: {% when [condition] [or condition2...] %}"
                        .to_string(),
                )
            })?;
            values.push(caps[1].to_string());
            rest = caps.get(2).map(|m| m.as_str());
        }

        let mut conditions = values
            .iter()
            .rev()
            .map(|v| Condition::new(self.left.as_str(), Some("=="), Some(v.as_str())));
        let last = conditions.next().ok_or_else(|| {
            LiquidError::Syntax(
                "Syntax error in tag 'case' - Valid when condition: {% when [condition] [or condition2...] %}"
                    .to_string(),
            )
        })?;
        let condition = conditions.fold(last, |acc, c| c.or(acc));
        self.branches.push(Branch::new(condition));
        Ok(())
    }

    fn record_else(&mut self, markup: &str) -> Result<()> {
        if !markup.trim().is_empty() {
            return Err(LiquidError::Syntax(
                "Syntax error in tag 'case' - Valid else condition: {% else %} (no parameters)"
                    .to_string(),
            ));
        }
        self.branches.push(Branch::new(Condition::Else));
        Ok(())
    }
}

impl Tag for Case {
    fn render(&self, ctx: &mut Context<'_>, out: &mut String) -> Result<()> {
        ctx.stack(|ctx| {
            let mut matched = false;
            for branch in &self.branches {
                if branch.condition.is_else() {
                    if !matched {
                        render_all(&branch.attachment, ctx, out)?;
                    }
                    break;
                }
                if branch.condition.evaluate(ctx)? {
                    matched = true;
                    render_all(&branch.attachment, ctx, out)?;
                }
            }
            Ok(())
        })
    }
}

impl Block for Case {
    fn nodelist(&mut self) -> &mut Vec<Node> {
        match self.branches.last_mut() {
            Some(branch) => &mut branch.attachment,
            None => &mut self.preamble,
        }
    }

    fn unknown_tag(&mut self, tag: &str, markup: &str) -> Result<()> {
        match tag {
            "when" => self.record_when(markup),
            "else" => self.record_else(markup),
            _ => Err(LiquidError::Syntax(format!("Unknown tag '{}'", tag))),
        }
    }
}
