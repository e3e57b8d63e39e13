use crate::Result;
use crate::context::Context;
use crate::error::LiquidError;
use crate::tpl::condition::{Branch, Condition, Logic};
use crate::tpl::render::render_all;
use crate::tpl::{Block, Node, Tag};
use regex::Regex;
use std::sync::LazyLock;

static SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"("[^"]+"|'[^']+'|[^\s,|]+)\s*([=!<>a-z_]+)?\s*("[^"]+"|'[^']+'|[^\s,|]+)?"#,
    )
    .expect("valid regex")
});
static LOGIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(and|or)\b").expect("valid regex"));

/// `if` and `unless` with their `elsif`/`else` clauses.
#[derive(Debug)]
struct If {
    /// `unless` inverts the test of the first clause only.
    negate_first: bool,
    first: Branch,
    rest: Vec<Branch>,
}

pub(crate) fn if_block(tag: &str, markup: &str) -> Result<Box<dyn Block>> {
    build(tag, markup, false)
}

pub(crate) fn unless_block(tag: &str, markup: &str) -> Result<Box<dyn Block>> {
    build(tag, markup, true)
}

fn build(tag: &str, markup: &str, negate_first: bool) -> Result<Box<dyn Block>> {
    Ok(Box::new(If {
        negate_first,
        first: Branch::new(parse_expression(tag, markup)?),
        rest: Vec::new(),
    }))
}

fn clause(tag: &str, expression: &str) -> Result<Condition> {
    let caps = SYNTAX.captures(expression).ok_or_else(|| {
        LiquidError::Syntax(format!(
            "Syntax Error in tag '{tag}' - Valid syntax: {tag} [expression]"
        ))
    })?;
    Ok(Condition::new(
        &caps[1],
        caps.get(2).map(|m| m.as_str()),
        caps.get(3).map(|m| m.as_str()),
    ))
}

/// Builds the condition tree right to left: the last operand is innermost and each
/// earlier operand wraps the tree built so far. `a and b or c` is `a and (b or c)`.
fn parse_expression(tag: &str, markup: &str) -> Result<Condition> {
    let mut operands = Vec::new();
    let mut logics = Vec::new();
    let mut pos = 0;
    for m in LOGIC.find_iter(markup) {
        operands.push(&markup[pos..m.start()]);
        logics.push(if m.as_str() == "and" { Logic::And } else { Logic::Or });
        pos = m.end();
    }
    operands.push(&markup[pos..]);

    let mut operands = operands.into_iter().rev();
    let mut condition = clause(tag, operands.next().unwrap_or_default())?;
    for (logic, operand) in logics.into_iter().rev().zip(operands) {
        let outer = clause(tag, operand)?;
        condition = match logic {
            Logic::And => outer.and(condition),
            Logic::Or => outer.or(condition),
        };
    }
    Ok(condition)
}

impl Tag for If {
    fn render(&self, ctx: &mut Context<'_>, out: &mut String) -> Result<()> {
        ctx.stack(|ctx| {
            if self.first.condition.evaluate(ctx)? != self.negate_first {
                return render_all(&self.first.attachment, ctx, out);
            }
            for branch in &self.rest {
                if branch.condition.evaluate(ctx)? {
                    return render_all(&branch.attachment, ctx, out);
                }
            }
            Ok(())
        })
    }
}

impl Block for If {
    fn nodelist(&mut self) -> &mut Vec<Node> {
        match self.rest.last_mut() {
            Some(branch) => &mut branch.attachment,
            None => &mut self.first.attachment,
        }
    }

    fn unknown_tag(&mut self, tag: &str, markup: &str) -> Result<()> {
        let condition = match tag {
            "else" => Condition::Else,
            "elsif" => parse_expression(tag, markup)?,
            _ => return Err(LiquidError::Syntax(format!("Unknown tag '{}'", tag))),
        };
        self.rest.push(Branch::new(condition));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::test_support::render;
    use crate::value::Value;

    #[test]
    fn test_if_elsif_else() {
        let source = "{% if n > 10 %}big{% elsif n > 5 %}medium{% else %}small{% endif %}";
        assert_eq!(render(source, vec![("n", Value::I64(20))]), "big");
        assert_eq!(render(source, vec![("n", Value::I64(7))]), "medium");
        assert_eq!(render(source, vec![("n", Value::I64(1))]), "small");
    }

    #[test]
    fn test_right_to_left_association() {
        assert_eq!(render("{% if false and true or true %}T{% else %}F{% endif %}", vec![]), "F");
        assert_eq!(render("{% if true or false and false %}T{% else %}F{% endif %}", vec![]), "T");
    }

    #[test]
    fn test_unless_inverts_first_clause_only() {
        assert_eq!(render("{% unless false %}body{% endunless %}", vec![]), "body");
        assert_eq!(render("{% unless true %}body{% endunless %}", vec![]), "");
        assert_eq!(
            render("{% unless true %}a{% elsif true %}b{% endunless %}", vec![]),
            "b"
        );
        assert_eq!(
            render("{% unless true %}a{% elsif false %}b{% else %}c{% endunless %}", vec![]),
            "c"
        );
    }

    #[test]
    fn test_expression_shape() {
        let parsed = parse_expression("if", "a == 1 and b").unwrap();
        let expected = Condition::new("a", Some("=="), Some("1")).and(Condition::new("b", None, None));
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_missing_expression() {
        assert_eq!(
            if_block("if", "").unwrap_err(),
            LiquidError::Syntax("Syntax Error in tag 'if' - Valid syntax: if [expression]".to_string())
        );
    }
}
