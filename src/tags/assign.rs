use crate::Result;
use crate::context::Context;
use crate::error::LiquidError;
use crate::tags::QUOTED_FRAGMENT;
use crate::tpl::Tag;
use regex::Regex;
use std::sync::LazyLock;

static SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"((?:\(?[\w\-\.\[\]]\)?)+)\s*=\s*((?:{})+)",
        QUOTED_FRAGMENT
    ))
    .expect("valid regex")
});

/// `{% assign name = source %}`
#[derive(Debug)]
struct Assign {
    to: String,
    from: String,
}

pub(crate) fn assign(_tag: &str, markup: &str) -> Result<Box<dyn Tag>> {
    let caps = SYNTAX.captures(markup).ok_or_else(|| {
        LiquidError::Syntax(
            "Syntax error in 'assign' - Valid syntax: assign [var] = [source]".to_string(),
        )
    })?;
    Ok(Box::new(Assign {
        to: caps[1].to_string(),
        from: caps[2].to_string(),
    }))
}

impl Tag for Assign {
    fn render(&self, ctx: &mut Context<'_>, _out: &mut String) -> Result<()> {
        let value = ctx.get(&self.from);
        ctx.set(self.to.as_str(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::test_support::render;
    use crate::value::Value;

    #[test]
    fn test_assign_literal_and_path() {
        assert_eq!(render("{% assign a = 'hi there' %}{{ a }}", vec![]), "hi there");
        assert_eq!(
            render(
                "{% assign t = page.title %}[{{ t }}]",
                vec![("page", Value::Map([("title".to_string(), Value::Str("Home".into()))].into()))]
            ),
            "[Home]"
        );
    }

    #[test]
    fn test_assign_writes_innermost_scope() {
        let out = render(
            "{% for i in (1..2) %}{% assign last = i %}{{ last }}{% endfor %}[{{ last }}]",
            vec![],
        );
        assert_eq!(out, "12[]");
    }

    #[test]
    fn test_bad_syntax() {
        let err = assign("assign", "nothing here").unwrap_err();
        assert_eq!(
            err,
            LiquidError::Syntax(
                "Syntax error in 'assign' - Valid syntax: assign [var] = [source]".to_string()
            )
        );
    }
}
