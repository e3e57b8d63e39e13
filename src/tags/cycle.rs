use crate::Result;
use crate::context::Context;
use crate::error::LiquidError;
use crate::tags::QUOTED_FRAGMENT;
use crate::tpl::Tag;
use crate::value::Value;
use regex::Regex;
use std::sync::LazyLock;

static NAMED_SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?s)({})\s*:\s*(.*)", QUOTED_FRAGMENT)).expect("valid regex")
});
static VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(QUOTED_FRAGMENT).expect("valid regex"));

/// Group key for a cycle tag.
#[derive(Debug)]
enum GroupName {
    /// `name:` prefix, resolved at render time.
    Named(String),
    /// Derived from the value list, so identical lists share one position.
    Values(String),
}

/// `{% cycle [name:] a, b, c %}` emits the next value of its group.
#[derive(Debug)]
struct Cycle {
    name: GroupName,
    values: Vec<String>,
}

fn values_from(markup: &str) -> Vec<String> {
    VALUE.find_iter(markup).map(|m| m.as_str().to_string()).collect()
}

pub(crate) fn cycle(_tag: &str, markup: &str) -> Result<Box<dyn Tag>> {
    let (name, values) = match NAMED_SYNTAX.captures(markup) {
        Some(caps) => (GroupName::Named(caps[1].to_string()), values_from(&caps[2])),
        None => {
            let values = values_from(markup);
            (GroupName::Values(format!("'{}'", values.join(","))), values)
        }
    };
    if values.is_empty() {
        return Err(LiquidError::Syntax(
            "Syntax error in 'cycle' - Valid syntax: cycle [name :] var [, var2, var3 ...]"
                .to_string(),
        ));
    }
    Ok(Box::new(Cycle { name, values }))
}

impl Cycle {
    fn key(&self, ctx: &mut Context<'_>) -> String {
        match &self.name {
            GroupName::Named(token) => match ctx.get(token) {
                Value::Null => token.clone(),
                value => value.to_key(),
            },
            GroupName::Values(key) => key.clone(),
        }
    }
}

impl Tag for Cycle {
    fn render(&self, ctx: &mut Context<'_>, out: &mut String) -> Result<()> {
        let key = self.key(ctx);
        let position = ctx
            .register_map("cycle")
            .get(&key)
            .and_then(Value::to_i64)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0)
            % self.values.len();

        let value = ctx.get(&self.values[position]);
        let next = (position + 1) % self.values.len();
        ctx.register_map("cycle").insert(key, Value::I64(next as i64));
        out.push_str(&value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::test_support::render;

    #[test]
    fn test_cycle_wraps() {
        let out = render(r#"{% cycle "a","b","c" %},{% cycle "a","b","c" %},{% cycle "a","b","c" %},{% cycle "a","b","c" %}"#, vec![]);
        assert_eq!(out, "a,b,c,a");
    }

    #[test]
    fn test_named_groups_are_independent() {
        let out = render(
            "{% cycle 'g1': 'x', 'y' %}{% cycle 'g2': 'x', 'y' %}{% cycle 'g1': 'x', 'y' %}",
            vec![],
        );
        assert_eq!(out, "xxy");
    }

    #[test]
    fn test_values_resolve_through_context() {
        let out = render(
            "{% for i in (1..3) %}{% cycle odd, even %}{% endfor %}",
            vec![("odd", Value::Str("O".into())), ("even", Value::Str("E".into()))],
        );
        assert_eq!(out, "OEO");
    }

    #[test]
    fn test_empty_cycle() {
        assert!(matches!(cycle("cycle", "  "), Err(LiquidError::Syntax(_))));
    }
}
