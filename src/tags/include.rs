use crate::Result;
use crate::context::Context;
use crate::error::LiquidError;
use crate::tags::{QUOTED_FRAGMENT, attributes};
use crate::tpl::Tag;
use crate::tpl::render::render_all;
use crate::value::Value;
use regex::Regex;
use std::sync::LazyLock;

static SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"((?:{q})+)(\s+(?:with|for)\s+((?:{q})+))?",
        q = QUOTED_FRAGMENT
    ))
    .expect("valid regex")
});

/// `{% include 'name' [with|for expr] [key: value ...] %}`
#[derive(Debug)]
struct Include {
    /// Template name token, resolved at render time.
    template: String,
    binding: Option<String>,
    attributes: Vec<(String, String)>,
}

fn unquote(token: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = token.strip_prefix(quote).and_then(|t| t.strip_suffix(quote)) {
            return inner;
        }
    }
    token
}

pub(crate) fn include(_tag: &str, markup: &str) -> Result<Box<dyn Tag>> {
    let caps = SYNTAX.captures(markup).ok_or_else(|| {
        LiquidError::Syntax(
            "Error in tag 'include' - Valid syntax: include '[template]' (with|for) [object|collection]"
                .to_string(),
        )
    })?;
    Ok(Box::new(Include {
        template: caps[1].to_string(),
        binding: caps.get(3).map(|m| m.as_str().to_string()),
        attributes: attributes(markup),
    }))
}

impl Tag for Include {
    fn render(&self, ctx: &mut Context<'_>, out: &mut String) -> Result<()> {
        let name = match ctx.get(&self.template) {
            Value::Null => unquote(&self.template).to_string(),
            value => value.to_key(),
        };
        let partial = ctx.env().get_template(&name)?;
        // The partial sees its object under the template's base name.
        let local = name.rsplit('/').next().unwrap_or_default();
        let bound = ctx.get(self.binding.as_deref().unwrap_or(local));

        ctx.stack(|ctx| {
            for (key, token) in &self.attributes {
                let value = ctx.get(token);
                ctx.set(key.as_str(), value);
            }
            match bound {
                Value::List(items) => {
                    for item in items {
                        ctx.set(local, item);
                        render_all(partial.nodes(), ctx, out)?;
                    }
                    Ok(())
                }
                other => {
                    ctx.set(local, other);
                    render_all(partial.nodes(), ctx, out)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;
    use crate::tags::test_support::render_in;
    use crate::template_loader::MemoryLoader;
    use crate::value::ToValue;

    fn env() -> Environment {
        let loader = MemoryLoader::new();
        loader
            .add("product", "<{{ product }}{{ suffix }}>")
            .add("snippets/item", "({{ item }})");
        Environment::new().with_loader(loader).rethrow_errors(true)
    }

    #[test]
    fn test_include_with_object_and_attributes() {
        let out = render_in(
            &env(),
            "{% include 'product' with p suffix: '!' %}",
            vec![("p", Value::Str("shoe".into()))],
        );
        assert_eq!(out, "<shoe!>");
    }

    #[test]
    fn test_include_for_collection() {
        let out = render_in(
            &env(),
            "{% include 'snippets/item' for xs %}",
            vec![("xs", vec![1, 2, 3].to_value())],
        );
        assert_eq!(out, "(1)(2)(3)");
    }

    #[test]
    fn test_include_defaults_to_same_named_variable() {
        let out = render_in(&env(), "{% include 'product' %}", vec![("product", Value::I64(7))]);
        assert_eq!(out, "<7>");
    }

    #[test]
    fn test_partial_scope_is_popped() {
        let out = render_in(
            &env(),
            "{% include 'product' with p suffix: 's' %}[{{ suffix }}]",
            vec![("p", Value::I64(1))],
        );
        assert_eq!(out, "<1s>[]");
    }

    #[test]
    fn test_missing_partial_is_a_load_error() {
        let env = env();
        let assigns = Value::Map(Default::default());
        let err = env.render_str("{% include 'nope' %}", &assigns).unwrap_err();
        assert!(matches!(err, LiquidError::TemplateLoad(_)));
    }

    #[test]
    fn test_self_include_stops_at_nesting_limit() {
        let loader = MemoryLoader::new();
        loader.add("self", "x{% include 'self' %}");
        let env = Environment::new().with_loader(loader);
        let out = env.render_str("{% include 'self' %}", &()).unwrap();
        let marker = "Liquid error: Render Error: Nesting too deep";
        assert_eq!(out, format!("{}{}", "x".repeat(crate::context::MAX_DEPTH), marker));
    }

    #[test]
    fn test_mutual_include_rethrows_nesting_error() {
        let loader = MemoryLoader::new();
        loader
            .add("ping", "{% include 'pong' %}")
            .add("pong", "{% if true %}{% include 'ping' %}{% endif %}");
        let env = Environment::new().with_loader(loader).rethrow_errors(true);
        let err = env.render_str("{% include 'ping' %}", &()).unwrap_err();
        assert_eq!(err, LiquidError::Render("Nesting too deep".to_string()));
    }
}
