//! The built-in tag set.

mod assign;
mod capture;
mod case;
mod comment;
mod cycle;
mod for_tag;
mod if_tag;
mod ifchanged;
mod include;

use crate::tpl::TagFactory;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// A quoted string or a bare token.
pub(crate) const QUOTED_FRAGMENT: &str = r#""[^"]+"|'[^']+'|[^\s,|]+"#;

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(\w*?)\s*:\s*({})", QUOTED_FRAGMENT)).expect("valid regex")
});

/// `key: value` pairs found anywhere in `markup`, in order.
pub(crate) fn attributes(markup: &str) -> Vec<(String, String)> {
    ATTRIBUTE
        .captures_iter(markup)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect()
}

/// The tags every environment starts with.
pub fn builtin() -> HashMap<String, TagFactory> {
    let mut tags = HashMap::new();
    tags.insert("assign".to_string(), TagFactory::Tag(assign::assign));
    tags.insert("capture".to_string(), TagFactory::Block(capture::capture));
    tags.insert("cache".to_string(), TagFactory::Block(capture::cache));
    tags.insert("case".to_string(), TagFactory::Block(case::case));
    tags.insert("comment".to_string(), TagFactory::Block(comment::comment));
    tags.insert("cycle".to_string(), TagFactory::Tag(cycle::cycle));
    tags.insert("for".to_string(), TagFactory::Block(for_tag::for_loop));
    tags.insert("if".to_string(), TagFactory::Block(if_tag::if_block));
    tags.insert("unless".to_string(), TagFactory::Block(if_tag::unless_block));
    tags.insert("ifchanged".to_string(), TagFactory::Block(ifchanged::ifchanged));
    tags.insert("include".to_string(), TagFactory::Tag(include::include));
    tags
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::environment::Environment;
    use crate::value::Value;

    pub(crate) fn render(source: &str, vars: Vec<(&str, Value)>) -> String {
        let env = Environment::new().rethrow_errors(true);
        render_in(&env, source, vars)
    }

    pub(crate) fn render_in(env: &Environment, source: &str, vars: Vec<(&str, Value)>) -> String {
        let assigns = Value::Map(vars.into_iter().map(|(k, v)| (k.to_string(), v)).collect());
        env.render_str(source, &assigns).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes() {
        assert_eq!(
            attributes("item in items limit: 2 offset:continue"),
            vec![
                ("limit".to_string(), "2".to_string()),
                ("offset".to_string(), "continue".to_string()),
            ]
        );
        assert!(attributes("item in items").is_empty());
    }
}
