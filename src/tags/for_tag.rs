use crate::Result;
use crate::context::Context;
use crate::error::LiquidError;
use crate::tags::attributes;
use crate::tpl::render::render_all;
use crate::tpl::{Block, Node, Tag};
use crate::value::Value;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\w+)\s+in\s+((?:\(?[\w\-\.\[\]]\)?)+)").expect("valid regex")
});

/// `{% for item in collection [limit: n] [offset: n|continue] %}`
#[derive(Debug)]
struct For {
    variable: String,
    collection: String,
    /// `item-collection`, the key of this loop's pagination register.
    name: String,
    limit: Option<String>,
    offset: Option<String>,
    nodelist: Vec<Node>,
}

pub(crate) fn for_loop(_tag: &str, markup: &str) -> Result<Box<dyn Block>> {
    let caps = SYNTAX.captures(markup).ok_or_else(|| {
        LiquidError::Syntax(
            "Syntax error in 'for loop' - Valid syntax: for [item] in [collection]".to_string(),
        )
    })?;
    let variable = caps[1].to_string();
    let collection = caps[2].to_string();

    let mut limit = None;
    let mut offset = None;
    for (key, value) in attributes(markup) {
        match key.as_str() {
            "limit" => limit = Some(value),
            "offset" => offset = Some(value),
            _ => {}
        }
    }

    Ok(Box::new(For {
        name: format!("{}-{}", variable, collection),
        variable,
        collection,
        limit,
        offset,
        nodelist: Vec::new(),
    }))
}

impl For {
    /// The `[start, end)` window over a collection of `len` items.
    fn window(&self, ctx: &mut Context<'_>, len: usize) -> (usize, usize) {
        if self.limit.is_none() && self.offset.is_none() {
            return (0, len);
        }

        let offset = match self.offset.as_deref() {
            Some("continue") => ctx
                .register_map("for")
                .get(&self.name)
                .and_then(Value::to_i64)
                .unwrap_or(0),
            Some(token) => ctx.get(token).to_i64().unwrap_or(0),
            None => 0,
        }
        .max(0);
        let end = match self.limit.as_deref() {
            Some(token) => offset.saturating_add(ctx.get(token).to_i64().unwrap_or(0).max(0)),
            None => len as i64,
        };
        ctx.register_map("for").insert(self.name.clone(), Value::I64(end));

        let clamp = |n: i64| usize::try_from(n).map_or(len, |n| n.min(len));
        (clamp(offset), clamp(end))
    }
}

impl Tag for For {
    fn render(&self, ctx: &mut Context<'_>, out: &mut String) -> Result<()> {
        let mut items = ctx.get(&self.collection).into_items();
        let (start, end) = self.window(ctx, items.len());
        if start >= end {
            return Ok(());
        }
        let segment: Vec<Value> = items.drain(start..end).collect();
        let length = segment.len();

        ctx.stack(|ctx| {
            for (index, item) in segment.into_iter().enumerate() {
                ctx.set(self.variable.as_str(), item);
                let forloop: HashMap<String, Value> = [
                    ("name", Value::Str(self.name.clone())),
                    ("length", Value::I64(length as i64)),
                    ("index", Value::I64(index as i64 + 1)),
                    ("index0", Value::I64(index as i64)),
                    ("rindex", Value::I64((length - index) as i64)),
                    ("rindex0", Value::I64((length - index - 1) as i64)),
                    ("first", Value::Bool(index == 0)),
                    ("last", Value::Bool(index == length - 1)),
                ]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect();
                ctx.set("forloop", Value::Map(forloop));
                render_all(&self.nodelist, ctx, out)?;
            }
            Ok(())
        })
    }
}

impl Block for For {
    fn nodelist(&mut self) -> &mut Vec<Node> {
        &mut self.nodelist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::test_support::render;
    use crate::value::ToValue;

    #[test]
    fn test_limit_and_offset() {
        let out = render(
            "{% for n in nums limit: 2 offset: 0 %}{{ n }}{% if forloop.last %}!{% endif %},{% endfor %}",
            vec![("nums", vec![10, 20, 30].to_value())],
        );
        assert_eq!(out, "10,20!,");
    }

    #[test]
    fn test_offset_without_limit_runs_to_the_end() {
        let out = render("{% for n in (1..5) offset: 3 %}{{ n }}{% endfor %}", vec![]);
        assert_eq!(out, "45");
    }

    #[test]
    fn test_offset_continue() {
        let out = render(
            "{% for n in nums limit: 2 %}{{ n }}{% endfor %}|{% for n in nums offset: continue limit: 2 %}{{ n }}{% endfor %}|{% for n in nums offset: continue limit: 2 %}{{ n }}{% endfor %}",
            vec![("nums", vec![1, 2, 3, 4, 5].to_value())],
        );
        assert_eq!(out, "12|34|5");
    }

    #[test]
    fn test_forloop_fields() {
        let out = render(
            "{% for c in list %}{{ forloop.index }}{{ forloop.index0 }}{{ forloop.rindex }}{{ forloop.rindex0 }}{{ forloop.first }}{{ forloop.length }} {% endfor %}{{ forloop.name }}",
            vec![("list", vec!["a", "b"].to_value())],
        );
        assert_eq!(out, "1021true2 2110false2 ");
    }

    #[test]
    fn test_map_iterates_sorted_pairs() {
        let mut map = HashMap::new();
        map.insert("b", 2);
        map.insert("a", 1);
        let out = render(
            "{% for pair in m %}{{ pair[0] }}={{ pair[1] }};{% endfor %}",
            vec![("m", map.to_value())],
        );
        assert_eq!(out, "a=1;b=2;");
    }

    #[test]
    fn test_empty_window_and_missing_collection() {
        assert_eq!(render("{% for n in nope %}x{% endfor %}", vec![]), "");
        assert_eq!(render("{% for n in (1..3) offset: 9 %}x{% endfor %}", vec![]), "");
    }

    #[test]
    fn test_bad_syntax() {
        assert!(matches!(for_loop("for", "item of items"), Err(LiquidError::Syntax(_))));
    }
}
