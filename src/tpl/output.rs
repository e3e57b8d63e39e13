use crate::Result;
use crate::context::Context;
use crate::value::Value;
use regex::Regex;
use std::sync::LazyLock;

static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*("[^"]*"|'[^']*'|[^\s,|]+)"#).expect("valid regex"));
static FILTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\|\s*(\w+)((?:\s*[:,]\s*(?:"[^"]*"|'[^']*'|[^\s,|]+))*)"#).expect("valid regex")
});
static FILTER_ARG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[:,]\s*("[^"]*"|'[^']*'|[^\s,|]+)"#).expect("valid regex"));

/// `{{ expr | filter: arg, arg | filter }}`
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    name: String,
    filters: Vec<(String, Vec<String>)>,
}

impl Output {
    pub fn parse(markup: &str) -> Self {
        let name = NAME
            .captures(markup)
            .map(|c| c[1].to_string())
            .unwrap_or_default();
        let rest = &markup[NAME.find(markup).map(|m| m.end()).unwrap_or(0)..];
        let filters = FILTER
            .captures_iter(rest)
            .map(|caps| {
                let args = FILTER_ARG
                    .captures_iter(&caps[2])
                    .map(|a| a[1].to_string())
                    .collect();
                (caps[1].to_string(), args)
            })
            .collect();
        Self { name, filters }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filters(&self) -> &[(String, Vec<String>)] {
        &self.filters
    }

    /// Resolves the expression and pipes it through every filter in order.
    pub fn evaluate(&self, ctx: &mut Context<'_>) -> Result<Value> {
        let mut value = ctx.get(&self.name);
        for (filter, args) in &self.filters {
            let mut call_args = Vec::with_capacity(args.len() + 1);
            call_args.push(value);
            call_args.extend(args.iter().map(|a| ctx.get(a)));
            value = ctx.invoke(filter, call_args)?;
        }
        Ok(value)
    }

    pub fn render(&self, ctx: &mut Context<'_>, out: &mut String) -> Result<()> {
        let value = self.evaluate(ctx)?;
        out.push_str(&value.to_string());
        Ok(())
    }
}
