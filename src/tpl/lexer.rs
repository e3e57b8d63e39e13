use crate::Result;
use crate::error::LiquidError;
use regex::Regex;
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{%.*?%\}|\{\{.*?\}\}").expect("valid regex"));
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\{%\s*(\w+)\s*(.*?)\s*%\}$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token<'a> {
    Text(&'a str),
    /// `{% name markup %}`
    Tag { name: &'a str, markup: &'a str },
    /// `{{ markup }}`
    Output(&'a str),
}

/// Splits template source into text, tag and output tokens in document order.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token<'_>>> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    for m in TOKEN.find_iter(source) {
        if m.start() > pos {
            tokens.push(Token::Text(&source[pos..m.start()]));
        }
        let raw = m.as_str();
        if let Some(inner) = raw.strip_prefix("{{") {
            let inner = inner.strip_suffix("}}").unwrap_or(inner);
            tokens.push(Token::Output(inner.trim()));
        } else {
            let caps = TAG.captures(raw).ok_or_else(|| {
                LiquidError::Syntax(format!("Tag '{}' was not properly terminated", raw))
            })?;
            let (_, [name, markup]) = caps.extract();
            tokens.push(Token::Tag { name, markup });
        }
        pos = m.end();
    }

    if pos < source.len() {
        tokens.push(Token::Text(&source[pos..]));
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_mixed() {
        let tokens = tokenize("Hi {{ name }}!{% if x %}y{% endif %}").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Text("Hi "),
                Token::Output("name"),
                Token::Text("!"),
                Token::Tag { name: "if", markup: "x" },
                Token::Text("y"),
                Token::Tag { name: "endif", markup: "" },
            ]
        );
    }

    #[test]
    fn test_multiline_tag() {
        let tokens = tokenize("{% assign\n  a = 1 %}").unwrap();
        assert_eq!(tokens, vec![Token::Tag { name: "assign", markup: "a = 1" }]);
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(tokenize("no tags {here}").unwrap(), vec![Token::Text("no tags {here}")]);
        assert!(tokenize("").unwrap().is_empty());
    }

    #[test]
    fn test_tag_without_name() {
        assert!(matches!(tokenize("{% %}"), Err(LiquidError::Syntax(_))));
    }
}
