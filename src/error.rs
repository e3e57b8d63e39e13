use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LiquidError {
    #[error("Syntax Error: {0}")]
    Syntax(String),
    #[error("Context stack error: the root scope cannot be popped")]
    ScopeUnderflow,
    #[error("Template Load Error: {0}")]
    TemplateLoad(String),
    #[error("Filter Error in '{name}': {message}")]
    Filter { name: String, message: String },
    #[error("Render Error: {0}")]
    Render(String),
    #[error("Serialization Error: {0}")]
    Serialization(String),
}

impl LiquidError {
    pub fn filter(name: impl Into<String>, message: impl Into<String>) -> Self {
        LiquidError::Filter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// The text spliced into the output in place of a failed node.
    pub fn inline_marker(&self) -> String {
        format!("Liquid error: {}", self)
    }
}

// Aliases for compatibility
pub type Error = LiquidError;

impl serde::ser::Error for LiquidError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        LiquidError::Serialization(msg.to_string())
    }
}
