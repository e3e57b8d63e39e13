use crate::Result;
use crate::context::Context;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A named output filter. The first argument is the piped input.
pub type Filter = Arc<dyn Fn(&Context<'_>, &[Value]) -> Result<Value> + Send + Sync>;

/// The filters available to output nodes.
#[derive(Default, Clone)]
pub struct Strainer {
    filters: HashMap<String, Filter>,
}

impl Strainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `filter` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, filter: F)
    where
        F: Fn(&Context<'_>, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.filters.insert(name.into(), Arc::new(filter));
    }

    pub fn get(&self, name: &str) -> Option<&Filter> {
        self.filters.get(name)
    }

    pub fn responds_to(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;
    use crate::error::LiquidError;

    #[test]
    fn test_register_and_call() {
        let mut strainer = Strainer::new();
        strainer.register("upcase", |_: &Context<'_>, args: &[Value]| {
            Ok(Value::Str(args[0].to_string().to_uppercase()))
        });
        assert!(strainer.responds_to("upcase"));
        assert!(!strainer.responds_to("downcase"));

        let env = Environment::new();
        let ctx = Context::new(&env);
        let upcase = strainer.get("upcase").unwrap();
        assert_eq!(upcase(&ctx, &[Value::Str("abc".into())]).unwrap(), Value::Str("ABC".into()));
    }

    #[test]
    fn test_failing_filter_is_wrapped() {
        let mut env = Environment::new();
        env.add_filter("boom", |_: &Context<'_>, _: &[Value]| {
            Err(LiquidError::Render("exploded".to_string()))
        });
        let mut ctx = Context::new(&env);
        let err = ctx.invoke("boom", vec![Value::Null]).unwrap_err();
        assert_eq!(err, LiquidError::filter("boom", "Render Error: exploded"));
    }
}
