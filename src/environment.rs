use std::collections::HashMap;
use std::sync::Arc;

use log::trace;

use crate::Result;
use crate::context::Context;
use crate::strainer::Strainer;
use crate::tags;
use crate::template::Template;
use crate::template_loader::{AssetLoader, Loader};
use crate::tpl::cache::TemplateCache;
use crate::tpl::condition::{Operator, default_operators};
use crate::tpl::parser::parse_template;
use crate::tpl::{BlockConstructor, TagConstructor, TagFactory};
use crate::value::{ToValue, Value};

/// The configuration root for parsing and rendering templates.
///
/// An `Environment` owns the tag registry, the filters, the comparison operators,
/// the loader used by `include` and [`Environment::render`], and a cache of parsed
/// templates. It is shared read-only by every render that runs against it.
///
/// ```ignore
/// let env = Environment::new().with_loader(MemoryLoader::new());
/// let out = env.render_str("Hello {{ name }}", &vars)?;
/// ```
pub struct Environment {
    /// Tag constructors keyed by tag name.
    tags: HashMap<String, TagFactory>,
    strainer: Strainer,
    operators: HashMap<String, Operator>,
    loader: Box<dyn Loader>,
    cache: TemplateCache,
    /// Default error policy for contexts created from this environment.
    rethrow: bool,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// Creates an environment with the built-in tags and operators, reading
    /// templates from the embedded asset store.
    pub fn new() -> Self {
        Self {
            tags: tags::builtin(),
            strainer: Strainer::new(),
            operators: default_operators(),
            loader: Box::new(AssetLoader),
            cache: TemplateCache::default(),
            rethrow: false,
        }
    }

    /// Replaces the template loader.
    pub fn with_loader(mut self, loader: impl Loader + 'static) -> Self {
        self.loader = Box::new(loader);
        self.cache.clear();
        self
    }

    /// Sets the default error policy. When set, a render aborts on the first error
    /// instead of emitting an inline error marker.
    pub fn rethrow_errors(mut self, rethrow: bool) -> Self {
        self.rethrow = rethrow;
        self
    }

    pub fn rethrows_errors(&self) -> bool {
        self.rethrow
    }

    pub fn tags(&self) -> &HashMap<String, TagFactory> {
        &self.tags
    }

    pub fn strainer(&self) -> &Strainer {
        &self.strainer
    }

    pub fn operator(&self, name: &str) -> Option<&Operator> {
        self.operators.get(name)
    }

    /// Registers a leaf tag, replacing any tag of the same name.
    pub fn register_tag(&mut self, name: impl Into<String>, construct: TagConstructor) -> &mut Self {
        self.tags.insert(name.into(), TagFactory::Tag(construct));
        self
    }

    /// Registers a block tag closed by `end<name>`.
    pub fn register_block(&mut self, name: impl Into<String>, construct: BlockConstructor) -> &mut Self {
        self.tags.insert(name.into(), TagFactory::Block(construct));
        self
    }

    pub fn add_filter<F>(&mut self, name: impl Into<String>, filter: F) -> &mut Self
    where
        F: Fn(&Context<'_>, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.strainer.register(name, filter);
        self
    }

    pub fn add_operator<F>(&mut self, name: impl Into<String>, predicate: F) -> &mut Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.operators.insert(name.into(), Arc::new(predicate));
        self
    }

    /// Parses `source` into a template that is not cached.
    pub fn parse(&self, source: &str) -> Result<Template> {
        self.compile("(inline)", source)
    }

    /// Returns the parsed template `name`, loading and caching it on first use.
    pub fn get_template(&self, name: &str) -> Result<Arc<Template>> {
        if let Some(template) = self.cache.get(name) {
            return Ok(template);
        }
        trace!("Loading template '{}'", name);
        let source = self.loader.load(name)?;
        let template = Arc::new(self.compile(name, &source)?);
        self.cache.insert(name, template.clone());
        Ok(template)
    }

    /// Parses `source` and caches it under `name`, replacing any cached entry.
    pub fn add_template(&self, name: &str, source: &str) -> Result<Arc<Template>> {
        let template = Arc::new(self.compile(name, source)?);
        self.cache.insert(name, template.clone());
        Ok(template)
    }

    /// Drops one cached template, or all of them when `name` is `None`.
    pub fn clear_cache(&self, name: Option<&str>) {
        match name {
            Some(name) => self.cache.remove(name),
            None => self.cache.clear(),
        }
    }

    pub fn render_str<T: ToValue + ?Sized>(&self, source: &str, assigns: &T) -> Result<String> {
        self.parse(source)?.render(self, assigns)
    }

    /// Renders the template `name` obtained through [`Environment::get_template`].
    pub fn render<T: ToValue + ?Sized>(&self, name: &str, assigns: &T) -> Result<String> {
        self.get_template(name)?.render(self, assigns)
    }

    fn compile(&self, name: &str, source: &str) -> Result<Template> {
        let root = parse_template(source, &self.tags)?;
        Ok(Template::new(name, root))
    }
}
