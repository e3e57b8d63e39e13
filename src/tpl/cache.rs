use crate::template::Template;
use dashmap::DashMap;
use log::trace;
use std::sync::Arc;

/// Parsed templates keyed by name.
#[derive(Default)]
pub(crate) struct TemplateCache {
    templates: DashMap<String, Arc<Template>>,
}

impl TemplateCache {
    pub(crate) fn get(&self, name: &str) -> Option<Arc<Template>> {
        let hit = self.templates.get(name).map(|t| t.value().clone());
        if hit.is_some() {
            trace!("Template cache hit: {}", name);
        }
        hit
    }

    pub(crate) fn insert(&self, name: &str, template: Arc<Template>) {
        self.templates.insert(name.to_string(), template);
    }

    pub(crate) fn remove(&self, name: &str) {
        self.templates.remove(name);
    }

    pub(crate) fn clear(&self) {
        self.templates.clear();
    }
}
