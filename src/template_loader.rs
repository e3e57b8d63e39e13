use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use dashmap::DashMap;
use glob::glob;
use log::{trace, warn};

use crate::Result;
use crate::error::LiquidError;

/// Supplies template source by name, for `include` and [`crate::Environment::render`].
pub trait Loader: Send + Sync {
    fn load(&self, name: &str) -> Result<String>;
}

/// The name a template file is registered under: its file stem with one leading
/// underscore removed, so `snippets/_product.liquid` becomes `product`.
pub fn template_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    Some(stem.strip_prefix('_').unwrap_or(stem).to_string())
}

fn not_found(name: &str) -> LiquidError {
    LiquidError::TemplateLoad(format!("Template '{}' not found", name))
}

/// Templates held in memory.
#[derive(Default)]
pub struct MemoryLoader {
    templates: DashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, name: impl Into<String>, source: impl Into<String>) -> &Self {
        self.templates.insert(name.into(), source.into());
        self
    }

    /// Reads every file matching `pattern`, registered under [`template_name`].
    pub fn load_glob(&self, pattern: &str) -> Result<()> {
        let paths = glob(pattern).map_err(|e| {
            LiquidError::TemplateLoad(format!("Invalid glob pattern '{}': {}", pattern, e))
        })?;
        for entry in paths {
            let path = entry.map_err(|e| {
                LiquidError::TemplateLoad(format!("Unable to read path for '{}': {}", pattern, e))
            })?;
            if !path.is_file() {
                continue;
            }
            let source = fs::read_to_string(&path).map_err(|e| {
                LiquidError::TemplateLoad(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let name = template_name(&path).ok_or_else(|| {
                LiquidError::TemplateLoad(format!("Invalid template path: {}", path.display()))
            })?;
            trace!("Loaded template '{}' from {}", name, path.display());
            self.templates.insert(name, source);
        }
        Ok(())
    }

    /// Copies the embedded assets into this loader.
    pub fn load_assets(&self) {
        if let Some(store) = ASSETS.get() {
            for entry in store.iter() {
                self.templates.insert(entry.key().clone(), entry.value().to_string());
            }
        }
    }
}

impl Loader for MemoryLoader {
    fn load(&self, name: &str) -> Result<String> {
        self.templates
            .get(name)
            .map(|s| s.value().clone())
            .ok_or_else(|| not_found(name))
    }
}

/// Templates read from `root/<name>.<extension>`, falling back to the partial
/// spelling `root/<dir>/_<base>.<extension>`.
#[derive(Debug, Clone)]
pub struct FileSystemLoader {
    root: PathBuf,
    extension: String,
}

impl FileSystemLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: "liquid".to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    fn full_path(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        let escapes = name.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(LiquidError::TemplateLoad(format!(
                "Illegal template name '{}'",
                name
            )));
        }
        Ok(self.root.join(format!("{}.{}", name, self.extension)))
    }

    /// `dir/_name.ext`, the partial spelling of `dir/name.ext`.
    fn partial_path(path: &Path) -> Option<PathBuf> {
        let file = path.file_name()?.to_str()?;
        Some(path.with_file_name(format!("_{}", file)))
    }
}

impl Loader for FileSystemLoader {
    fn load(&self, name: &str) -> Result<String> {
        let mut path = self.full_path(name)?;
        if !path.is_file()
            && let Some(partial) = Self::partial_path(&path).filter(|p| p.is_file())
        {
            path = partial;
        }
        trace!("Reading template '{}' from {}", name, path.display());
        fs::read_to_string(&path).map_err(|e| {
            LiquidError::TemplateLoad(format!("Failed to read {}: {}", path.display(), e))
        })
    }
}

/// Embedded templates, keyed by [`template_name`].
static ASSETS: OnceLock<DashMap<String, &'static str>> = OnceLock::new();

/// Registers embedded templates given as `(path, source)` pairs. Called by the
/// code `template_assets!` generates; two assets with the same name are an error.
pub fn load_assets(assets: Vec<(&str, &'static str)>) -> Result<()> {
    let store = ASSETS.get_or_init(DashMap::new);
    for (path, source) in assets {
        let name = template_name(Path::new(path)).ok_or_else(|| {
            LiquidError::TemplateLoad(format!("Invalid template path: {}", path))
        })?;
        if store.contains_key(&name) {
            warn!("Duplicate template asset '{}' (source: {})", name, path);
            return Err(LiquidError::TemplateLoad(format!(
                "Duplicate template '{}' (source: {})",
                name, path
            )));
        }
        store.insert(name, source);
    }
    Ok(())
}

/// Reads the templates registered through `template_assets!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetLoader;

impl Loader for AssetLoader {
    fn load(&self, name: &str) -> Result<String> {
        ASSETS
            .get()
            .and_then(|store| store.get(name).map(|s| s.value().to_string()))
            .ok_or_else(|| not_found(name))
    }
}
