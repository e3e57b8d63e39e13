pub mod context;
pub mod environment;
pub mod error;
pub mod strainer;
pub mod tags;
pub mod template;
pub mod template_loader;
pub mod tpl;
pub mod value;

pub use context::{Context, Scope};
pub use environment::Environment;
pub use error::{Error, LiquidError};
pub use template::Template;
pub use template_loader::{AssetLoader, FileSystemLoader, Loader, MemoryLoader};
pub use value::{Object, ToValue, Value, serializer::to_value};

#[doc(hidden)]
pub use ctor;
#[doc(hidden)]
pub use log;
pub use uliquid_macros::{ToValue, template_assets};

pub type Result<T> = std::result::Result<T, LiquidError>;
