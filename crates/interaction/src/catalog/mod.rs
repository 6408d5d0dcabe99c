mod database;
mod defaults;
mod loader;
mod types;

pub use database::{ActionCatalog, CatalogError};
pub use defaults::builtin_catalog;
pub use loader::{
    load_catalog_file, parse_catalog_xml, CatalogErrorCode, CatalogLoadError, SourceLocation,
};
pub use types::{ActionDefinition, ActionKind, ContextClass, ContextClasses, TargetRequirement};
