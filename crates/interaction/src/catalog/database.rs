use std::collections::HashMap;

use thiserror::Error;

use super::types::{ActionDefinition, ContextClasses};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("action name cannot be empty")]
    EmptyName,
    #[error("duplicate action name in catalog: {name}")]
    DuplicateName { name: String },
    #[error("action '{name}' applies to no context class")]
    NoContext { name: String },
}

/// Ordered action definitions. Order is both menu display order and the order
/// admission checks run in. Names are unique ignoring ASCII case, matching how
/// menu selections are looked up.
#[derive(Debug, Default, Clone)]
pub struct ActionCatalog {
    definitions: Vec<ActionDefinition>,
    index_by_name: HashMap<String, usize>,
}

impl ActionCatalog {
    pub fn from_definitions(definitions: Vec<ActionDefinition>) -> Result<Self, CatalogError> {
        let mut index_by_name = HashMap::with_capacity(definitions.len());
        for (index, definition) in definitions.iter().enumerate() {
            if definition.name.trim().is_empty() {
                return Err(CatalogError::EmptyName);
            }
            if definition.context.is_empty() {
                return Err(CatalogError::NoContext {
                    name: definition.name.clone(),
                });
            }
            if index_by_name
                .insert(definition.name.to_ascii_lowercase(), index)
                .is_some()
            {
                return Err(CatalogError::DuplicateName {
                    name: definition.name.clone(),
                });
            }
        }
        Ok(Self {
            definitions,
            index_by_name,
        })
    }

    pub fn lookup(&self, classes: ContextClasses) -> Vec<&ActionDefinition> {
        self.definitions
            .iter()
            .filter(|definition| definition.applies_to(classes))
            .collect()
    }

    pub fn definition(&self, name: &str) -> Option<&ActionDefinition> {
        self.index_by_name
            .get(&name.to_ascii_lowercase())
            .and_then(|index| self.definitions.get(*index))
    }

    pub fn definitions(&self) -> &[ActionDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
