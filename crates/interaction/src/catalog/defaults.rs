use super::database::ActionCatalog;
use super::types::{ActionDefinition, ContextClasses, TargetRequirement};

fn builtin_definitions() -> Vec<ActionDefinition> {
    let map = ContextClasses::TILE | ContextClasses::ITEM | ContextClasses::NPC;
    vec![
        ActionDefinition::new("walk-here", "Walk here", map),
        ActionDefinition::new("take", "Take", ContextClasses::ITEM)
            .queueable()
            .requiring(TargetRequirement::DroppedItem),
        ActionDefinition::new(
            "examine",
            "Examine",
            map | ContextClasses::INVENTORY | ContextClasses::EQUIPMENT,
        ),
        ActionDefinition::new("equip", "Equip", ContextClasses::INVENTORY)
            .requiring(TargetRequirement::InventoryItem),
        ActionDefinition::new("unequip", "Unequip", ContextClasses::EQUIPMENT)
            .requiring(TargetRequirement::InventoryItem),
        ActionDefinition::new("drop", "Drop", ContextClasses::INVENTORY)
            .requiring(TargetRequirement::InventoryItem),
        ActionDefinition::new("cancel", "Cancel", ContextClasses::all()),
    ]
}

pub fn builtin_catalog() -> ActionCatalog {
    ActionCatalog::from_definitions(builtin_definitions()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid_and_ordered() {
        let definitions = builtin_definitions();
        let catalog = ActionCatalog::from_definitions(definitions.clone()).expect("valid");
        let names = catalog
            .definitions()
            .iter()
            .map(|def| def.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec!["walk-here", "take", "examine", "equip", "unequip", "drop", "cancel"]
        );
        assert_eq!(builtin_catalog().len(), definitions.len());
    }

    #[test]
    fn only_take_is_queueable() {
        let queueable = builtin_catalog()
            .definitions()
            .iter()
            .filter(|def| def.queueable)
            .map(|def| def.name.clone())
            .collect::<Vec<_>>();
        assert_eq!(queueable, vec!["take".to_string()]);
    }
}
