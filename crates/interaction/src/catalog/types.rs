use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextClass {
    Tile,
    Item,
    Npc,
    Attackable,
    Inventory,
    Equipment,
}

impl ContextClass {
    pub const ALL: [ContextClass; 6] = [
        Self::Tile,
        Self::Item,
        Self::Npc,
        Self::Attackable,
        Self::Inventory,
        Self::Equipment,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Self::Tile => "tile",
            Self::Item => "item",
            Self::Npc => "npc",
            Self::Attackable => "attackable",
            Self::Inventory => "inventory",
            Self::Equipment => "equipment",
        }
    }

    pub fn flag(self) -> ContextClasses {
        match self {
            Self::Tile => ContextClasses::TILE,
            Self::Item => ContextClasses::ITEM,
            Self::Npc => ContextClasses::NPC,
            Self::Attackable => ContextClasses::ATTACKABLE,
            Self::Inventory => ContextClasses::INVENTORY,
            Self::Equipment => ContextClasses::EQUIPMENT,
        }
    }
}

impl FromStr for ContextClass {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|class| class.token() == value)
            .ok_or_else(|| format!("unknown context class '{value}'"))
    }
}

impl fmt::Display for ContextClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct ContextClasses: u8 {
        const TILE = 1 << 0;
        const ITEM = 1 << 1;
        const NPC = 1 << 2;
        const ATTACKABLE = 1 << 3;
        const INVENTORY = 1 << 4;
        const EQUIPMENT = 1 << 5;
    }
}

impl ContextClasses {
    /// Builds the set from a UI element's raw class list. Tokens that are not
    /// capability tags (styling classes and the like) are ignored.
    pub fn from_class_list<'a>(classes: impl IntoIterator<Item = &'a str>) -> Self {
        classes
            .into_iter()
            .filter_map(|token| token.trim().parse::<ContextClass>().ok())
            .fold(Self::empty(), |set, class| set | class.flag())
    }

    pub fn classes(self) -> impl Iterator<Item = ContextClass> {
        ContextClass::ALL
            .into_iter()
            .filter(move |class| self.contains(class.flag()))
    }
}

impl FromIterator<ContextClass> for ContextClasses {
    fn from_iter<T: IntoIterator<Item = ContextClass>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |set, class| set | class.flag())
    }
}

impl Serialize for ContextClasses {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.classes())
    }
}

impl<'de> Deserialize<'de> for ContextClasses {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let classes = Vec::<ContextClass>::deserialize(deserializer)?;
        Ok(classes.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetRequirement {
    #[default]
    Nothing,
    DroppedItem,
    Npc,
    InventoryItem,
}

impl FromStr for TargetRequirement {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "nothing" => Ok(Self::Nothing),
            "dropped-item" => Ok(Self::DroppedItem),
            "npc" => Ok(Self::Npc),
            "inventory-item" => Ok(Self::InventoryItem),
            other => Err(format!(
                "unknown requirement '{other}'; allowed values: nothing, dropped-item, npc, inventory-item"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    WalkHere,
    Take,
    Examine,
    Equip,
    Unequip,
    Drop,
    Cancel,
    Other,
}

impl ActionKind {
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "walk-here" => Self::WalkHere,
            "take" => Self::Take,
            "examine" => Self::Examine,
            "equip" => Self::Equip,
            "unequip" => Self::Unequip,
            "drop" => Self::Drop,
            "cancel" => Self::Cancel,
            _ => Self::Other,
        }
    }

    pub fn is_movement_gated(self) -> bool {
        matches!(self, Self::WalkHere | Self::Take)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDefinition {
    pub name: String,
    pub label: String,
    pub context: ContextClasses,
    pub queueable: bool,
    #[serde(default)]
    pub requires: TargetRequirement,
}

impl ActionDefinition {
    pub fn new(name: &str, label: &str, context: ContextClasses) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            context,
            queueable: false,
            requires: TargetRequirement::Nothing,
        }
    }

    pub fn queueable(mut self) -> Self {
        self.queueable = true;
        self
    }

    pub fn requiring(mut self, requires: TargetRequirement) -> Self {
        self.requires = requires;
        self
    }

    pub fn kind(&self) -> ActionKind {
        ActionKind::from_name(&self.name)
    }

    pub fn applies_to(&self, classes: ContextClasses) -> bool {
        self.context.intersects(classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_list_ignores_unrelated_tokens() {
        let classes = ContextClasses::from_class_list(["npc", "attackable", "highlight", ""]);
        assert_eq!(classes, ContextClasses::NPC | ContextClasses::ATTACKABLE);
    }

    #[test]
    fn any_overlap_applies() {
        let examine = ActionDefinition::new(
            "examine",
            "Examine",
            ContextClasses::NPC | ContextClasses::ITEM,
        );
        assert!(examine.applies_to(ContextClasses::NPC | ContextClasses::ATTACKABLE));
        assert!(!examine.applies_to(ContextClasses::INVENTORY));
        assert!(!examine.applies_to(ContextClasses::empty()));
    }

    #[test]
    fn kind_matches_case_insensitively() {
        assert_eq!(ActionKind::from_name("Walk-Here"), ActionKind::WalkHere);
        assert_eq!(ActionKind::from_name("TAKE"), ActionKind::Take);
        assert_eq!(ActionKind::from_name("dance"), ActionKind::Other);
        assert!(ActionKind::Take.is_movement_gated());
        assert!(!ActionKind::Drop.is_movement_gated());
    }

    #[test]
    fn classes_serialize_as_tokens() {
        let json = serde_json::to_value(ContextClasses::ITEM | ContextClasses::TILE).expect("json");
        assert_eq!(json, serde_json::json!(["tile", "item"]));

        let parsed: ContextClasses = serde_json::from_value(json).expect("parse");
        assert_eq!(parsed, ContextClasses::ITEM | ContextClasses::TILE);
        assert!(serde_json::from_str::<ContextClasses>(r#"["wizard"]"#).is_err());
    }
}
