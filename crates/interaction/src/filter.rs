use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::catalog::{ActionDefinition, ContextClasses, TargetRequirement};
use crate::map::Position;
use crate::menu::MiscData;
use crate::world::{DroppedItem, ItemRef, Npc, WorldSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Target {
    Nothing,
    DroppedItem(DroppedItem),
    Npc(Npc),
    InventoryItem { item: ItemRef, slot: Option<u32> },
}

impl Target {
    pub fn examine_text(&self) -> Option<&str> {
        match self {
            Self::Nothing => None,
            Self::DroppedItem(item) => item.examine.as_deref(),
            Self::Npc(npc) => npc.examine.as_deref(),
            Self::InventoryItem { item, .. } => item.examine.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AdmissionContext<'a> {
    pub snapshot: &'a WorldSnapshot,
    pub coordinates: Option<Position>,
    pub classes: ContextClasses,
    pub misc: &'a MiscData,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("admission check for '{action}' failed: {reason}")]
    Failed { action: String, reason: String },
    #[error("admission data for '{action}' is unavailable")]
    Unavailable { action: String },
}

/// Decides whether one catalog action is offered for the current click.
///
/// `Ok(None)` excludes the action; `Ok(Some(target))` admits it with the
/// resolved target. Implementations may await external data.
#[async_trait]
pub trait AdmissionCheck: Send + Sync {
    async fn admit(
        &self,
        definition: &ActionDefinition,
        context: &AdmissionContext<'_>,
    ) -> Result<Option<Target>, AdmissionError>;
}

/// Entity-presence admission policy driven by each action's `requires`.
///
/// When several entities share the clicked coordinate the first one in the
/// snapshot list wins, so results follow insertion order. For actions that
/// require nothing, an NPC takes precedence over a dropped item.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextFilter;

impl ContextFilter {
    pub fn admit_now(
        &self,
        definition: &ActionDefinition,
        context: &AdmissionContext<'_>,
    ) -> Option<Target> {
        match definition.requires {
            TargetRequirement::Nothing => Some(occupant(context)),
            TargetRequirement::DroppedItem => context
                .coordinates
                .and_then(|at| context.snapshot.dropped_item_at(at))
                .cloned()
                .map(Target::DroppedItem),
            TargetRequirement::Npc => context
                .coordinates
                .and_then(|at| context.snapshot.npc_at(at))
                .cloned()
                .map(Target::Npc),
            TargetRequirement::InventoryItem => inventory_target(context.misc),
        }
    }
}

#[async_trait]
impl AdmissionCheck for ContextFilter {
    async fn admit(
        &self,
        definition: &ActionDefinition,
        context: &AdmissionContext<'_>,
    ) -> Result<Option<Target>, AdmissionError> {
        Ok(self.admit_now(definition, context))
    }
}

fn occupant(context: &AdmissionContext<'_>) -> Target {
    let Some(at) = context.coordinates else {
        return inventory_target(context.misc).unwrap_or(Target::Nothing);
    };
    if let Some(npc) = context.snapshot.npc_at(at) {
        return Target::Npc(npc.clone());
    }
    if let Some(item) = context.snapshot.dropped_item_at(at) {
        return Target::DroppedItem(item.clone());
    }
    Target::Nothing
}

fn inventory_target(misc: &MiscData) -> Option<Target> {
    misc.item.clone().map(|item| Target::InventoryItem {
        item,
        slot: misc.slot,
    })
}
