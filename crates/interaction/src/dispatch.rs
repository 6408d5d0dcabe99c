use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::catalog::ActionKind;
use crate::filter::Target;
use crate::map::{ResolvedTile, ViewportClick};
use crate::menu::CandidateAction;
use crate::queue::QueuedAction;
use crate::world::{PlayerState, SessionId};

pub const NOTHING_INTERESTING: &str = "Nothing interesting.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MouseToPayload {
    pub id: String,
    pub coordinates: ViewportClick,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRef {
    pub socket_id: SessionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueActionPayload {
    #[serde(flatten)]
    pub action: QueuedAction,
    pub player: SessionRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSlotRef {
    pub id: u32,
    pub uuid: String,
    pub slot: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemCommandPayload {
    pub id: String,
    pub item: ItemSlotRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropItem {
    pub id: u32,
    pub slot: Option<u32>,
    pub uuid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropPayload {
    pub id: String,
    pub item: DropItem,
}

/// Network command, encoded as `{"event": <name>, "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum OutboundCommand {
    #[serde(rename = "player:mouseTo")]
    MouseTo(MouseToPayload),
    #[serde(rename = "player:queueAction")]
    QueueAction(QueueActionPayload),
    #[serde(rename = "item:equip")]
    Equip(ItemCommandPayload),
    #[serde(rename = "item:unequip")]
    Unequip(ItemCommandPayload),
    #[serde(rename = "player:inventoryItemDrop")]
    InventoryItemDrop(DropPayload),
}

impl OutboundCommand {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::MouseTo(_) => "player:mouseTo",
            Self::QueueAction(_) => "player:queueAction",
            Self::Equip(_) => "item:equip",
            Self::Unequip(_) => "item:unequip",
            Self::InventoryItemDrop(_) => "player:inventoryItemDrop",
        }
    }

    pub fn queue_action(action: QueuedAction) -> Self {
        let player = SessionRef {
            socket_id: action.session.clone(),
        };
        Self::QueueAction(QueueActionPayload { action, player })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Normal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum Notification {
    #[serde(rename = "CHAT:MESSAGE")]
    Chat {
        #[serde(rename = "type")]
        kind: ChatKind,
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Command(OutboundCommand),
    Notify(Notification),
    Nothing,
}

/// Translates a selected action into at most one command or notification.
///
/// `walk-here` and `take` need `tile` to be walkable, otherwise nothing is
/// produced. `cancel` and unrecognized names are inert.
pub fn translate(
    candidate: &CandidateAction<'_>,
    player: &PlayerState,
    click: Option<ViewportClick>,
    tile: Option<&ResolvedTile>,
) -> Dispatch {
    let kind = candidate.definition.kind();
    match kind {
        ActionKind::WalkHere | ActionKind::Take => {
            let walkable = tile.is_some_and(|tile| tile.walkable);
            match click {
                Some(coordinates) if walkable => Dispatch::Command(OutboundCommand::MouseTo(
                    MouseToPayload {
                        id: player.uuid.clone(),
                        coordinates,
                    },
                )),
                _ => {
                    debug!(action = %candidate.definition.name, "movement_target_unwalkable");
                    Dispatch::Nothing
                }
            }
        }
        ActionKind::Examine => Dispatch::Notify(Notification::Chat {
            kind: ChatKind::Normal,
            text: candidate
                .target
                .examine_text()
                .unwrap_or(NOTHING_INTERESTING)
                .to_string(),
        }),
        ActionKind::Equip | ActionKind::Unequip | ActionKind::Drop => {
            let Target::InventoryItem { item, .. } = &candidate.target else {
                debug!(action = %candidate.definition.name, "inventory_action_without_item");
                return Dispatch::Nothing;
            };
            let slot = candidate.misc.slot;
            let command = match kind {
                ActionKind::Drop => OutboundCommand::InventoryItemDrop(DropPayload {
                    id: player.uuid.clone(),
                    item: DropItem {
                        id: item.id,
                        slot,
                        uuid: item.uuid.clone(),
                    },
                }),
                _ => {
                    let payload = ItemCommandPayload {
                        id: player.uuid.clone(),
                        item: ItemSlotRef {
                            id: item.id,
                            uuid: item.uuid.clone(),
                            slot,
                        },
                    };
                    if kind == ActionKind::Equip {
                        OutboundCommand::Equip(payload)
                    } else {
                        OutboundCommand::Unequip(payload)
                    }
                }
            };
            Dispatch::Command(command)
        }
        ActionKind::Cancel | ActionKind::Other => {
            debug!(action = %candidate.definition.name, "inert_action");
            Dispatch::Nothing
        }
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to encode {event}: {source}")]
    Encode {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {event}: {source}")]
    Write {
        event: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("outbound channel closed")]
    Closed,
}

/// Network transport boundary. Each command is sent exactly once.
pub trait CommandSink {
    fn send(&mut self, command: OutboundCommand) -> Result<(), SinkError>;
}

impl CommandSink for Vec<OutboundCommand> {
    fn send(&mut self, command: OutboundCommand) -> Result<(), SinkError> {
        self.push(command);
        Ok(())
    }
}

pub trait NotificationBus {
    fn publish(&mut self, notification: Notification);
}

impl NotificationBus for Vec<Notification> {
    fn publish(&mut self, notification: Notification) {
        self.push(notification);
    }
}
