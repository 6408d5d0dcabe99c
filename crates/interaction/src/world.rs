//! Read-only views of externally owned state, captured once per interaction.

use serde::{Deserialize, Serialize};

use crate::map::{Position, TileLayers};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub socket_id: SessionId,
    pub uuid: String,
    #[serde(flatten)]
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedItem {
    #[serde(flatten)]
    pub position: Position,
    pub id: u32,
    pub uuid: String,
    #[serde(default)]
    pub slot: Option<u32>,
    #[serde(default)]
    pub examine: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Npc {
    #[serde(flatten)]
    pub position: Position,
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub examine: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: u32,
    pub uuid: String,
    #[serde(default)]
    pub examine: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub player: PlayerState,
    pub layers: TileLayers,
    #[serde(default)]
    pub npcs: Vec<Npc>,
    #[serde(default)]
    pub dropped_items: Vec<DroppedItem>,
}

impl WorldSnapshot {
    /// First dropped item at `position` in list order.
    pub fn dropped_item_at(&self, position: Position) -> Option<&DroppedItem> {
        self.dropped_items
            .iter()
            .find(|item| item.position == position)
    }

    pub fn npc_at(&self, position: Position) -> Option<&Npc> {
        self.npcs.iter().find(|npc| npc.position == position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(x: i32, y: i32, id: u32) -> DroppedItem {
        DroppedItem {
            position: Position::new(x, y),
            id,
            uuid: format!("item-{id}"),
            slot: None,
            examine: None,
        }
    }

    #[test]
    fn first_match_in_list_order_wins() {
        let snapshot = WorldSnapshot {
            player: PlayerState {
                socket_id: SessionId::new("s1"),
                uuid: "p1".to_string(),
                position: Position::new(0, 0),
            },
            layers: TileLayers::new(4, 4, vec![1; 16], vec![0; 16]).expect("layers"),
            npcs: Vec::new(),
            dropped_items: vec![item(1, 1, 9), item(2, 2, 4), item(2, 2, 5)],
        };

        assert_eq!(snapshot.dropped_item_at(Position::new(2, 2)).map(|i| i.id), Some(4));
        assert!(snapshot.dropped_item_at(Position::new(3, 3)).is_none());
        assert!(snapshot.npc_at(Position::new(2, 2)).is_none());
    }

    #[test]
    fn entities_deserialize_with_flat_coordinates() {
        let npc: Npc =
            serde_json::from_str(r#"{"x":3,"y":4,"id":12,"name":"Guard"}"#).expect("npc");
        assert_eq!(npc.position, Position::new(3, 4));
        assert_eq!(npc.examine, None);

        let player: PlayerState =
            serde_json::from_str(r#"{"socket_id":"abc","uuid":"u-1","x":10,"y":11}"#)
                .expect("player");
        assert_eq!(player.socket_id.as_str(), "abc");
        assert_eq!(player.position, Position::new(10, 11));
    }
}
