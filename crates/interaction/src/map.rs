use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Foreground tile codes above zero encode an object id shifted by this amount.
pub const FOREGROUND_OBJECT_OFFSET: i32 = 253;

const DEFAULT_BLOCKED_TERRAIN: [i32; 1] = [2];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewportClick {
    pub x: i32,
    pub y: i32,
}

impl ViewportClick {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub anchor: ViewportClick,
}

impl Viewport {
    pub fn contains(&self, click: ViewportClick) -> bool {
        click.x >= 0
            && click.y >= 0
            && (click.x as u32) < self.width
            && (click.y as u32) < self.height
    }
}

/// `absolute = player - anchor + click`, or `None` when the click misses the
/// viewport or the result leaves the coordinate range.
pub fn resolve_click(
    player: Position,
    viewport: &Viewport,
    click: ViewportClick,
) -> Option<Position> {
    if !viewport.contains(click) {
        return None;
    }
    Some(Position {
        x: player.x.checked_sub(viewport.anchor.x)?.checked_add(click.x)?,
        y: player.y.checked_sub(viewport.anchor.y)?.checked_add(click.y)?,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub i32);

pub fn decode_foreground_object(code: i32) -> Option<ObjectId> {
    if code <= 0 {
        return None;
    }
    Some(ObjectId(code - FOREGROUND_OBJECT_OFFSET))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkabilityRules {
    pub blocked_terrain: BTreeSet<i32>,
    pub blocked_objects: BTreeSet<ObjectId>,
}

impl Default for WalkabilityRules {
    fn default() -> Self {
        Self {
            blocked_terrain: DEFAULT_BLOCKED_TERRAIN.into_iter().collect(),
            blocked_objects: BTreeSet::new(),
        }
    }
}

impl WalkabilityRules {
    pub fn is_walkable(&self, background: i32, object: Option<ObjectId>) -> bool {
        if self.blocked_terrain.contains(&background) {
            return false;
        }
        !object.is_some_and(|object| self.blocked_objects.contains(&object))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTileLayers")]
pub struct TileLayers {
    width: u32,
    height: u32,
    background: Vec<i32>,
    foreground: Vec<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TileLayersError {
    #[error("map of {width}x{height} tiles is too large")]
    DimensionsTooLarge { width: u32, height: u32 },
    #[error("{layer} tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch {
        layer: &'static str,
        expected: usize,
        actual: usize,
    },
}

#[derive(Deserialize)]
struct RawTileLayers {
    width: u32,
    height: u32,
    background: Vec<i32>,
    #[serde(default)]
    foreground: Option<Vec<i32>>,
}

impl TryFrom<RawTileLayers> for TileLayers {
    type Error = TileLayersError;

    fn try_from(raw: RawTileLayers) -> Result<Self, Self::Error> {
        let foreground = match raw.foreground {
            Some(foreground) => foreground,
            None => {
                let tile_count = tile_count(raw.width, raw.height)?;
                check_layer_len("background", tile_count, raw.background.len())?;
                vec![0; tile_count]
            }
        };
        Self::new(raw.width, raw.height, raw.background, foreground)
    }
}

fn tile_count(width: u32, height: u32) -> Result<usize, TileLayersError> {
    (width as usize)
        .checked_mul(height as usize)
        .ok_or(TileLayersError::DimensionsTooLarge { width, height })
}

fn check_layer_len(
    layer: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), TileLayersError> {
    if actual != expected {
        return Err(TileLayersError::TileCountMismatch {
            layer,
            expected,
            actual,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTile {
    pub position: Position,
    pub background: i32,
    pub object: Option<ObjectId>,
    pub walkable: bool,
}

impl TileLayers {
    pub fn new(
        width: u32,
        height: u32,
        background: Vec<i32>,
        foreground: Vec<i32>,
    ) -> Result<Self, TileLayersError> {
        let expected = tile_count(width, height)?;
        check_layer_len("background", expected, background.len())?;
        check_layer_len("foreground", expected, foreground.len())?;
        Ok(Self {
            width,
            height,
            background,
            foreground,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn index_of(&self, position: Position) -> Option<usize> {
        if position.x < 0 || position.y < 0 {
            return None;
        }
        let (x, y) = (position.x as u32, position.y as u32);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn background_at(&self, position: Position) -> Option<i32> {
        self.index_of(position)
            .and_then(|index| self.background.get(index).copied())
    }

    pub fn foreground_at(&self, position: Position) -> Option<i32> {
        self.index_of(position)
            .and_then(|index| self.foreground.get(index).copied())
    }

    pub fn object_at(&self, position: Position) -> Option<ObjectId> {
        self.foreground_at(position)
            .and_then(decode_foreground_object)
    }

    pub fn foreground_objects(&self) -> Vec<(Position, ObjectId)> {
        let width = self.width.max(1) as usize;
        self.foreground
            .iter()
            .enumerate()
            .filter_map(|(index, code)| {
                let object = decode_foreground_object(*code)?;
                let position = Position::new((index % width) as i32, (index / width) as i32);
                Some((position, object))
            })
            .collect()
    }

    pub fn is_walkable(&self, position: Position, rules: &WalkabilityRules) -> bool {
        self.resolve_tile(position, rules)
            .is_some_and(|tile| tile.walkable)
    }

    pub fn resolve_tile(&self, position: Position, rules: &WalkabilityRules) -> Option<ResolvedTile> {
        let background = self.background_at(position)?;
        let object = self.object_at(position);
        Some(ResolvedTile {
            position,
            background,
            object,
            walkable: rules.is_walkable(background, object),
        })
    }
}
