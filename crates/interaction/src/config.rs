use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::map::{Viewport, ViewportClick, WalkabilityRules};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
    pub anchor: ViewportClick,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 13,
            height: 9,
            anchor: ViewportClick::new(6, 4),
        }
    }
}

impl ViewportConfig {
    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.width,
            height: self.height,
            anchor: self.anchor,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InteractionConfig {
    pub viewport: ViewportConfig,
    pub walkability: WalkabilityRules,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read interaction config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse interaction config at {json_path}: {source}")]
    Parse {
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("viewport must be at least 1x1, got {width}x{height}")]
    EmptyViewport { width: u32, height: u32 },
    #[error("viewport anchor ({x},{y}) lies outside the {width}x{height} viewport")]
    AnchorOutsideViewport {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
}

impl InteractionConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let config = serde_path_to_error::deserialize::<_, Self>(&mut deserializer).map_err(
            |error| {
                let path = error.path().to_string();
                ConfigError::Parse {
                    json_path: if path.is_empty() { ".".to_string() } else { path },
                    source: error.into_inner(),
                }
            },
        )?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ViewportConfig {
            width,
            height,
            anchor,
        } = self.viewport;
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyViewport { width, height });
        }
        if !self.viewport.viewport().contains(anchor) {
            return Err(ConfigError::AnchorOutsideViewport {
                x: anchor.x,
                y: anchor.y,
                width,
                height,
            });
        }
        Ok(())
    }
}

pub fn load_config_file(path: &Path) -> Result<InteractionConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = InteractionConfig::from_json_str(&raw)?;
    info!(
        path = %path.display(),
        width = config.viewport.width,
        height = config.viewport.height,
        blocked_terrain = config.walkability.blocked_terrain.len(),
        "interaction_config_loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::map::ObjectId;

    #[test]
    fn missing_fields_take_defaults() {
        let config = InteractionConfig::from_json_str("{}").expect("config");
        assert_eq!(config, InteractionConfig::default());
        assert_eq!(config.viewport.anchor, ViewportClick::new(6, 4));
        assert!(config.walkability.blocked_terrain.contains(&2));
    }

    #[test]
    fn parses_viewport_and_walkability() {
        let raw = r#"{
            "viewport": {"width": 13, "height": 13, "anchor": {"x": 6, "y": 6}},
            "walkability": {"blocked_terrain": [2, 9], "blocked_objects": [14]}
        }"#;
        let config = InteractionConfig::from_json_str(raw).expect("config");
        assert_eq!(config.viewport.viewport().anchor, ViewportClick::new(6, 6));
        assert!(!config.walkability.is_walkable(9, None));
        assert!(!config.walkability.is_walkable(1, Some(ObjectId(14))));
        assert!(config.walkability.is_walkable(1, Some(ObjectId(15))));
    }

    #[test]
    fn parse_error_names_json_path() {
        let raw = r#"{"viewport": {"width": "wide"}}"#;
        match InteractionConfig::from_json_str(raw) {
            Err(ConfigError::Parse { json_path, .. }) => assert_eq!(json_path, "viewport.width"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_degenerate_viewports() {
        assert!(matches!(
            InteractionConfig::from_json_str(r#"{"viewport": {"width": 0}}"#),
            Err(ConfigError::EmptyViewport { width: 0, .. })
        ));
        assert!(matches!(
            InteractionConfig::from_json_str(
                r#"{"viewport": {"width": 5, "height": 5, "anchor": {"x": 5, "y": 0}}}"#
            ),
            Err(ConfigError::AnchorOutsideViewport { x: 5, .. })
        ));
    }

    #[test]
    fn loads_from_disk() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("interaction.json");
        fs::write(&path, r#"{"viewport": {"width": 15, "height": 11, "anchor": {"x": 7, "y": 5}}}"#)
            .expect("write config");

        let config = load_config_file(&path).expect("load");
        assert_eq!(config.viewport.width, 15);

        let missing = load_config_file(&temp.path().join("absent.json"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
