use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod catalog;
mod config;
mod dispatch;
mod filter;
mod map;
mod menu;
mod queue;
mod session;
mod world;

pub use catalog::{
    builtin_catalog, load_catalog_file, parse_catalog_xml, ActionCatalog, ActionDefinition,
    ActionKind, CatalogError, CatalogErrorCode, CatalogLoadError, ContextClass, ContextClasses,
    SourceLocation, TargetRequirement,
};
pub use config::{load_config_file, ConfigError, InteractionConfig, ViewportConfig};
pub use dispatch::{
    translate, ChatKind, CommandSink, Dispatch, DropItem, DropPayload, ItemCommandPayload,
    ItemSlotRef, MouseToPayload, Notification, NotificationBus, OutboundCommand,
    QueueActionPayload, SessionRef, SinkError, NOTHING_INTERESTING,
};
pub use filter::{AdmissionCheck, AdmissionContext, AdmissionError, ContextFilter, Target};
pub use map::{
    decode_foreground_object, resolve_click, ObjectId, Position, ResolvedTile, TileLayers,
    TileLayersError, Viewport, ViewportClick, WalkabilityRules, FOREGROUND_OBJECT_OFFSET,
};
pub use menu::{CandidateAction, ClickContext, Menu, MenuBuilder, MiscData};
pub use queue::{DeferredActionQueue, QueueTicket, QueuedAction, QueuedActionState};
pub use session::{InteractionError, SelectionOutcome, Session};
pub use world::{DroppedItem, ItemRef, Npc, PlayerState, SessionId, WorldSnapshot};

pub const ROOT_ENV_VAR: &str = "INTERACTION_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub catalog_path: PathBuf,
    pub config_path: PathBuf,
    pub scenarios_dir: PathBuf,
}

impl AppPaths {
    pub fn from_root(root: PathBuf) -> Self {
        let base = root.join("assets").join("base");
        Self {
            catalog_path: base.join("actions.xml"),
            config_path: base.join("interaction.json"),
            scenarios_dir: root.join("assets").join("scenarios"),
            root,
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "INTERACTION_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/project\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    resolve_root().map(AppPaths::from_root)
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(&PathBuf::from(value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            exe_dir
                .ancestors()
                .find(|candidate| is_repo_marker(candidate))
                .map(normalize_path)
                .ok_or_else(|| StartupError::RootNotFound {
                    start_dir: normalize_path(&exe_dir),
                    env_var: ROOT_ENV_VAR,
                })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn repo_marker_requires_cargo_toml() {
        let temp = TempDir::new().expect("tempdir");
        fs::create_dir_all(temp.path().join("assets")).expect("mkdir assets");
        assert!(!is_repo_marker(temp.path()));

        fs::write(temp.path().join("Cargo.toml"), "[workspace]").expect("write cargo toml");
        assert!(is_repo_marker(temp.path()));
    }

    #[test]
    fn app_paths_live_under_assets() {
        let paths = AppPaths::from_root(PathBuf::from("/srv/game"));
        assert_eq!(
            paths.catalog_path,
            PathBuf::from("/srv/game/assets/base/actions.xml")
        );
        assert_eq!(
            paths.config_path,
            PathBuf::from("/srv/game/assets/base/interaction.json")
        );
        assert_eq!(paths.scenarios_dir, PathBuf::from("/srv/game/assets/scenarios"));
    }
}
