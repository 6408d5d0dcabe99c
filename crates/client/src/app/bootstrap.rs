use std::env;
use std::path::{Path, PathBuf};

use interaction::{
    builtin_catalog, load_catalog_file, load_config_file, resolve_app_paths, ActionCatalog,
    AppPaths, InteractionConfig,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::scenario::{load_scenario_file, Scenario};

const SCENARIO_ENV_VAR: &str = "INTERACTION_SCENARIO";
const DEFAULT_SCENARIO_FILE: &str = "demo.json";

pub(crate) struct AppWiring {
    pub(crate) catalog: ActionCatalog,
    pub(crate) config: InteractionConfig,
    pub(crate) scenario: Scenario,
}

pub(crate) fn build_app() -> Result<AppWiring, String> {
    init_tracing();
    info!("=== Interaction Client Startup ===");

    let paths = resolve_app_paths().map_err(|err| err.to_string())?;
    let config = load_config_or_default(&paths.config_path)?;
    let catalog = load_catalog_or_builtin(&paths.catalog_path)?;
    let scenario_path = scenario_path(
        env::args().nth(1),
        env::var(SCENARIO_ENV_VAR).ok(),
        &paths,
    );
    let scenario = load_scenario_file(&scenario_path)?;
    info!(
        path = %scenario_path.display(),
        steps = scenario.steps.len(),
        "scenario_loaded"
    );

    Ok(AppWiring {
        catalog,
        config,
        scenario,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_config_or_default(path: &Path) -> Result<InteractionConfig, String> {
    if !path.is_file() {
        info!(path = %path.display(), "interaction_config_missing_using_defaults");
        return Ok(InteractionConfig::default());
    }
    load_config_file(path).map_err(|err| err.to_string())
}

fn load_catalog_or_builtin(path: &Path) -> Result<ActionCatalog, String> {
    if !path.is_file() {
        let catalog = builtin_catalog();
        warn!(
            path = %path.display(),
            count = catalog.len(),
            "action_catalog_missing_using_builtin"
        );
        return Ok(catalog);
    }
    load_catalog_file(path).map_err(|err| err.to_string())
}

fn scenario_path(cli_arg: Option<String>, env_value: Option<String>, paths: &AppPaths) -> PathBuf {
    cli_arg
        .or(env_value)
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| paths.scenarios_dir.join(DEFAULT_SCENARIO_FILE))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn scenario_path_prefers_cli_then_env_then_default() {
        let paths = AppPaths::from_root(PathBuf::from("/srv/game"));
        assert_eq!(
            scenario_path(Some("a.json".to_string()), Some("b.json".to_string()), &paths),
            PathBuf::from("a.json")
        );
        assert_eq!(
            scenario_path(None, Some(" b.json ".to_string()), &paths),
            PathBuf::from("b.json")
        );
        assert_eq!(
            scenario_path(None, Some(String::new()), &paths),
            PathBuf::from("/srv/game/assets/scenarios/demo.json")
        );
    }

    #[test]
    fn missing_files_fall_back_to_defaults() {
        let temp = TempDir::new().expect("tempdir");
        let catalog =
            load_catalog_or_builtin(&temp.path().join("actions.xml")).expect("builtin catalog");
        assert_eq!(catalog.len(), builtin_catalog().len());

        let config =
            load_config_or_default(&temp.path().join("interaction.json")).expect("default config");
        assert_eq!(config, InteractionConfig::default());
    }

    #[test]
    fn present_but_broken_config_is_an_error() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("interaction.json");
        fs::write(&path, r#"{"viewport": {"height": -1}}"#).expect("write config");

        let err = load_config_or_default(&path).expect_err("broken config should fail");
        assert!(err.contains("viewport.height"), "unexpected error: {err}");
    }
}
