use std::fs;
use std::path::Path;

use interaction::{ClickContext, ContextClasses, MiscData, Position, ViewportClick, WorldSnapshot};
use serde::Deserialize;

/// A recorded interaction: one world snapshot and the inputs replayed against it.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    pub(crate) snapshot: WorldSnapshot,
    #[serde(default)]
    pub(crate) steps: Vec<ScenarioStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub(crate) enum ScenarioStep {
    Open(OpenStep),
    Select { action: String },
    Arrive(Position),
    Interrupt {},
}

/// Pointer press on the map (`click` set) or on a UI panel (`click` absent).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct OpenStep {
    #[serde(default)]
    pub(crate) click: Option<ViewportClick>,
    #[serde(default)]
    pub(crate) classes: Vec<String>,
    #[serde(default)]
    pub(crate) misc: MiscData,
}

impl OpenStep {
    pub(crate) fn click_context(&self) -> ClickContext {
        ClickContext {
            click: self.click,
            classes: ContextClasses::from_class_list(self.classes.iter().map(String::as_str)),
            misc: self.misc.clone(),
        }
    }
}

pub(crate) fn load_scenario_file(path: &Path) -> Result<Scenario, String> {
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("read scenario '{}': {error}", path.display()))?;
    parse_scenario_json(&raw)
}

pub(crate) fn parse_scenario_json(raw: &str) -> Result<Scenario, String> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, Scenario>(&mut deserializer) {
        Ok(scenario) => Ok(scenario),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(format!("parse scenario json: {source}"))
            } else {
                Err(format!("parse scenario json at {path}: {source}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    const MINIMAL: &str = r#"{
        "snapshot": {
            "player": {"socket_id": "sock-1", "uuid": "p-1", "x": 4, "y": 4},
            "layers": {"width": 2, "height": 1, "background": [1, 1]}
        },
        "steps": [
            {"open": {"click": {"x": 6, "y": 4}, "classes": ["tile", "hover"]}},
            {"select": {"action": "walk-here"}},
            {"arrive": {"x": 4, "y": 4}},
            {"interrupt": {}}
        ]
    }"#;

    #[test]
    fn parses_every_step_kind() {
        let scenario = parse_scenario_json(MINIMAL).expect("scenario");
        assert_eq!(scenario.snapshot.player.position, Position::new(4, 4));
        assert_eq!(scenario.steps.len(), 4);

        let ScenarioStep::Open(open) = &scenario.steps[0] else {
            panic!("expected open step, got {:?}", scenario.steps[0]);
        };
        let context = open.click_context();
        assert_eq!(context.click, Some(ViewportClick::new(6, 4)));
        assert_eq!(context.classes, ContextClasses::TILE);

        assert_eq!(
            scenario.steps[1],
            ScenarioStep::Select {
                action: "walk-here".to_string()
            }
        );
        assert_eq!(scenario.steps[2], ScenarioStep::Arrive(Position::new(4, 4)));
        assert_eq!(scenario.steps[3], ScenarioStep::Interrupt {});
    }

    #[test]
    fn panel_open_has_no_click() {
        let raw = r#"{
            "snapshot": {
                "player": {"socket_id": "s", "uuid": "p", "x": 0, "y": 0},
                "layers": {"width": 1, "height": 1, "background": [1]}
            },
            "steps": [{"open": {"classes": ["inventory"], "misc": {"slot": 2, "item": {"id": 5, "uuid": "u1"}}}}]
        }"#;
        let scenario = parse_scenario_json(raw).expect("scenario");
        let ScenarioStep::Open(open) = &scenario.steps[0] else {
            panic!("expected open step");
        };
        let context = open.click_context();
        assert_eq!(context.click, None);
        assert_eq!(context.misc.slot, Some(2));
    }

    #[test]
    fn parse_errors_name_the_failing_path() {
        let raw = r#"{
            "snapshot": {
                "player": {"socket_id": "s", "uuid": "p", "x": 0, "y": 0},
                "layers": {"width": 1, "height": 1, "background": [1]}
            },
            "steps": [{"select": {"action": 7}}]
        }"#;
        let err = parse_scenario_json(raw).expect_err("bad action type");
        assert!(err.contains("steps[0]"), "unexpected error: {err}");
    }

    #[test]
    fn load_reports_missing_file() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("demo.json");
        let err = load_scenario_file(&path).expect_err("missing file");
        assert!(err.starts_with("read scenario"));

        fs::write(&path, MINIMAL).expect("write scenario");
        assert!(load_scenario_file(&path).is_ok());
    }
}
