use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::{ActionCatalog, ActionDefinition, ContextClasses};
use crate::filter::{AdmissionCheck, AdmissionContext, Target};
use crate::map::{resolve_click, Position, Viewport, ViewportClick};
use crate::world::{ItemRef, WorldSnapshot};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiscData {
    #[serde(default)]
    pub slot: Option<u32>,
    #[serde(default)]
    pub item: Option<ItemRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickContext {
    /// Viewport tile under the cursor; `None` when the click landed on a UI panel.
    pub click: Option<ViewportClick>,
    pub classes: ContextClasses,
    pub misc: MiscData,
}

impl ClickContext {
    pub fn on_map(click: ViewportClick, classes: ContextClasses) -> Self {
        Self {
            click: Some(click),
            classes,
            misc: MiscData::default(),
        }
    }

    pub fn on_panel(classes: ContextClasses, misc: MiscData) -> Self {
        Self {
            click: None,
            classes,
            misc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateAction<'c> {
    pub definition: &'c ActionDefinition,
    pub target: Target,
    pub misc: MiscData,
}

impl CandidateAction<'_> {
    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu<'c> {
    pub click: Option<ViewportClick>,
    pub coordinates: Option<Position>,
    pub items: Vec<CandidateAction<'c>>,
}

impl<'c> Menu<'c> {
    fn empty(click: Option<ViewportClick>) -> Self {
        Self {
            click,
            coordinates: None,
            items: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.items
            .iter()
            .map(|item| item.definition.label.as_str())
            .collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(CandidateAction::name).collect()
    }

    pub fn find(&self, name: &str) -> Option<&CandidateAction<'c>> {
        self.items
            .iter()
            .find(|item| item.definition.name.eq_ignore_ascii_case(name))
    }
}

pub struct MenuBuilder<'c> {
    catalog: &'c ActionCatalog,
    viewport: Viewport,
}

impl<'c> MenuBuilder<'c> {
    pub fn new(catalog: &'c ActionCatalog, viewport: Viewport) -> Self {
        Self { catalog, viewport }
    }

    /// Runs every catalog action matching the clicked classes through `check`,
    /// one at a time in catalog order. A failing check only drops its own action.
    pub async fn build(
        &self,
        snapshot: &WorldSnapshot,
        click: &ClickContext,
        check: &dyn AdmissionCheck,
    ) -> Menu<'c> {
        let coordinates = match click.click {
            Some(viewport_click) => {
                match resolve_click(snapshot.player.position, &self.viewport, viewport_click) {
                    Some(position) => Some(position),
                    None => {
                        debug!(
                            x = viewport_click.x,
                            y = viewport_click.y,
                            "click_resolution_miss"
                        );
                        return Menu::empty(click.click);
                    }
                }
            }
            None => None,
        };

        let context = AdmissionContext {
            snapshot,
            coordinates,
            classes: click.classes,
            misc: &click.misc,
        };

        let mut items = Vec::new();
        for definition in self.catalog.lookup(click.classes) {
            match check.admit(definition, &context).await {
                Ok(Some(target)) => items.push(CandidateAction {
                    definition,
                    target,
                    misc: click.misc.clone(),
                }),
                Ok(None) => {}
                Err(error) => warn!(
                    action = %definition.name,
                    error = %error,
                    "admission_check_failed"
                ),
            }
        }

        debug!(candidate_count = items.len(), "menu_built");
        Menu {
            click: click.click,
            coordinates,
            items,
        }
    }
}
