//! Per-player interaction flow: open a menu, pick an entry, emit what it implies.

use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use crate::catalog::ActionCatalog;
use crate::config::InteractionConfig;
use crate::dispatch::{translate, CommandSink, Dispatch, NotificationBus, OutboundCommand};
use crate::filter::AdmissionCheck;
use crate::map::{Position, Viewport, WalkabilityRules};
use crate::menu::{ClickContext, Menu, MenuBuilder};
use crate::queue::{DeferredActionQueue, QueuedAction};
use crate::world::{SessionId, WorldSnapshot};

#[derive(Debug, Error)]
pub enum InteractionError {
    #[error(transparent)]
    Sink(#[from] crate::dispatch::SinkError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionOutcome {
    pub queued: Option<QueuedAction>,
    /// Pending action this selection replaced or made obsolete.
    pub superseded: Option<QueuedAction>,
    pub dispatch: Dispatch,
}

impl SelectionOutcome {
    fn inert() -> Self {
        Self {
            queued: None,
            superseded: None,
            dispatch: Dispatch::Nothing,
        }
    }
}

pub struct Session<'c> {
    catalog: &'c ActionCatalog,
    viewport: Viewport,
    walkability: WalkabilityRules,
    queue: DeferredActionQueue,
}

impl<'c> Session<'c> {
    pub fn new(catalog: &'c ActionCatalog, viewport: Viewport, walkability: WalkabilityRules) -> Self {
        Self {
            catalog,
            viewport,
            walkability,
            queue: DeferredActionQueue::new(),
        }
    }

    pub fn from_config(catalog: &'c ActionCatalog, config: &InteractionConfig) -> Self {
        Self::new(
            catalog,
            config.viewport.viewport(),
            config.walkability.clone(),
        )
    }

    pub fn queue(&self) -> &DeferredActionQueue {
        &self.queue
    }

    pub async fn open_menu(
        &self,
        snapshot: &WorldSnapshot,
        click: &ClickContext,
        check: &dyn AdmissionCheck,
    ) -> Menu<'c> {
        MenuBuilder::new(self.catalog, self.viewport)
            .build(snapshot, click, check)
            .await
    }

    /// Acts on the menu entry called `name`. The queue only changes once
    /// every command for the selection has been accepted by `sink`.
    pub fn select(
        &mut self,
        snapshot: &WorldSnapshot,
        menu: &Menu<'_>,
        name: &str,
        sink: &mut dyn CommandSink,
        bus: &mut dyn NotificationBus,
    ) -> Result<SelectionOutcome, InteractionError> {
        let Some(candidate) = menu.find(name) else {
            debug!(action = name, "selection_not_offered");
            return Ok(SelectionOutcome::inert());
        };

        let player = &snapshot.player;
        let tile = menu
            .coordinates
            .and_then(|at| snapshot.layers.resolve_tile(at, &self.walkability));
        let dispatch = translate(candidate, player, menu.click, tile.as_ref());

        let definition = candidate.definition;
        let suppressed =
            definition.kind().is_movement_gated() && dispatch == Dispatch::Nothing;
        let destination = menu
            .coordinates
            .filter(|destination| *destination != player.position);

        let bound = match destination {
            Some(destination) if definition.queueable && !suppressed => Some(self.queue.bind(
                definition,
                destination,
                candidate.target.clone(),
                &player.socket_id,
            )),
            _ => None,
        };

        if let Some(queued) = &bound {
            sink.send(OutboundCommand::queue_action(queued.clone()))?;
        }
        match &dispatch {
            Dispatch::Command(command) => sink.send(command.clone())?,
            Dispatch::Notify(notification) => bus.publish(notification.clone()),
            Dispatch::Nothing => {}
        }

        let mut outcome = SelectionOutcome::inert();
        match bound {
            Some(queued) => {
                outcome.superseded = self.queue.commit(queued.clone());
                outcome.queued = Some(queued);
            }
            None if matches!(dispatch, Dispatch::Command(OutboundCommand::MouseTo(_))) => {
                outcome.superseded = self.queue.supersede(&player.socket_id);
            }
            None => {}
        }
        outcome.dispatch = dispatch;
        Ok(outcome)
    }

    pub fn movement_arrived(
        &mut self,
        session: &SessionId,
        position: Position,
    ) -> Option<QueuedAction> {
        self.queue.arrive(session, position)
    }

    pub fn movement_interrupted(&mut self, session: &SessionId) -> Option<QueuedAction> {
        self.queue.cancel(session)
    }

    pub fn retain_sessions(&mut self, live: &HashSet<SessionId>) -> Vec<QueuedAction> {
        self.queue.retain_sessions(live)
    }
}
