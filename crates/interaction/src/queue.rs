use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::ActionDefinition;
use crate::filter::Target;
use crate::map::Position;
use crate::world::SessionId;

const STATE_HISTORY_LIMIT: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct QueueTicket(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueuedActionState {
    Pending,
    Fired,
    Superseded,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueuedAction {
    pub ticket: QueueTicket,
    #[serde(flatten)]
    pub action: ActionDefinition,
    pub coordinates: Position,
    pub target: Target,
    #[serde(skip)]
    pub session: SessionId,
}

/// At most one pending action per session; queueing again replaces the
/// previous one instead of stacking behind it.
#[derive(Debug, Clone, Default)]
pub struct DeferredActionQueue {
    next_ticket: u64,
    pending_by_session: HashMap<SessionId, QueuedAction>,
    states_by_ticket: BTreeMap<QueueTicket, QueuedActionState>,
}

impl DeferredActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `definition` to `session` without making it pending. Nothing
    /// changes until the returned action is passed to `commit`.
    pub fn bind(
        &mut self,
        definition: &ActionDefinition,
        destination: Position,
        target: Target,
        session: &SessionId,
    ) -> QueuedAction {
        let ticket = QueueTicket(self.next_ticket);
        self.next_ticket = self.next_ticket.saturating_add(1);
        QueuedAction {
            ticket,
            action: definition.clone(),
            coordinates: destination,
            target,
            session: session.clone(),
        }
    }

    pub fn commit(&mut self, queued: QueuedAction) -> Option<QueuedAction> {
        let session = queued.session.clone();
        let ticket = queued.ticket;
        let destination = queued.coordinates;
        let name = queued.action.name.clone();

        let superseded = self.pending_by_session.insert(session.clone(), queued);
        if let Some(previous) = &superseded {
            self.set_state(previous.ticket, QueuedActionState::Superseded);
            info!(
                session = session.as_str(),
                ticket = previous.ticket.0,
                action = %previous.action.name,
                "queued_action_superseded"
            );
        }
        self.set_state(ticket, QueuedActionState::Pending);
        info!(
            session = session.as_str(),
            ticket = ticket.0,
            action = %name,
            x = destination.x,
            y = destination.y,
            "action_queued"
        );
        superseded
    }

    pub fn queue(
        &mut self,
        definition: &ActionDefinition,
        destination: Position,
        target: Target,
        session: &SessionId,
    ) -> (QueuedAction, Option<QueuedAction>) {
        let queued = self.bind(definition, destination, target, session);
        let superseded = self.commit(queued.clone());
        (queued, superseded)
    }

    pub fn pending(&self, session: &SessionId) -> Option<&QueuedAction> {
        self.pending_by_session.get(session)
    }

    pub fn pending_count(&self) -> usize {
        self.pending_by_session.len()
    }

    pub fn arrive(&mut self, session: &SessionId, position: Position) -> Option<QueuedAction> {
        let destination = self.pending_by_session.get(session)?.coordinates;
        if destination != position {
            debug!(
                session = session.as_str(),
                x = position.x,
                y = position.y,
                "arrival_not_at_destination"
            );
            return None;
        }
        let fired = self.pending_by_session.remove(session)?;
        self.set_state(fired.ticket, QueuedActionState::Fired);
        info!(
            session = session.as_str(),
            ticket = fired.ticket.0,
            action = %fired.action.name,
            "queued_action_fired"
        );
        Some(fired)
    }

    pub fn cancel(&mut self, session: &SessionId) -> Option<QueuedAction> {
        let cancelled = self.pending_by_session.remove(session)?;
        self.set_state(cancelled.ticket, QueuedActionState::Cancelled);
        info!(
            session = session.as_str(),
            ticket = cancelled.ticket.0,
            action = %cancelled.action.name,
            "queued_action_cancelled"
        );
        Some(cancelled)
    }

    /// Drops the session's pending action because a later selection moved the
    /// player somewhere else without queueing anything.
    pub fn supersede(&mut self, session: &SessionId) -> Option<QueuedAction> {
        let superseded = self.pending_by_session.remove(session)?;
        self.set_state(superseded.ticket, QueuedActionState::Superseded);
        info!(
            session = session.as_str(),
            ticket = superseded.ticket.0,
            action = %superseded.action.name,
            "queued_action_superseded"
        );
        Some(superseded)
    }

    pub fn retain_sessions(&mut self, live: &HashSet<SessionId>) -> Vec<QueuedAction> {
        let departed = self
            .pending_by_session
            .keys()
            .filter(|session| !live.contains(*session))
            .cloned()
            .collect::<Vec<_>>();
        departed
            .iter()
            .filter_map(|session| self.cancel(session))
            .collect()
    }

    pub fn state_of(&self, ticket: QueueTicket) -> Option<QueuedActionState> {
        self.states_by_ticket.get(&ticket).copied()
    }

    fn set_state(&mut self, ticket: QueueTicket, state: QueuedActionState) {
        self.states_by_ticket.insert(ticket, state);
        while self.states_by_ticket.len() > STATE_HISTORY_LIMIT {
            let oldest_terminal = self
                .states_by_ticket
                .iter()
                .find(|(_, state)| **state != QueuedActionState::Pending)
                .map(|(ticket, _)| *ticket);
            match oldest_terminal {
                Some(ticket) => {
                    self.states_by_ticket.remove(&ticket);
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ContextClasses, TargetRequirement};

    fn take() -> ActionDefinition {
        ActionDefinition::new("take", "Take", ContextClasses::ITEM)
            .queueable()
            .requiring(TargetRequirement::DroppedItem)
    }

    #[test]
    fn second_selection_replaces_pending_action() {
        let mut queue = DeferredActionQueue::new();
        let session = SessionId::new("sock-1");
        let definition = take();

        let (first, superseded) =
            queue.queue(&definition, Position::new(4, 4), Target::Nothing, &session);
        assert!(superseded.is_none());

        let (second, superseded) =
            queue.queue(&definition, Position::new(9, 2), Target::Nothing, &session);
        assert_eq!(superseded.map(|action| action.ticket), Some(first.ticket));
        assert_eq!(queue.pending_count(), 1);
        assert_eq!(
            queue.pending(&session).map(|action| action.coordinates),
            Some(Position::new(9, 2))
        );
        assert_eq!(queue.state_of(first.ticket), Some(QueuedActionState::Superseded));
        assert_eq!(queue.state_of(second.ticket), Some(QueuedActionState::Pending));
    }

    #[test]
    fn queueing_leaves_definition_untouched() {
        let mut queue = DeferredActionQueue::new();
        let definition = take();
        let before = definition.clone();

        queue.queue(&definition, Position::new(1, 1), Target::Nothing, &SessionId::new("a"));
        queue.queue(&definition, Position::new(2, 2), Target::Nothing, &SessionId::new("b"));

        assert_eq!(definition, before);
        assert_eq!(queue.pending_count(), 2);
    }

    #[test]
    fn arrival_fires_once_only_at_destination() {
        let mut queue = DeferredActionQueue::new();
        let session = SessionId::new("sock-1");
        let (queued, _) = queue.queue(&take(), Position::new(5, 6), Target::Nothing, &session);

        assert!(queue.arrive(&session, Position::new(5, 5)).is_none());
        assert_eq!(queue.state_of(queued.ticket), Some(QueuedActionState::Pending));

        let fired = queue.arrive(&session, Position::new(5, 6)).expect("fired");
        assert_eq!(fired.ticket, queued.ticket);
        assert_eq!(queue.state_of(queued.ticket), Some(QueuedActionState::Fired));
        assert!(queue.arrive(&session, Position::new(5, 6)).is_none());
    }

    #[test]
    fn cancel_and_departed_sessions() {
        let mut queue = DeferredActionQueue::new();
        let stays = SessionId::new("stays");
        let leaves = SessionId::new("leaves");
        let (a, _) = queue.queue(&take(), Position::new(1, 1), Target::Nothing, &stays);
        let (b, _) = queue.queue(&take(), Position::new(2, 2), Target::Nothing, &leaves);

        let live = HashSet::from([stays.clone()]);
        let dropped = queue.retain_sessions(&live);
        assert_eq!(dropped.len(), 1);
        assert_eq!(queue.state_of(b.ticket), Some(QueuedActionState::Cancelled));

        assert_eq!(queue.cancel(&stays).map(|action| action.ticket), Some(a.ticket));
        assert!(queue.cancel(&stays).is_none());
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn bound_action_stays_invisible_until_committed() {
        let mut queue = DeferredActionQueue::new();
        let session = SessionId::new("sock-1");
        let (first, _) = queue.queue(&take(), Position::new(1, 1), Target::Nothing, &session);

        let bound = queue.bind(&take(), Position::new(2, 2), Target::Nothing, &session);
        assert_ne!(bound.ticket, first.ticket);
        assert_eq!(queue.state_of(bound.ticket), None);
        assert_eq!(queue.pending(&session).map(|action| action.ticket), Some(first.ticket));

        let replaced = queue.commit(bound.clone());
        assert_eq!(replaced.map(|action| action.ticket), Some(first.ticket));
        assert_eq!(queue.state_of(bound.ticket), Some(QueuedActionState::Pending));
    }

    #[test]
    fn supersede_without_replacement() {
        let mut queue = DeferredActionQueue::new();
        let session = SessionId::new("sock-1");
        let (queued, _) = queue.queue(&take(), Position::new(3, 3), Target::Nothing, &session);

        assert_eq!(queue.supersede(&session).map(|action| action.ticket), Some(queued.ticket));
        assert_eq!(queue.state_of(queued.ticket), Some(QueuedActionState::Superseded));
        assert!(queue.pending(&session).is_none());
        assert!(queue.supersede(&session).is_none());
    }

    #[test]
    fn state_history_is_bounded() {
        let mut queue = DeferredActionQueue::new();
        let session = SessionId::new("busy");
        let mut first_ticket = None;
        for step in 0..(STATE_HISTORY_LIMIT as i32 + 10) {
            let (queued, _) = queue.queue(&take(), Position::new(step, 0), Target::Nothing, &session);
            first_ticket.get_or_insert(queued.ticket);
        }
        assert!(queue.states_by_ticket.len() <= STATE_HISTORY_LIMIT);
        assert_eq!(first_ticket.and_then(|ticket| queue.state_of(ticket)), None);
    }
}
