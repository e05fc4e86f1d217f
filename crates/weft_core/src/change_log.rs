//! Change log of committed transitions.
//!
//! Writes are staged as they happen. Several writes to one entity within a
//! single commit coalesce into one event holding the state before the first
//! write and after the last. On commit, events whose net effect is nothing are
//! dropped and the rest move to the committed log in the order their entities
//! were first touched. [`ChangeLog::drain`] hands the committed events to the
//! caller and empties the log.
//!
//! Staged events are never visible to a drain.

use crate::graph::{Atom, Edge, Node};
use crate::id::Id;
use crate::types::Kind;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};

/// Net effect of a write on one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    /// The entity went from absent to present.
    Insert,
    /// The entity stayed present with a different payload.
    Update,
    /// The entity went from present to absent.
    Delete,
}

/// One entity transition: the payload before and after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A node transition.
    Node {
        /// Node id.
        id: Id,
        /// Payload before.
        prev: Option<Node>,
        /// Payload after.
        curr: Option<Node>,
    },
    /// An edge transition.
    Edge {
        /// Edge id.
        id: Id,
        /// Payload before.
        prev: Option<Edge>,
        /// Payload after.
        curr: Option<Edge>,
    },
    /// An atom transition.
    Atom {
        /// Atom id.
        id: Id,
        /// Payload before.
        prev: Option<Atom>,
        /// Payload after.
        curr: Option<Atom>,
    },
}

impl Event {
    /// Kind of the entity.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Node { .. } => Kind::Node,
            Self::Edge { .. } => Kind::Edge,
            Self::Atom { .. } => Kind::Atom,
        }
    }

    /// Id of the entity.
    #[must_use]
    pub const fn id(&self) -> Id {
        match self {
            Self::Node { id, .. } | Self::Edge { id, .. } | Self::Atom { id, .. } => *id,
        }
    }

    /// Returns true if the payload is the same before and after.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        match self {
            Self::Node { prev, curr, .. } => prev == curr,
            Self::Edge { prev, curr, .. } => prev == curr,
            Self::Atom { prev, curr, .. } => prev == curr,
        }
    }

    /// Classifies the transition. `None` for a no-op.
    #[must_use]
    pub fn change_type(&self) -> Option<ChangeType> {
        if self.is_noop() {
            return None;
        }
        let (before, after) = match self {
            Self::Node { prev, curr, .. } => (prev.is_some(), curr.is_some()),
            Self::Edge { prev, curr, .. } => (prev.is_some(), curr.is_some()),
            Self::Atom { prev, curr, .. } => (prev.is_some(), curr.is_some()),
        };
        match (before, after) {
            (false, _) => Some(ChangeType::Insert),
            (true, true) => Some(ChangeType::Update),
            (true, false) => Some(ChangeType::Delete),
        }
    }

    /// Replaces the `curr` side with the one of `later`.
    fn absorb(&mut self, later: Self) {
        match (self, later) {
            (Self::Node { curr, .. }, Self::Node { curr: next, .. }) => *curr = next,
            (Self::Edge { curr, .. }, Self::Edge { curr: next, .. }) => *curr = next,
            (Self::Atom { curr, .. }, Self::Atom { curr: next, .. }) => *curr = next,
            (current, later) => {
                debug_assert!(false, "kind mismatch: {current:?} absorbing {later:?}");
            }
        }
    }
}

#[derive(Debug, Default)]
struct ChangeSet {
    order: Vec<(Kind, Id)>,
    events: HashMap<(Kind, Id), Event>,
}

impl ChangeSet {
    fn stage(&mut self, event: Event) {
        let key = (event.kind(), event.id());
        match self.events.entry(key) {
            Entry::Occupied(mut staged) => staged.get_mut().absorb(event),
            Entry::Vacant(slot) => {
                self.order.push(key);
                slot.insert(event);
            }
        }
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    fn take(&mut self) -> impl Iterator<Item = Event> {
        let mut events = std::mem::take(&mut self.events);
        std::mem::take(&mut self.order)
            .into_iter()
            .filter_map(move |key| events.remove(&key))
    }
}

/// Staged and committed events of a store.
#[derive(Debug, Default)]
pub struct ChangeLog {
    staged: ChangeSet,
    committed: VecDeque<Event>,
}

impl ChangeLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a transition in the pending commit.
    pub fn stage(&mut self, event: Event) {
        self.staged.stage(event);
    }

    /// Number of entities touched since the last commit.
    #[must_use]
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Number of committed events not yet drained.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.committed.len()
    }

    /// Moves staged events with a net effect to the committed log.
    ///
    /// Returns the number of events committed.
    pub fn commit(&mut self) -> usize {
        let before = self.committed.len();
        self.committed
            .extend(self.staged.take().filter(|event| !event.is_noop()));
        self.committed.len() - before
    }

    /// Returns all committed events in commit order and empties the log.
    pub fn drain(&mut self) -> Vec<Event> {
        self.committed.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Label;

    fn node_event(id: u128, prev: Option<u64>, curr: Option<u64>) -> Event {
        Event::Node {
            id: Id::from_u128(id),
            prev: prev.map(|l| Node::new(Label(l))),
            curr: curr.map(|l| Node::new(Label(l))),
        }
    }

    #[test]
    fn staged_events_are_invisible_until_commit() {
        let mut log = ChangeLog::new();
        log.stage(node_event(1, None, Some(1)));
        assert!(log.drain().is_empty());
        assert_eq!(log.commit(), 1);
        assert_eq!(log.drain(), vec![node_event(1, None, Some(1))]);
        assert!(log.drain().is_empty());
    }

    #[test]
    fn writes_coalesce_to_first_prev_and_last_curr() {
        let mut log = ChangeLog::new();
        log.stage(node_event(1, None, Some(1)));
        log.stage(node_event(1, Some(1), Some(2)));
        log.stage(node_event(1, Some(2), Some(3)));
        log.commit();
        assert_eq!(log.drain(), vec![node_event(1, None, Some(3))]);
    }

    #[test]
    fn net_noop_is_dropped() {
        let mut log = ChangeLog::new();
        log.stage(node_event(1, None, Some(1)));
        log.stage(node_event(1, Some(1), None));
        assert_eq!(log.commit(), 0);
        assert!(log.drain().is_empty());
    }

    #[test]
    fn order_follows_first_touch() {
        let mut log = ChangeLog::new();
        log.stage(node_event(2, None, Some(1)));
        log.stage(node_event(1, None, Some(1)));
        log.stage(node_event(2, Some(1), Some(5)));
        log.commit();
        let ids: Vec<Id> = log.drain().iter().map(Event::id).collect();
        assert_eq!(ids, vec![Id::from_u128(2), Id::from_u128(1)]);
    }

    #[test]
    fn same_id_different_kinds_stay_apart() {
        let mut log = ChangeLog::new();
        let id = Id::from_u128(1);
        log.stage(node_event(1, None, Some(1)));
        log.stage(Event::Edge {
            id,
            prev: None,
            curr: Some(Edge::new(id, Label(1), id)),
        });
        assert_eq!(log.staged_len(), 2);
        assert_eq!(log.commit(), 2);
    }

    #[test]
    fn commits_accumulate_until_drained() {
        let mut log = ChangeLog::new();
        log.stage(node_event(1, None, Some(1)));
        log.commit();
        log.stage(node_event(1, Some(1), Some(2)));
        log.commit();
        assert_eq!(log.pending_len(), 2);
        assert_eq!(
            log.drain(),
            vec![node_event(1, None, Some(1)), node_event(1, Some(1), Some(2))]
        );
    }

    #[test]
    fn change_types() {
        assert_eq!(
            node_event(1, None, Some(1)).change_type(),
            Some(ChangeType::Insert)
        );
        assert_eq!(
            node_event(1, Some(1), Some(2)).change_type(),
            Some(ChangeType::Update)
        );
        assert_eq!(
            node_event(1, Some(1), None).change_type(),
            Some(ChangeType::Delete)
        );
        assert_eq!(node_event(1, Some(1), Some(1)).change_type(), None);
    }
}
