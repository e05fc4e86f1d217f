//! Replication data model.
//!
//! Replicas exchange [`Version`]s and [`Action`]s. A version says, per entity
//! kind, the highest clock seen from every origin. An action is the current
//! state of one entity together with the stamp of the write that produced it.
//!
//! Sending the actions a peer's version does not cover, and applying them in
//! stamp order on the peer, brings it up to date. Applying is idempotent and
//! commutative in the outcome, so any gossip pattern converges.

use crate::clock::{Stamp, VersionVector};
use crate::constraints::Violation;
use crate::graph::{Atom, Edge, Node};
use crate::id::Id;
use crate::types::Kind;
use serde::{Deserialize, Serialize};

/// New state of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Change {
    /// Node payload, `None` for removal.
    Node(Option<Node>),
    /// Edge payload, `None` for removal.
    Edge(Option<Edge>),
    /// Atom payload, `None` for removal.
    Atom(Option<Atom>),
}

impl Change {
    /// Kind of the entity.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Node(_) => Kind::Node,
            Self::Edge(_) => Kind::Edge,
            Self::Atom(_) => Kind::Atom,
        }
    }

    /// Returns true if the change removes the entity.
    #[must_use]
    pub const fn is_removal(&self) -> bool {
        match self {
            Self::Node(payload) => payload.is_none(),
            Self::Edge(payload) => payload.is_none(),
            Self::Atom(payload) => payload.is_none(),
        }
    }
}

/// A stamped entity state sent to a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Entity id.
    pub id: Id,
    /// Stamp of the write that produced `change`.
    pub stamp: Stamp,
    /// The entity state.
    pub change: Change,
}

impl Action {
    /// Kind of the entity.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        self.change.kind()
    }

    /// Key that orders a batch for application.
    #[must_use]
    pub fn order_key(&self) -> (Stamp, Kind, Id) {
        (self.stamp, self.kind(), self.id)
    }
}

/// Per-kind version vectors of a replica.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Node vector.
    pub nodes: VersionVector,
    /// Edge vector.
    pub edges: VersionVector,
    /// Atom vector.
    pub atoms: VersionVector,
}

impl Version {
    /// Vector of `kind`.
    #[must_use]
    pub fn get(&self, kind: Kind) -> &VersionVector {
        match kind {
            Kind::Node => &self.nodes,
            Kind::Edge => &self.edges,
            Kind::Atom => &self.atoms,
        }
    }

    /// Returns true if this version has seen `action`.
    #[must_use]
    pub fn covers(&self, action: &Action) -> bool {
        self.get(action.kind()).covers(action.stamp)
    }

    /// Takes the per-kind, per-origin maximum with `other`.
    pub fn merge(&mut self, other: &Self) {
        self.nodes.merge(&other.nodes);
        self.edges.merge(&other.edges);
        self.atoms.merge(&other.atoms);
    }
}

/// What applying one action did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The action won and is now the entity's state.
    Applied,
    /// The entity already holds a write with a greater or equal stamp.
    Superseded,
    /// The action was seen before.
    Duplicate,
    /// The action won but broke a constraint and was dropped.
    Rejected(Violation),
}

impl ApplyOutcome {
    /// Returns true for [`ApplyOutcome::Applied`].
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Label, OriginId};

    fn action(clock: u64, change: Change) -> Action {
        Action {
            id: Id::from_u128(1),
            stamp: Stamp::new(clock, OriginId::new(1)),
            change,
        }
    }

    #[test]
    fn change_kind_and_removal() {
        assert_eq!(Change::Edge(None).kind(), Kind::Edge);
        assert!(Change::Atom(None).is_removal());
        assert!(!Change::Node(Some(Node::new(Label(1)))).is_removal());
    }

    #[test]
    fn version_covers_by_kind() {
        let mut version = Version::default();
        version.nodes.observe(Stamp::new(5, OriginId::new(1)));
        assert!(version.covers(&action(5, Change::Node(None))));
        assert!(!version.covers(&action(6, Change::Node(None))));
        assert!(!version.covers(&action(1, Change::Edge(None))));
    }

    #[test]
    fn order_key_sorts_by_stamp_first() {
        let early = action(1, Change::Atom(None));
        let late = action(2, Change::Node(None));
        assert!(early.order_key() < late.order_key());
    }

    #[test]
    fn actions_encode_through_cbor() {
        let original = action(
            3,
            Change::Atom(Some(Atom::new(Id::from_u128(9), Label(2), b"value".to_vec()))),
        );
        let bytes = weft_codec::to_cbor(&original).unwrap();
        assert_eq!(weft_codec::from_cbor::<Action>(&bytes).unwrap(), original);
    }
}
