//! Sticky and acyclic constraints.
//!
//! * A **sticky** label freezes entities of one kind: once an entity carrying
//!   the label is present, it can no longer be changed or removed.
//! * An **acyclic** label forbids any directed cycle made only of edges with
//!   that label. A self-loop counts as a cycle.
//!
//! Declarations are not retroactive and are not persisted; every open store
//! starts from the declarations in its [`Config`](crate::Config).
//!
//! Local writes are checked before they apply. Writes merged from peers are
//! ordered by [`Constraints::prevails`] instead, and cycles they close are
//! broken afterwards by [`Store::settle`](crate::Store::settle). Both rules
//! depend only on stamps and payloads, so replicas with the same declarations
//! resolve the same conflicts the same way.

use crate::clock::Stamp;
use crate::graph::{Edge, EdgeIndex, Record};
use crate::id::Id;
use crate::types::{Kind, Label};
use std::collections::BTreeSet;
use std::fmt;

/// A rejected write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The edge would close a cycle among edges with an acyclic label.
    Acyclic {
        /// Offending edge id.
        id: Id,
        /// The acyclic label.
        label: Label,
        /// Edge source.
        src: Id,
        /// Edge destination.
        dst: Id,
    },
    /// The entity carries a sticky label and is already present.
    Sticky {
        /// Entity kind.
        kind: Kind,
        /// Entity id.
        id: Id,
        /// The sticky label.
        label: Label,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acyclic { id, label, src, dst } => {
                write!(f, "edge {id} ({src} -> {dst}) would close a {label} cycle")
            }
            Self::Sticky { kind, id, label } => {
                write!(f, "{kind} {id} is sticky under {label}")
            }
        }
    }
}

impl std::error::Error for Violation {}

/// Declared constraints of a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Constraints {
    sticky_nodes: BTreeSet<Label>,
    sticky_edges: BTreeSet<Label>,
    sticky_atoms: BTreeSet<Label>,
    acyclic_edges: BTreeSet<Label>,
}

impl Constraints {
    /// Creates an empty declaration set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sticky label for `kind`, builder style.
    #[must_use]
    pub fn with_sticky(mut self, kind: Kind, label: Label) -> Self {
        self.declare_sticky(kind, label);
        self
    }

    /// Adds an acyclic edge label, builder style.
    #[must_use]
    pub fn with_acyclic(mut self, label: Label) -> Self {
        self.declare_acyclic(label);
        self
    }

    fn sticky_set(&self, kind: Kind) -> &BTreeSet<Label> {
        match kind {
            Kind::Node => &self.sticky_nodes,
            Kind::Edge => &self.sticky_edges,
            Kind::Atom => &self.sticky_atoms,
        }
    }

    /// Declares `label` sticky for `kind`. Returns false if it already was.
    pub fn declare_sticky(&mut self, kind: Kind, label: Label) -> bool {
        match kind {
            Kind::Node => self.sticky_nodes.insert(label),
            Kind::Edge => self.sticky_edges.insert(label),
            Kind::Atom => self.sticky_atoms.insert(label),
        }
    }

    /// Declares edge `label` acyclic. Returns false if it already was.
    pub fn declare_acyclic(&mut self, label: Label) -> bool {
        self.acyclic_edges.insert(label)
    }

    /// Returns true if `label` is sticky for `kind`.
    #[must_use]
    pub fn is_sticky(&self, kind: Kind, label: Label) -> bool {
        self.sticky_set(kind).contains(&label)
    }

    /// Returns true if edge `label` is acyclic.
    #[must_use]
    pub fn is_acyclic(&self, label: Label) -> bool {
        self.acyclic_edges.contains(&label)
    }

    /// Sticky labels declared for `kind`.
    pub fn sticky_labels(&self, kind: Kind) -> impl Iterator<Item = Label> + '_ {
        self.sticky_set(kind).iter().copied()
    }

    /// Declared acyclic edge labels.
    pub fn acyclic_labels(&self) -> impl Iterator<Item = Label> + '_ {
        self.acyclic_edges.iter().copied()
    }

    /// Returns true if `payload` is present and carries a sticky label.
    #[must_use]
    pub fn is_frozen<R: Record>(&self, payload: Option<&R>) -> bool {
        payload.is_some_and(|p| self.is_sticky(R::KIND, p.label()))
    }

    /// Decides whether a merged write replaces the stored state of an entity.
    ///
    /// Frozen states outrank every other state, and of two frozen states the
    /// one with the lower stamp wins, so the first creation of a sticky entity
    /// survives. Otherwise the higher stamp wins.
    #[must_use]
    pub fn prevails<R: Record>(
        &self,
        incoming: (Stamp, Option<&R>),
        current: (Stamp, Option<&R>),
    ) -> bool {
        match (self.is_frozen(incoming.1), self.is_frozen(current.1)) {
            (true, true) => incoming.0 < current.0,
            (true, false) => true,
            (false, true) => false,
            (false, false) => incoming.0 > current.0,
        }
    }

    /// Checks the sticky rule for a local write replacing `existing`.
    pub(crate) fn check_sticky<R: Record>(
        &self,
        id: Id,
        existing: Option<&R>,
    ) -> Result<(), Violation> {
        match existing {
            Some(current) if self.is_sticky(R::KIND, current.label()) => Err(Violation::Sticky {
                kind: R::KIND,
                id,
                label: current.label(),
            }),
            _ => Ok(()),
        }
    }

    /// Checks that storing `edge` under `id` keeps its label acyclic.
    pub(crate) fn check_acyclic(
        &self,
        index: &EdgeIndex,
        id: Id,
        edge: &Edge,
    ) -> Result<(), Violation> {
        if !self.is_acyclic(edge.label) {
            return Ok(());
        }
        if index.reaches(edge.dst, edge.src, edge.label, Some(id)) {
            return Err(Violation::Acyclic {
                id,
                label: edge.label,
                src: edge.src,
                dst: edge.dst,
            });
        }
        Ok(())
    }
}
