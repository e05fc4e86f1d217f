//! Entity tables and their secondary indexes.
//!
//! A table is an arena of slots keyed by [`Id`]. A slot keeps the stamp of the
//! last write and the payload, or `None` once the entity was removed. Removed
//! slots stay behind as tombstones so later, older writes still lose to them.
//!
//! Every table maintains its own indexes. They hold exactly the present
//! entities: a write unindexes the old payload and indexes the new one.

mod atom;
mod edge;
mod node;

pub use atom::{Atom, AtomIndex};
pub use edge::{Edge, EdgeIndex};
pub use node::{Node, NodeIndex};

use crate::change_log::Event;
use crate::clock::{Stamp, VersionVector};
use crate::constraints::{Constraints, Violation};
use crate::id::Id;
use crate::replication::Change;
use crate::types::{Kind, Label};
use serde::de::DeserializeOwned;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Payload of one entity kind.
pub trait Record:
    Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Kind this payload belongs to.
    const KIND: Kind;

    /// Secondary indexes kept for this kind.
    type Index: Default + fmt::Debug;

    /// Label of the payload.
    fn label(&self) -> Label;

    /// Source id for edges and atoms.
    fn source(&self) -> Option<Id>;

    /// Adds the payload stored under `id` to `index`.
    fn index(&self, id: Id, index: &mut Self::Index);

    /// Removes the payload stored under `id` from `index`.
    fn unindex(&self, id: Id, index: &mut Self::Index);

    /// Selects this kind's table.
    fn table(graph: &Graph) -> &Table<Self>;

    /// Selects this kind's table mutably.
    fn table_mut(graph: &mut Graph) -> &mut Table<Self>;

    /// Wraps a transition as a change event.
    fn event(id: Id, prev: Option<Self>, curr: Option<Self>) -> Event;

    /// Wraps a payload as a replicated change.
    fn change(payload: Option<Self>) -> Change;

    /// Kind-specific constraint checks for storing `self` under `id`.
    ///
    /// Sticky checks are shared by every kind and run separately.
    fn validate(&self, _id: Id, _graph: &Graph, _constraints: &Constraints) -> Result<(), Violation> {
        Ok(())
    }
}

/// Stored state of one id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot<R> {
    /// Stamp of the write that produced this state.
    pub stamp: Stamp,
    /// Current payload, `None` when removed.
    pub payload: Option<R>,
}

/// Live and tombstone counts of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TableCounts {
    /// Entities currently present.
    pub live: usize,
    /// Removed entities still held for ordering.
    pub tombstones: usize,
}

/// Arena of one entity kind.
#[derive(Debug)]
pub struct Table<R: Record> {
    slots: BTreeMap<Id, Slot<R>>,
    index: R::Index,
    version: VersionVector,
}

impl<R: Record> Default for Table<R> {
    fn default() -> Self {
        Self {
            slots: BTreeMap::new(),
            index: R::Index::default(),
            version: VersionVector::new(),
        }
    }
}

impl<R: Record> Table<R> {
    /// Returns the payload of `id` if present.
    #[must_use]
    pub fn get(&self, id: Id) -> Option<&R> {
        self.slots.get(&id).and_then(|slot| slot.payload.as_ref())
    }

    /// Returns the slot of `id`, including tombstones.
    #[must_use]
    pub fn slot(&self, id: Id) -> Option<&Slot<R>> {
        self.slots.get(&id)
    }

    /// Stamp of the last write to `id`.
    #[must_use]
    pub fn stamp(&self, id: Id) -> Option<Stamp> {
        self.slots.get(&id).map(|slot| slot.stamp)
    }

    /// Secondary indexes.
    #[must_use]
    pub fn index(&self) -> &R::Index {
        &self.index
    }

    /// Highest clock per origin this table has absorbed.
    #[must_use]
    pub fn version(&self) -> &VersionVector {
        &self.version
    }

    pub(crate) fn version_mut(&mut self) -> &mut VersionVector {
        &mut self.version
    }

    /// Iterates all slots in id order.
    pub fn slots(&self) -> impl Iterator<Item = (Id, &Slot<R>)> {
        self.slots.iter().map(|(&id, slot)| (id, slot))
    }

    /// Slots whose stamps `peer` has not seen.
    pub fn unseen_by<'a>(
        &'a self,
        peer: &'a VersionVector,
    ) -> impl Iterator<Item = (Id, &'a Slot<R>)> + 'a {
        self.slots().filter(move |(_, slot)| !peer.covers(slot.stamp))
    }

    /// Counts live entities and tombstones.
    #[must_use]
    pub fn counts(&self) -> TableCounts {
        let live = self.slots.values().filter(|s| s.payload.is_some()).count();
        TableCounts {
            live,
            tombstones: self.slots.len() - live,
        }
    }

    /// Stores `payload` under `id` with `stamp` and returns the previous payload.
    pub(crate) fn write(&mut self, id: Id, stamp: Stamp, payload: Option<R>) -> Option<R> {
        self.version.observe(stamp);
        let slot = self.slots.entry(id).or_insert(Slot {
            stamp,
            payload: None,
        });
        slot.stamp = stamp;
        let prev = std::mem::replace(&mut slot.payload, payload);
        if let Some(old) = &prev {
            old.unindex(id, &mut self.index);
        }
        if let Some(new) = &slot.payload {
            new.index(id, &mut self.index);
        }
        prev
    }

    pub(crate) fn restore(image: TableImage<R>) -> Self {
        let mut table = Self {
            version: image.version,
            ..Self::default()
        };
        for (id, slot) in image.slots {
            table.write(id, slot.stamp, slot.payload);
        }
        table
    }
}

impl<R: Record> Serialize for Table<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Table", 2)?;
        state.serialize_field("slots", &SlotList(&self.slots))?;
        state.serialize_field("version", &self.version)?;
        state.end()
    }
}

struct SlotList<'a, R>(&'a BTreeMap<Id, Slot<R>>);

impl<R: Serialize> Serialize for SlotList<'_, R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

/// Decoded form of a serialized [`Table`].
#[derive(Debug, Deserialize)]
pub(crate) struct TableImage<R> {
    slots: Vec<(Id, Slot<R>)>,
    version: VersionVector,
}

/// The three tables of a store.
#[derive(Debug, Default)]
pub struct Graph {
    pub(crate) nodes: Table<Node>,
    pub(crate) edges: Table<Edge>,
    pub(crate) atoms: Table<Atom>,
}

impl Graph {
    /// Node table.
    #[must_use]
    pub fn nodes(&self) -> &Table<Node> {
        &self.nodes
    }

    /// Edge table.
    #[must_use]
    pub fn edges(&self) -> &Table<Edge> {
        &self.edges
    }

    /// Atom table.
    #[must_use]
    pub fn atoms(&self) -> &Table<Atom> {
        &self.atoms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OriginId;

    fn stamp(clock: u64) -> Stamp {
        Stamp::new(clock, OriginId::new(1))
    }

    #[test]
    fn write_replaces_and_returns_previous() {
        let mut table = Table::<Node>::default();
        let id = Id::from_u128(1);
        assert_eq!(table.write(id, stamp(1), Some(Node::new(Label(1)))), None);
        assert_eq!(
            table.write(id, stamp(2), Some(Node::new(Label(2)))),
            Some(Node::new(Label(1)))
        );
        assert_eq!(table.get(id), Some(&Node::new(Label(2))));
        assert_eq!(table.stamp(id), Some(stamp(2)));
    }

    #[test]
    fn removal_leaves_tombstone() {
        let mut table = Table::<Node>::default();
        let id = Id::from_u128(1);
        table.write(id, stamp(1), Some(Node::new(Label(1))));
        table.write(id, stamp(2), None);
        assert_eq!(table.get(id), None);
        assert_eq!(table.slot(id).map(|s| s.stamp), Some(stamp(2)));
        assert_eq!(
            table.counts(),
            TableCounts {
                live: 0,
                tombstones: 1
            }
        );
        assert_eq!(table.index().by_label(Label(1)).count(), 0);
    }

    #[test]
    fn writes_advance_version() {
        let mut table = Table::<Node>::default();
        table.write(Id::from_u128(1), stamp(4), None);
        assert_eq!(table.version().get(OriginId::new(1)), 4);
    }

    #[test]
    fn unseen_by_filters_covered_stamps() {
        let mut table = Table::<Node>::default();
        table.write(Id::from_u128(1), stamp(1), Some(Node::new(Label(1))));
        table.write(Id::from_u128(2), stamp(2), Some(Node::new(Label(1))));
        let peer: VersionVector = [(OriginId::new(1), 1)].into_iter().collect();
        let unseen: Vec<Id> = table.unseen_by(&peer).map(|(id, _)| id).collect();
        assert_eq!(unseen, vec![Id::from_u128(2)]);
    }

    #[test]
    fn serialized_table_restores_with_indexes() {
        let mut table = Table::<Node>::default();
        table.write(Id::from_u128(1), stamp(1), Some(Node::new(Label(7))));
        table.write(Id::from_u128(2), stamp(2), None);
        let bytes = weft_codec::to_cbor(&table).unwrap();
        let image: TableImage<Node> = weft_codec::from_cbor(&bytes).unwrap();
        let restored = Table::restore(image);
        assert_eq!(restored.counts(), table.counts());
        assert_eq!(restored.version(), table.version());
        assert_eq!(
            restored.index().by_label(Label(7)).collect::<Vec<_>>(),
            vec![Id::from_u128(1)]
        );
    }
}
