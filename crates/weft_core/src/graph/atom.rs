use super::{Graph, Record, Table};
use crate::change_log::Event;
use crate::id::Id;
use crate::replication::Change;
use crate::types::{Kind, Label};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A labelled byte value attached to `src`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Atom {
    /// Id the value is attached to.
    pub src: Id,
    /// Atom label.
    pub label: Label,
    /// Opaque value.
    #[serde(with = "weft_codec::byte_buf")]
    pub value: Vec<u8>,
}

impl Atom {
    /// Creates an atom payload.
    #[must_use]
    pub fn new(src: Id, label: Label, value: impl Into<Vec<u8>>) -> Self {
        Self {
            src,
            label,
            value: value.into(),
        }
    }
}

/// Atoms by source and by `(label, value)`.
///
/// Values sort bytewise, so every value sharing a prefix sits in one
/// contiguous run of `by_label_value`.
#[derive(Debug, Default)]
pub struct AtomIndex {
    by_src: BTreeSet<(Id, Label, Id)>,
    by_label_value: BTreeSet<(Label, Vec<u8>, Id, Id)>,
}

impl AtomIndex {
    /// Atoms attached to `src` as `(atom, label)`.
    pub fn from_src(&self, src: Id) -> impl Iterator<Item = (Id, Label)> + '_ {
        self.by_src
            .range((src, Label::MIN, Id::MIN)..=(src, Label::MAX, Id::MAX))
            .map(|&(_, label, atom)| (atom, label))
    }

    /// Atoms attached to `src` labelled `label`.
    pub fn from_src_label(&self, src: Id, label: Label) -> impl Iterator<Item = Id> + '_ {
        self.by_src
            .range((src, label, Id::MIN)..=(src, label, Id::MAX))
            .map(|&(_, _, atom)| atom)
    }

    /// Atoms labelled `label` whose value starts with `prefix`, as
    /// `(atom, src, value)` in value order.
    ///
    /// An empty prefix matches every atom with the label.
    pub fn by_label_prefix<'a>(
        &'a self,
        label: Label,
        prefix: &'a [u8],
    ) -> impl Iterator<Item = (Id, Id, &'a [u8])> + 'a {
        self.by_label_value
            .range((label, prefix.to_vec(), Id::MIN, Id::MIN)..)
            .take_while(move |(l, value, _, _)| *l == label && value.starts_with(prefix))
            .map(|(_, value, src, atom)| (*atom, *src, value.as_slice()))
    }
}

impl Record for Atom {
    const KIND: Kind = Kind::Atom;
    type Index = AtomIndex;

    fn label(&self) -> Label {
        self.label
    }

    fn source(&self) -> Option<Id> {
        Some(self.src)
    }

    fn index(&self, id: Id, index: &mut AtomIndex) {
        index.by_src.insert((self.src, self.label, id));
        index
            .by_label_value
            .insert((self.label, self.value.clone(), self.src, id));
    }

    fn unindex(&self, id: Id, index: &mut AtomIndex) {
        index.by_src.remove(&(self.src, self.label, id));
        index
            .by_label_value
            .remove(&(self.label, self.value.clone(), self.src, id));
    }

    fn table(graph: &Graph) -> &Table<Self> {
        &graph.atoms
    }

    fn table_mut(graph: &mut Graph) -> &mut Table<Self> {
        &mut graph.atoms
    }

    fn event(id: Id, prev: Option<Self>, curr: Option<Self>) -> Event {
        Event::Atom { id, prev, curr }
    }

    fn change(payload: Option<Self>) -> Change {
        Change::Atom(payload)
    }
}
