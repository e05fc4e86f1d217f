use super::{Graph, Record, Table};
use crate::change_log::Event;
use crate::id::Id;
use crate::replication::Change;
use crate::types::{Kind, Label};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A labelled vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    /// Node label.
    pub label: Label,
}

impl Node {
    /// Creates a node payload.
    #[must_use]
    pub const fn new(label: Label) -> Self {
        Self { label }
    }
}

/// Nodes grouped by label.
#[derive(Debug, Default)]
pub struct NodeIndex {
    by_label: BTreeSet<(Label, Id)>,
}

impl NodeIndex {
    /// Ids of present nodes carrying `label`, in id order.
    pub fn by_label(&self, label: Label) -> impl Iterator<Item = Id> + '_ {
        self.by_label
            .range((label, Id::MIN)..=(label, Id::MAX))
            .map(|&(_, id)| id)
    }
}

impl Record for Node {
    const KIND: Kind = Kind::Node;
    type Index = NodeIndex;

    fn label(&self) -> Label {
        self.label
    }

    fn source(&self) -> Option<Id> {
        None
    }

    fn index(&self, id: Id, index: &mut NodeIndex) {
        index.by_label.insert((self.label, id));
    }

    fn unindex(&self, id: Id, index: &mut NodeIndex) {
        index.by_label.remove(&(self.label, id));
    }

    fn table(graph: &Graph) -> &Table<Self> {
        &graph.nodes
    }

    fn table_mut(graph: &mut Graph) -> &mut Table<Self> {
        &mut graph.nodes
    }

    fn event(id: Id, prev: Option<Self>, curr: Option<Self>) -> Event {
        Event::Node { id, prev, curr }
    }

    fn change(payload: Option<Self>) -> Change {
        Change::Node(payload)
    }
}
