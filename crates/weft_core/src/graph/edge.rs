use super::{Graph, Record, Table};
use crate::change_log::Event;
use crate::constraints::{Constraints, Violation};
use crate::id::Id;
use crate::replication::Change;
use crate::types::{Kind, Label};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

/// A labelled, directed link from `src` to `dst`.
///
/// Endpoints are plain ids; they need not name existing nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Source id.
    pub src: Id,
    /// Edge label.
    pub label: Label,
    /// Destination id.
    pub dst: Id,
}

impl Edge {
    /// Creates an edge payload.
    #[must_use]
    pub const fn new(src: Id, label: Label, dst: Id) -> Self {
        Self { src, label, dst }
    }
}

type Key = (Id, Label, Id, Id);

/// Edges by source and by destination.
///
/// `by_src` holds `(src, label, dst, edge)` and `by_dst` holds
/// `(dst, label, src, edge)`.
#[derive(Debug, Default)]
pub struct EdgeIndex {
    by_src: BTreeSet<Key>,
    by_dst: BTreeSet<Key>,
}

fn around(anchor: Id) -> std::ops::RangeInclusive<Key> {
    (anchor, Label::MIN, Id::MIN, Id::MIN)..=(anchor, Label::MAX, Id::MAX, Id::MAX)
}

fn around_label(anchor: Id, label: Label) -> std::ops::RangeInclusive<Key> {
    (anchor, label, Id::MIN, Id::MIN)..=(anchor, label, Id::MAX, Id::MAX)
}

impl EdgeIndex {
    /// Outgoing edges of `src` as `(edge, label, dst)`.
    pub fn from_src(&self, src: Id) -> impl Iterator<Item = (Id, Label, Id)> + '_ {
        self.by_src
            .range(around(src))
            .map(|&(_, label, dst, edge)| (edge, label, dst))
    }

    /// Outgoing edges of `src` labelled `label` as `(edge, dst)`.
    pub fn from_src_label(&self, src: Id, label: Label) -> impl Iterator<Item = (Id, Id)> + '_ {
        self.by_src
            .range(around_label(src, label))
            .map(|&(_, _, dst, edge)| (edge, dst))
    }

    /// Incoming edges of `dst` as `(edge, src, label)`.
    pub fn into_dst(&self, dst: Id) -> impl Iterator<Item = (Id, Id, Label)> + '_ {
        self.by_dst
            .range(around(dst))
            .map(|&(_, label, src, edge)| (edge, src, label))
    }

    /// Incoming edges of `dst` labelled `label` as `(edge, src)`.
    pub fn into_dst_label(&self, dst: Id, label: Label) -> impl Iterator<Item = (Id, Id)> + '_ {
        self.by_dst
            .range(around_label(dst, label))
            .map(|&(_, _, src, edge)| (edge, src))
    }

    /// Returns true if `to` can be reached from `from` along `label` edges.
    ///
    /// The edge `ignoring` is treated as absent. A node reaches itself.
    #[must_use]
    pub fn reaches(&self, from: Id, to: Id, label: Label, ignoring: Option<Id>) -> bool {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            if current == to {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            for (edge, next) in self.from_src_label(current, label) {
                if Some(edge) != ignoring && !seen.contains(&next) {
                    queue.push_back(next);
                }
            }
        }
        false
    }

    /// Finds a directed cycle among edges labelled `label`.
    ///
    /// Returns the ids of the edges along the cycle in traversal order. The
    /// search visits nodes and edges in index order, so equal indexes yield
    /// the same cycle.
    #[must_use]
    pub fn find_cycle(&self, label: Label) -> Option<Vec<Id>> {
        let mut adjacency: BTreeMap<Id, Vec<(Id, Id)>> = BTreeMap::new();
        for &(src, edge_label, dst, edge) in &self.by_src {
            if edge_label == label {
                adjacency.entry(src).or_default().push((edge, dst));
            }
        }

        let mut done = HashSet::new();
        for &start in adjacency.keys() {
            if done.contains(&start) {
                continue;
            }
            // stack[i] is a node on the current path; taken[i] leads from it to stack[i + 1]
            let mut stack = vec![(start, 0usize)];
            let mut taken: Vec<Id> = Vec::new();
            let mut depth = HashMap::from([(start, 0usize)]);
            while let Some((node, next)) = stack.last_mut() {
                let node = *node;
                let out = adjacency.get(&node).map_or(&[][..], Vec::as_slice);
                match out.get(*next) {
                    Some(&(edge, dst)) => {
                        *next += 1;
                        if let Some(&at) = depth.get(&dst) {
                            let mut cycle = taken[at..].to_vec();
                            cycle.push(edge);
                            return Some(cycle);
                        }
                        if !done.contains(&dst) {
                            depth.insert(dst, stack.len());
                            stack.push((dst, 0));
                            taken.push(edge);
                        }
                    }
                    None => {
                        stack.pop();
                        taken.pop();
                        depth.remove(&node);
                        done.insert(node);
                    }
                }
            }
        }
        None
    }
}

impl Record for Edge {
    const KIND: Kind = Kind::Edge;
    type Index = EdgeIndex;

    fn label(&self) -> Label {
        self.label
    }

    fn source(&self) -> Option<Id> {
        Some(self.src)
    }

    fn index(&self, id: Id, index: &mut EdgeIndex) {
        index.by_src.insert((self.src, self.label, self.dst, id));
        index.by_dst.insert((self.dst, self.label, self.src, id));
    }

    fn unindex(&self, id: Id, index: &mut EdgeIndex) {
        index.by_src.remove(&(self.src, self.label, self.dst, id));
        index.by_dst.remove(&(self.dst, self.label, self.src, id));
    }

    fn table(graph: &Graph) -> &Table<Self> {
        &graph.edges
    }

    fn table_mut(graph: &mut Graph) -> &mut Table<Self> {
        &mut graph.edges
    }

    fn event(id: Id, prev: Option<Self>, curr: Option<Self>) -> Event {
        Event::Edge { id, prev, curr }
    }

    fn change(payload: Option<Self>) -> Change {
        Change::Edge(payload)
    }

    fn validate(&self, id: Id, graph: &Graph, constraints: &Constraints) -> Result<(), Violation> {
        constraints.check_acyclic(graph.edges.index(), id, self)
    }
}
