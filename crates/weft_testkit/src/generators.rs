//! Property-based test generators using proptest.
//!
//! Ids are drawn from a small pool so that generated operations collide on
//! the same entities often enough to exercise updates, removals and
//! conflicts.

use proptest::prelude::*;
use weft_core::{CoreResult, Id, Label, Store};

/// Strategy for arbitrary ids.
pub fn id_strategy() -> impl Strategy<Value = Id> + Clone {
    any::<u128>().prop_map(Id::from_u128)
}

const NODE_POOL: u64 = 0x5EED_0001;
const EDGE_POOL: u64 = 0x5EED_0002;
const ATOM_POOL: u64 = 0x5EED_0003;

/// Strategy for node ids drawn from a pool of `size` ids.
pub fn pooled_id_strategy(size: u8) -> impl Strategy<Value = Id> + Clone {
    (0..size.max(1)).prop_map(pooled_id)
}

/// The `n`th id of the node pool used by [`pooled_id_strategy`].
pub fn pooled_id(n: u8) -> Id {
    Id::from_words(NODE_POOL, u64::from(n))
}

fn pool_strategy(pool: u64, size: u8) -> impl Strategy<Value = Id> + Clone {
    (0..size.max(1)).prop_map(move |n| Id::from_words(pool, u64::from(n)))
}

/// Strategy for labels below `max`.
pub fn label_strategy(max: u64) -> impl Strategy<Value = Label> + Clone {
    (0..max.max(1)).prop_map(Label)
}

/// Strategy for atom values.
pub fn value_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    prop::collection::vec(any::<u8>(), 0..16)
}

/// One write against a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphOp {
    /// Set a node.
    SetNode {
        /// Node id
        id: Id,
        /// Node label
        label: Label,
    },
    /// Remove a node.
    RemoveNode {
        /// Node id
        id: Id,
    },
    /// Set an edge.
    SetEdge {
        /// Edge id
        id: Id,
        /// Source
        src: Id,
        /// Edge label
        label: Label,
        /// Destination
        dst: Id,
    },
    /// Remove an edge.
    RemoveEdge {
        /// Edge id
        id: Id,
    },
    /// Set an atom.
    SetAtom {
        /// Atom id
        id: Id,
        /// Owner
        src: Id,
        /// Atom label
        label: Label,
        /// Value
        value: Vec<u8>,
    },
    /// Remove an atom.
    RemoveAtom {
        /// Atom id
        id: Id,
    },
}

impl GraphOp {
    /// Applies the write to `store`.
    ///
    /// # Errors
    ///
    /// Propagates store errors, constraint violations included.
    pub fn apply(&self, store: &mut Store) -> CoreResult<()> {
        match self {
            GraphOp::SetNode { id, label } => store.set_node(*id, *label),
            GraphOp::RemoveNode { id } => store.remove_node(*id),
            GraphOp::SetEdge {
                id,
                src,
                label,
                dst,
            } => store.set_edge(*id, *src, *label, *dst),
            GraphOp::RemoveEdge { id } => store.remove_edge(*id),
            GraphOp::SetAtom {
                id,
                src,
                label,
                value,
            } => store.set_atom(*id, *src, *label, value.clone()),
            GraphOp::RemoveAtom { id } => store.remove_atom(*id),
        }
    }
}

/// Strategy for writes over a pool of `pool` ids per kind and `labels` labels.
///
/// Node, edge and atom ids come from disjoint pools; edge endpoints and atom
/// owners come from the node pool.
pub fn graph_op_strategy(pool: u8, labels: u64) -> impl Strategy<Value = GraphOp> + Clone {
    let node = pool_strategy(NODE_POOL, pool);
    let edge = pool_strategy(EDGE_POOL, pool);
    let atom = pool_strategy(ATOM_POOL, pool);
    let label = label_strategy(labels);
    prop_oneof![
        3 => (node.clone(), label.clone())
            .prop_map(|(id, label)| GraphOp::SetNode { id, label }),
        1 => node.clone().prop_map(|id| GraphOp::RemoveNode { id }),
        3 => (edge.clone(), node.clone(), label.clone(), node.clone())
            .prop_map(|(id, src, label, dst)| GraphOp::SetEdge { id, src, label, dst }),
        1 => edge.prop_map(|id| GraphOp::RemoveEdge { id }),
        3 => (atom.clone(), node, label, value_strategy())
            .prop_map(|(id, src, label, value)| GraphOp::SetAtom { id, src, label, value }),
        1 => atom.prop_map(|id| GraphOp::RemoveAtom { id }),
    ]
}

/// Strategy for a sequence of writes.
pub fn op_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<GraphOp>> {
    prop::collection::vec(graph_op_strategy(6, 3), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn pooled_ids_stay_in_pool(id in pooled_id_strategy(4)) {
            prop_assert!((0..4).map(pooled_id).any(|p| p == id));
        }

        #[test]
        fn cloned_strategies_share_their_range(
            (first, second) in {
                let label = label_strategy(3);
                (label.clone(), label)
            }
        ) {
            prop_assert!(first.0 < 3 && second.0 < 3);
        }

        #[test]
        fn unconstrained_ops_always_apply(ops in op_sequence_strategy(1, 30)) {
            let mut store = Store::open_in_memory().unwrap();
            for op in &ops {
                prop_assert!(op.apply(&mut store).is_ok());
            }
        }
    }

    #[test]
    fn kinds_use_disjoint_pools() {
        assert_ne!(pooled_id(0), Id::from_words(EDGE_POOL, 0));
        assert_ne!(pooled_id(0), Id::from_words(ATOM_POOL, 0));
    }
}
