//! End-to-end tests for the store: persistence, constraints and index upkeep.

use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use tempfile::tempdir;
use weft_core::{
    Config, Constraints, CoreError, Event, Id, Kind, Label, Node, StoreDir, Store, Violation,
};

const PERSON: Label = Label(7);
const LINK: Label = Label(3);

#[test]
fn relabel_scenario_emits_one_update() {
    let mut store = Store::open_in_memory().unwrap();
    let x = Id::mint();
    store.set_node(x, PERSON).unwrap();
    store.commit().unwrap();
    assert_eq!(store.node(x).unwrap(), Some(Node::new(PERSON)));
    store.barrier().unwrap();

    store.set_node(x, Label(9)).unwrap();
    store.commit().unwrap();
    assert_eq!(
        store.barrier().unwrap(),
        vec![Event::Node {
            id: x,
            prev: Some(Node::new(PERSON)),
            curr: Some(Node::new(Label(9))),
        }]
    );
}

#[test]
fn acyclic_scenario_keeps_first_edge() {
    let mut store = Store::open_in_memory().unwrap();
    store.declare_acyclic(LINK).unwrap();
    let (a, b) = (Id::mint(), Id::mint());
    let (e1, e2) = (Id::mint(), Id::mint());
    store.set_edge(e1, a, LINK, b).unwrap();
    let err = store.set_edge(e2, b, LINK, a).unwrap_err();
    assert_eq!(
        err.violation(),
        Some(&Violation::Acyclic {
            id: e2,
            label: LINK,
            src: b,
            dst: a,
        })
    );
    store.commit().unwrap();
    assert_eq!(store.edges_by_src(a).unwrap(), vec![(e1, LINK, b)]);
    assert!(store.edge(e2).unwrap().is_none());
}

#[test]
fn multi_commit_events_drain_in_order() {
    let mut store = Store::open_in_memory().unwrap();
    let ids: Vec<Id> = (0..3).map(|_| Id::mint()).collect();
    for id in &ids {
        store.set_node(*id, PERSON).unwrap();
        store.commit().unwrap();
    }
    let drained: Vec<Id> = store.barrier().unwrap().iter().map(Event::id).collect();
    assert_eq!(drained, ids);
    assert!(store.barrier().unwrap().is_empty());
}

#[test]
fn reopen_from_directory() {
    let dir = tempdir().unwrap();
    let (a, b, edge) = (Id::mint(), Id::mint(), Id::mint());
    let origin = {
        let mut store = Store::open(dir.path()).unwrap();
        store.set_node(a, PERSON).unwrap();
        store.set_edge(edge, a, LINK, b).unwrap();
        store.close().unwrap();
        store.origin()
    };

    let store = Store::open(dir.path()).unwrap();
    assert_eq!(store.origin(), origin);
    assert_eq!(store.node(a).unwrap(), Some(Node::new(PERSON)));
    assert_eq!(store.edges_by_dst(b).unwrap(), vec![(edge, a, LINK)]);
    assert_eq!(store.sequence().as_u64(), 1);
}

#[test]
fn directory_is_locked_while_open() {
    let dir = tempdir().unwrap();
    let mut store = Store::open(dir.path()).unwrap();
    assert!(matches!(Store::open(dir.path()), Err(CoreError::StoreLocked)));
    store.close().unwrap();
    assert!(Store::open(dir.path()).is_ok());
}

#[test]
fn missing_directory_without_create() {
    let dir = tempdir().unwrap();
    let result = Store::open_with_config(
        dir.path().join("absent"),
        Config::new().create_if_missing(false),
    );
    assert!(matches!(result, Err(CoreError::InvalidOperation { .. })));
}

#[test]
fn torn_tail_on_disk_is_dropped() {
    let dir = tempdir().unwrap();
    let id = Id::mint();
    {
        let mut store = Store::open(dir.path()).unwrap();
        store.set_node(id, PERSON).unwrap();
        store.close().unwrap();
    }
    let journal = StoreDir::journal_path_in(dir.path());
    let clean_len = fs::metadata(&journal).unwrap().len();
    let mut bytes = fs::read(&journal).unwrap();
    bytes.extend_from_slice(b"WFJR\x40");
    fs::write(&journal, &bytes).unwrap();

    let store = Store::open(dir.path()).unwrap();
    assert_eq!(store.node(id).unwrap(), Some(Node::new(PERSON)));
    assert_eq!(fs::metadata(&journal).unwrap().len(), clean_len);
}

#[test]
fn corrupted_frame_on_disk_fails_open() {
    let dir = tempdir().unwrap();
    {
        let mut store = Store::open(dir.path()).unwrap();
        store.set_node(Id::mint(), PERSON).unwrap();
        store.close().unwrap();
    }
    let journal = StoreDir::journal_path_in(dir.path());
    let mut bytes = fs::read(&journal).unwrap();
    let middle = bytes.len() / 2;
    bytes[middle] ^= 0xFF;
    fs::write(&journal, &bytes).unwrap();

    assert!(matches!(
        Store::open(dir.path()),
        Err(CoreError::ChecksumMismatch { .. })
    ));
}

#[test]
fn configured_constraints_apply_from_open() {
    let constraints = Constraints::new()
        .with_sticky(Kind::Atom, Label(1))
        .with_acyclic(LINK);
    let dir = tempdir().unwrap();
    let mut store =
        Store::open_with_config(dir.path(), Config::new().constraints(constraints)).unwrap();
    let (owner, atom) = (Id::mint(), Id::mint());
    store.set_atom(atom, owner, Label(1), b"fixed".to_vec()).unwrap();
    assert!(store.remove_atom(atom).is_err());
    assert!(store.set_edge(Id::mint(), owner, LINK, owner).is_err());
}

#[test]
fn uncommitted_writes_are_lost_on_drop() {
    let dir = tempdir().unwrap();
    let (kept, lost) = (Id::mint(), Id::mint());
    {
        let mut store = Store::open(dir.path()).unwrap();
        store.set_node(kept, PERSON).unwrap();
        store.commit().unwrap();
        store.set_node(lost, PERSON).unwrap();
    }
    let store = Store::open(dir.path()).unwrap();
    assert!(store.node(kept).unwrap().is_some());
    assert!(store.node(lost).unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn id(n: u8) -> Id {
    Id::from_u128(u128::from(n) + 1)
}

#[derive(Debug, Clone)]
enum EdgeOp {
    Set { edge: u8, src: u8, dst: u8 },
    Remove { edge: u8 },
}

fn edge_op() -> impl Strategy<Value = EdgeOp> {
    prop_oneof![
        4 => (0..10u8, 0..6u8, 0..6u8).prop_map(|(edge, src, dst)| EdgeOp::Set { edge, src, dst }),
        1 => (0..10u8).prop_map(|edge| EdgeOp::Remove { edge }),
    ]
}

fn has_cycle(store: &Store, label: Label) -> bool {
    let mut out: BTreeMap<Id, Vec<Id>> = BTreeMap::new();
    let mut indegree: BTreeMap<Id, usize> = BTreeMap::new();
    for (_, slot) in store.graph().edges().slots() {
        if let Some(edge) = slot.payload.as_ref().filter(|e| e.label == label) {
            out.entry(edge.src).or_default().push(edge.dst);
            indegree.entry(edge.src).or_default();
            *indegree.entry(edge.dst).or_default() += 1;
        }
    }
    let mut ready: Vec<Id> = indegree
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(&id, _)| id)
        .collect();
    let mut visited = 0;
    while let Some(node) = ready.pop() {
        visited += 1;
        for next in out.get(&node).into_iter().flatten() {
            let d = indegree.entry(*next).or_default();
            *d -= 1;
            if *d == 0 {
                ready.push(*next);
            }
        }
    }
    visited < indegree.len()
}

#[derive(Debug, Clone)]
enum EntityOp {
    SetNode { id: u8, label: u8 },
    RemoveNode { id: u8 },
    SetAtom { id: u8, src: u8, label: u8, value: Vec<u8> },
    RemoveAtom { id: u8 },
}

fn entity_op() -> impl Strategy<Value = EntityOp> {
    prop_oneof![
        (0..6u8, 0..3u8).prop_map(|(id, label)| EntityOp::SetNode { id, label }),
        (0..6u8).prop_map(|id| EntityOp::RemoveNode { id }),
        (0..6u8, 0..4u8, 0..2u8, prop::collection::vec(0..3u8, 0..3)).prop_map(
            |(id, src, label, value)| EntityOp::SetAtom {
                id,
                src,
                label,
                value
            }
        ),
        (0..6u8).prop_map(|id| EntityOp::RemoveAtom { id }),
    ]
}

fn apply_entity_op(store: &mut Store, op: &EntityOp) {
    match op {
        EntityOp::SetNode { id: n, label } => store.set_node(id(*n), Label(u64::from(*label))),
        EntityOp::RemoveNode { id: n } => store.remove_node(id(*n)),
        EntityOp::SetAtom {
            id: n,
            src,
            label,
            value,
        } => store.set_atom(
            id(*n + 100),
            id(*src),
            Label(u64::from(*label)),
            value.clone(),
        ),
        EntityOp::RemoveAtom { id: n } => store.remove_atom(id(*n + 100)),
    }
    .unwrap();
}

fn assert_indexes_match_tables(store: &Store) {
    for label in (0..3).map(Label) {
        let expected: BTreeSet<Id> = store
            .graph()
            .nodes()
            .slots()
            .filter(|(_, slot)| slot.payload.as_ref().map(|n| n.label) == Some(label))
            .map(|(id, _)| id)
            .collect();
        let indexed: BTreeSet<Id> = store.nodes_by_label(label).unwrap().into_iter().collect();
        assert_eq!(indexed, expected);

        let expected: BTreeSet<(Id, Id, Vec<u8>)> = store
            .graph()
            .atoms()
            .slots()
            .filter_map(|(id, slot)| {
                slot.payload
                    .as_ref()
                    .filter(|a| a.label == label)
                    .map(|a| (id, a.src, a.value.clone()))
            })
            .collect();
        let indexed: BTreeSet<(Id, Id, Vec<u8>)> =
            store.atoms_by_label(label).unwrap().into_iter().collect();
        assert_eq!(indexed, expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn acyclic_label_never_forms_a_cycle(ops in prop::collection::vec(edge_op(), 1..40)) {
        let mut store = Store::open_in_memory().unwrap();
        store.declare_acyclic(LINK).unwrap();
        for op in &ops {
            let edge = match *op {
                EdgeOp::Set { edge, .. } | EdgeOp::Remove { edge } => id(edge + 50),
            };
            let before = store.graph().edges().get(edge).cloned();
            let result = match *op {
                EdgeOp::Set { src, dst, .. } => store.set_edge(edge, id(src), LINK, id(dst)),
                EdgeOp::Remove { .. } => store.remove_edge(edge),
            };
            if let Err(err) = result {
                let closes_cycle = matches!(err.violation(), Some(Violation::Acyclic { .. }));
                prop_assert!(closes_cycle);
                prop_assert_eq!(store.graph().edges().get(edge).cloned(), before);
            }
            prop_assert!(!has_cycle(&store, LINK));
        }
    }

    #[test]
    fn indexes_track_tables(ops in prop::collection::vec(entity_op(), 1..60)) {
        let mut store = Store::open_in_memory().unwrap();
        for op in &ops {
            apply_entity_op(&mut store, op);
        }
        assert_indexes_match_tables(&store);
        store.commit().unwrap();

        let loaded = Store::from_snapshot(&store.snapshot().unwrap()).unwrap();
        assert_indexes_match_tables(&loaded);
        prop_assert_eq!(loaded.graph_stats().unwrap().nodes, store.graph_stats().unwrap().nodes);
        prop_assert_eq!(loaded.graph_stats().unwrap().atoms, store.graph_stats().unwrap().atoms);
    }
}
