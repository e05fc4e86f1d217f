//! Whole-store snapshot encoding.
//!
//! A snapshot carries everything needed to resume a replica: its origin, the
//! clock high-water mark, the commit sequence, and every slot of the three
//! tables (tombstones included) together with their version vectors. Indexes
//! are rebuilt on load.
//!
//! Constraint declarations and undrained events are not part of a snapshot.

use crate::error::{CoreError, CoreResult};
use crate::graph::{Atom, Edge, Graph, Node, Table, TableImage};
use crate::types::{OriginId, SequenceNumber};
use serde::{Deserialize, Serialize};
use weft_codec::Envelope;

/// Envelope of snapshot blobs.
pub const SNAPSHOT_ENVELOPE: Envelope = Envelope::new(*b"WFSN", 1);

#[derive(Serialize)]
struct SnapshotRef<'a> {
    origin: OriginId,
    clock: u64,
    sequence: SequenceNumber,
    nodes: &'a Table<Node>,
    edges: &'a Table<Edge>,
    atoms: &'a Table<Atom>,
}

#[derive(Deserialize)]
struct SnapshotImage {
    origin: OriginId,
    clock: u64,
    sequence: SequenceNumber,
    nodes: TableImage<Node>,
    edges: TableImage<Edge>,
    atoms: TableImage<Atom>,
}

/// State recovered from a snapshot.
#[derive(Debug)]
pub(crate) struct Restored {
    pub origin: OriginId,
    pub clock: u64,
    pub sequence: SequenceNumber,
    pub graph: Graph,
}

pub(crate) fn encode(
    origin: OriginId,
    clock: u64,
    sequence: SequenceNumber,
    graph: &Graph,
) -> CoreResult<Vec<u8>> {
    let image = SnapshotRef {
        origin,
        clock,
        sequence,
        nodes: graph.nodes(),
        edges: graph.edges(),
        atoms: graph.atoms(),
    };
    Ok(SNAPSHOT_ENVELOPE.seal(&image)?)
}

pub(crate) fn decode(bytes: &[u8]) -> CoreResult<Restored> {
    let image: SnapshotImage = SNAPSHOT_ENVELOPE
        .open(bytes)
        .map_err(|e| CoreError::invalid_format(format!("snapshot: {e}")))?;
    let graph = Graph {
        nodes: Table::restore(image.nodes),
        edges: Table::restore(image.edges),
        atoms: Table::restore(image.atoms),
    };
    Ok(Restored {
        origin: image.origin,
        clock: image.clock,
        sequence: image.sequence,
        graph,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Stamp;
    use crate::id::Id;
    use crate::types::Label;

    #[test]
    fn restores_tables_and_header() {
        let origin = OriginId::new(3);
        let mut graph = Graph::default();
        let a = Id::from_u128(1);
        let b = Id::from_u128(2);
        graph
            .nodes
            .write(a, Stamp::new(1, origin), Some(Node::new(Label(1))));
        graph
            .edges
            .write(Id::from_u128(3), Stamp::new(2, origin), Some(Edge::new(a, Label(2), b)));
        graph
            .atoms
            .write(Id::from_u128(4), Stamp::new(3, origin), Some(Atom::new(a, Label(3), b"v".to_vec())));
        graph.atoms.write(Id::from_u128(5), Stamp::new(4, origin), None);

        let bytes = encode(origin, 4, SequenceNumber::new(2), &graph).unwrap();
        assert_eq!(&bytes[..4], b"WFSN");

        let restored = decode(&bytes).unwrap();
        assert_eq!(restored.origin, origin);
        assert_eq!(restored.clock, 4);
        assert_eq!(restored.sequence, SequenceNumber::new(2));
        assert_eq!(restored.graph.edges().index().from_src(a).count(), 1);
        assert_eq!(restored.graph.atoms().counts().tombstones, 1);
        assert_eq!(restored.graph.atoms().version().get(origin), 4);
    }

    #[test]
    fn garbage_is_invalid_format() {
        assert!(matches!(
            decode(b"not a snapshot"),
            Err(CoreError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn encoding_is_deterministic() {
        let origin = OriginId::new(3);
        let mut graph = Graph::default();
        for n in 0..16u128 {
            graph
                .nodes
                .write(Id::from_u128(n * 7919), Stamp::new(1, origin), Some(Node::new(Label(1))));
        }
        let first = encode(origin, 1, SequenceNumber::new(1), &graph).unwrap();
        let second = encode(origin, 1, SequenceNumber::new(1), &graph).unwrap();
        assert_eq!(first, second);
    }
}
