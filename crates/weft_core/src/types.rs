//! Core type definitions for Weft.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-chosen tag on a node, edge or atom.
///
/// The store gives labels no meaning beyond equality, ordering, and the
/// constraints declared against them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(pub u64);

impl Label {
    /// The smallest label. Used as a lower bound in index ranges.
    pub const MIN: Self = Self(0);

    /// The largest label. Used as an upper bound in index ranges.
    pub const MAX: Self = Self(u64::MAX);

    /// Creates a label.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for Label {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "label:{}", self.0)
    }
}

/// Identifies the replica that produced a stamp.
///
/// Chosen at random when a store is created and persisted with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OriginId(pub u64);

impl OriginId {
    /// Creates an origin id.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Picks a random origin id.
    #[must_use]
    pub fn random() -> Self {
        Self(rand::random())
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "origin:{:016x}", self.0)
    }
}

/// Sequence number for ordering commits.
///
/// Incremented by every commit that changed something. Persisted with the
/// store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceNumber(pub u64);

impl SequenceNumber {
    /// Creates a new sequence number.
    #[must_use]
    pub const fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Returns the raw sequence value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the next sequence number.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seq:{}", self.0)
    }
}

/// The three entity kinds held by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Kind {
    /// A labelled vertex.
    Node,
    /// A labelled, directed link between two ids.
    Edge,
    /// A labelled byte value attached to an id.
    Atom,
}

impl Kind {
    /// All kinds, in index order.
    pub const ALL: [Self; 3] = [Self::Node, Self::Edge, Self::Atom];

    /// Lowercase name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Edge => "edge",
            Self::Atom => "atom",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_next() {
        assert_eq!(SequenceNumber::new(4).next(), SequenceNumber::new(5));
    }

    #[test]
    fn display_formats() {
        assert_eq!(Label::new(3).to_string(), "label:3");
        assert_eq!(OriginId::new(255).to_string(), "origin:00000000000000ff");
        assert_eq!(Kind::Edge.to_string(), "edge");
    }

    #[test]
    fn label_encodes_as_plain_integer() {
        let bytes = weft_codec::to_cbor(&Label::new(5)).unwrap();
        assert_eq!(bytes, weft_codec::to_cbor(&5u64).unwrap());
    }
}
