//! Value types for FFI.

use crate::buffer::WeftArray;
use weft_core::{Atom, Edge, Id, Kind, Label, Node};

/// An id as two 64-bit words.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WeftId {
    /// High word.
    pub high: u64,
    /// Low word.
    pub low: u64,
}

impl From<Id> for WeftId {
    fn from(id: Id) -> Self {
        let (high, low) = id.to_words();
        Self { high, low }
    }
}

impl From<WeftId> for Id {
    fn from(id: WeftId) -> Self {
        Id::from_words(id.high, id.low)
    }
}

/// A present or absent value.
#[repr(C, u8)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeftOption<T> {
    /// Absent.
    None,
    /// Present; the payload is only valid in this variant.
    Some(T),
}

impl<T> WeftOption<T> {
    /// Returns true if present.
    pub fn is_some(&self) -> bool {
        matches!(self, Self::Some(_))
    }

    /// Converts into a Rust option.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::None => None,
            Self::Some(value) => Some(value),
        }
    }
}

impl<T> From<Option<T>> for WeftOption<T> {
    fn from(option: Option<T>) -> Self {
        option.map_or(Self::None, Self::Some)
    }
}

/// Placeholder success value for calls with nothing to return.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeftUnit {
    /// Always zero.
    pub reserved: u8,
}

/// Entity kind.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeftKind {
    /// Node.
    Node = 0,
    /// Edge.
    Edge = 1,
    /// Atom.
    Atom = 2,
}

impl From<WeftKind> for Kind {
    fn from(kind: WeftKind) -> Self {
        match kind {
            WeftKind::Node => Kind::Node,
            WeftKind::Edge => Kind::Edge,
            WeftKind::Atom => Kind::Atom,
        }
    }
}

/// Node payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeftNode {
    /// Label.
    pub label: u64,
}

impl From<Node> for WeftNode {
    fn from(node: Node) -> Self {
        Self {
            label: node.label.as_u64(),
        }
    }
}

/// Edge payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeftEdge {
    /// Source.
    pub src: WeftId,
    /// Label.
    pub label: u64,
    /// Destination.
    pub dst: WeftId,
}

impl From<Edge> for WeftEdge {
    fn from(edge: Edge) -> Self {
        Self {
            src: edge.src.into(),
            label: edge.label.as_u64(),
            dst: edge.dst.into(),
        }
    }
}

/// Atom payload. The value is owned by the caller once returned.
#[repr(C)]
#[derive(Debug)]
pub struct WeftAtom {
    /// Owner.
    pub src: WeftId,
    /// Label.
    pub label: u64,
    /// Value bytes.
    pub value: WeftArray<u8>,
}

impl WeftAtom {
    pub(crate) fn new(src: Id, label: Label, value: Vec<u8>) -> Self {
        Self {
            src: src.into(),
            label: label.as_u64(),
            value: WeftArray::from_vec(value),
        }
    }

    /// Frees the value.
    pub(crate) unsafe fn release(self) {
        drop(self.value.into_vec());
    }
}

impl From<Atom> for WeftAtom {
    fn from(atom: Atom) -> Self {
        Self::new(atom.src, atom.label, atom.value)
    }
}

/// An edge with its id, as returned by edge queries.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeftEdgeEntry {
    /// Edge id.
    pub id: WeftId,
    /// Payload.
    pub edge: WeftEdge,
}

/// An atom with its id, as returned by atom queries.
#[repr(C)]
#[derive(Debug)]
pub struct WeftAtomEntry {
    /// Atom id.
    pub id: WeftId,
    /// Payload.
    pub atom: WeftAtom,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_words() {
        let id = Id::from_words(7, 9);
        let ffi = WeftId::from(id);
        assert_eq!((ffi.high, ffi.low), (7, 9));
        assert_eq!(Id::from(ffi), id);
    }

    #[test]
    fn option_conversions() {
        assert_eq!(WeftOption::from(Some(3)), WeftOption::Some(3));
        assert!(!WeftOption::<u8>::from(None).is_some());
        assert_eq!(WeftOption::Some(4).into_option(), Some(4));
    }

    #[test]
    fn atom_value_is_released() {
        let atom = WeftAtom::from(Atom::new(Id::from_u128(1), Label(2), b"v".to_vec()));
        assert_eq!(atom.label, 2);
        assert_eq!(unsafe { atom.value.as_slice() }, b"v");
        unsafe { atom.release() };
    }
}
