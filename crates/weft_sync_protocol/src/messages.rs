//! Messages exchanged between replicas.
//!
//! A sync round needs two blobs:
//!
//! - a **version** blob: the receiver's per-kind version vectors
//! - an **actions** blob: the sender's entity states the receiver has not seen
//!
//! Each action travels as its own CBOR byte string inside the batch, so one
//! damaged action does not poison the rest.

use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use weft_codec::{from_cbor, to_cbor, Envelope};
use weft_core::{Action, Version};

/// Envelope of version blobs.
pub const VERSION_ENVELOPE: Envelope = Envelope::new(*b"WFVV", 1);

/// Envelope of actions blobs.
pub const ACTIONS_ENVELOPE: Envelope = Envelope::new(*b"WFAC", 1);

/// A replica's version vectors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionMessage {
    /// Per-kind vectors.
    pub version: Version,
}

impl VersionMessage {
    /// Wraps a version.
    #[must_use]
    pub fn new(version: Version) -> Self {
        Self { version }
    }

    /// Encodes to a version blob.
    ///
    /// # Errors
    ///
    /// Fails if serialization fails.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        Ok(VERSION_ENVELOPE.seal(&self.version)?)
    }

    /// Decodes a version blob.
    ///
    /// # Errors
    ///
    /// Fails on a foreign or newer envelope, or a malformed body.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        Ok(Self {
            version: VERSION_ENVELOPE.open(bytes)?,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct RawAction(#[serde(with = "weft_codec::byte_buf")] Vec<u8>);

/// A batch of actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionsMessage {
    /// Actions in the order they were produced.
    pub actions: Vec<Action>,
}

impl ActionsMessage {
    /// Wraps a batch.
    #[must_use]
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    /// Number of actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns true if the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Encodes to an actions blob.
    ///
    /// # Errors
    ///
    /// Fails if serialization fails.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        let raw = self
            .actions
            .iter()
            .map(|action| to_cbor(action).map(RawAction))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ACTIONS_ENVELOPE.seal(&raw)?)
    }

    /// Decodes an actions blob, failing on the first malformed action.
    ///
    /// # Errors
    ///
    /// Fails on a foreign or newer envelope, a malformed batch, or a
    /// malformed action.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        let decoded = Self::decode_lenient(bytes)?;
        match decoded.malformed.into_iter().next() {
            Some(bad) => Err(bad.into()),
            None => Ok(Self::new(decoded.actions)),
        }
    }

    /// Decodes an actions blob, setting malformed actions aside.
    ///
    /// # Errors
    ///
    /// Fails only if the envelope or the batch framing is unreadable.
    pub fn decode_lenient(bytes: &[u8]) -> ProtocolResult<DecodedActions> {
        let raw: Vec<RawAction> = ACTIONS_ENVELOPE.open(bytes)?;
        let mut decoded = DecodedActions::default();
        for (index, RawAction(body)) in raw.into_iter().enumerate() {
            match from_cbor::<Action>(&body) {
                Ok(action) => decoded.actions.push(action),
                Err(e) => decoded.malformed.push(MalformedAction {
                    index,
                    message: e.to_string(),
                }),
            }
        }
        Ok(decoded)
    }
}

/// Result of a lenient decode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedActions {
    /// Actions that decoded, in batch order.
    pub actions: Vec<Action>,
    /// Actions that did not.
    pub malformed: Vec<MalformedAction>,
}

/// An action that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedAction {
    /// Position in the batch.
    pub index: usize,
    /// Decoder message.
    pub message: String,
}

impl From<MalformedAction> for ProtocolError {
    fn from(bad: MalformedAction) -> Self {
        Self::MalformedAction {
            index: bad.index,
            message: bad.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use weft_codec::CodecError;
    use weft_core::{Atom, Change, Id, Label, Node, OriginId, Stamp};

    fn node_action(clock: u64) -> Action {
        Action {
            id: Id::from_u128(u128::from(clock)),
            stamp: Stamp::new(clock, OriginId::new(1)),
            change: Change::Node(Some(Node::new(Label(1)))),
        }
    }

    #[test]
    fn version_blob_layout() {
        let mut version = Version::default();
        version.edges.observe(Stamp::new(9, OriginId::new(2)));
        let bytes = VersionMessage::new(version.clone()).encode().unwrap();
        assert_eq!(&bytes[..4], b"WFVV");
        assert_eq!(VersionMessage::decode(&bytes).unwrap().version, version);
    }

    #[test]
    fn actions_decode_in_order() {
        let tombstone = Action {
            id: Id::from_u128(7),
            stamp: Stamp::new(3, OriginId::new(2)),
            change: Change::Atom(None),
        };
        let atom = Action {
            id: Id::from_u128(8),
            stamp: Stamp::new(4, OriginId::new(2)),
            change: Change::Atom(Some(Atom::new(Id::from_u128(1), Label(5), vec![0, 255]))),
        };
        let message = ActionsMessage::new(vec![node_action(1), tombstone, atom]);
        let bytes = message.encode().unwrap();
        assert_eq!(&bytes[..4], b"WFAC");
        assert_eq!(ActionsMessage::decode(&bytes).unwrap(), message);
    }

    #[test]
    fn malformed_action_is_set_aside() {
        let good = to_cbor(&node_action(1)).unwrap();
        let also_good = to_cbor(&node_action(2)).unwrap();
        let raw = vec![
            RawAction(good),
            RawAction(vec![0xFF, 0x00]),
            RawAction(also_good),
        ];
        let bytes = ACTIONS_ENVELOPE.seal(&raw).unwrap();

        let decoded = ActionsMessage::decode_lenient(&bytes).unwrap();
        assert_eq!(decoded.actions, vec![node_action(1), node_action(2)]);
        assert_eq!(decoded.malformed.len(), 1);
        assert_eq!(decoded.malformed[0].index, 1);

        assert!(matches!(
            ActionsMessage::decode(&bytes),
            Err(ProtocolError::MalformedAction { index: 1, .. })
        ));
    }

    #[test]
    fn blobs_are_not_interchangeable() {
        let version = VersionMessage::default().encode().unwrap();
        assert!(matches!(
            ActionsMessage::decode(&version),
            Err(ProtocolError::Codec(CodecError::BadMagic { .. }))
        ));
    }

    #[test]
    fn newer_format_is_rejected() {
        let newer = Envelope::new(*b"WFAC", 2);
        let bytes = newer.seal(&Vec::<u64>::new()).unwrap();
        assert!(matches!(
            ActionsMessage::decode(&bytes),
            Err(ProtocolError::Codec(CodecError::UnsupportedVersion { found: 2, .. }))
        ));
    }

    #[test]
    fn empty_batch() {
        let bytes = ActionsMessage::default().encode().unwrap();
        assert!(ActionsMessage::decode(&bytes).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn arbitrary_bytes_never_panic(body in prop::collection::vec(any::<u8>(), 0..64)) {
            let mut bytes = b"WFAC\x01\x00".to_vec();
            bytes.extend_from_slice(&body);
            let _ = ActionsMessage::decode_lenient(&bytes);
            let _ = VersionMessage::decode(&body);
        }
    }
}
