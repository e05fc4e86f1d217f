//! Entity identifiers.

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Identifier shared by nodes, edges and atoms.
///
/// Ids are 128-bit values minted at random, so independent replicas can create
/// entities without coordinating. Equality and ordering are bytewise, which
/// matches the ordering of the `(high, low)` word pair.
///
/// On the wire an id is the pair `(high, low)` of big-endian 64-bit halves.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id([u8; 16]);

impl Id {
    /// The smallest id. Used as a lower bound in index ranges.
    pub const MIN: Self = Self([0; 16]);

    /// The largest id. Used as an upper bound in index ranges.
    pub const MAX: Self = Self([0xff; 16]);

    /// Mints a fresh random id.
    #[must_use]
    pub fn mint() -> Self {
        Self(Uuid::new_v4().into_bytes())
    }

    /// Creates an id from raw bytes.
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Creates an id from its high and low 64-bit words.
    #[must_use]
    pub const fn from_words(high: u64, low: u64) -> Self {
        Self::from_u128(((high as u128) << 64) | low as u128)
    }

    /// Splits the id into its high and low 64-bit words.
    #[must_use]
    pub const fn to_words(&self) -> (u64, u64) {
        let value = self.as_u128();
        ((value >> 64) as u64, value as u64)
    }

    /// Creates an id from a 128-bit integer.
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(value.to_be_bytes())
    }

    /// Returns the id as a 128-bit integer.
    #[must_use]
    pub const fn as_u128(&self) -> u128 {
        u128::from_be_bytes(self.0)
    }

    /// Converts to a UUID.
    #[must_use]
    pub fn to_uuid(&self) -> Uuid {
        Uuid::from_bytes(self.0)
    }

    /// Creates an id from a slice.
    ///
    /// Returns `None` if the slice is not exactly 16 bytes.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; 16]>::try_from(slice).ok().map(Self)
    }
}

/// Mints a fresh random id.
#[must_use]
pub fn mint() -> Id {
    Id::mint()
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.to_uuid())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uuid())
    }
}

impl From<Uuid> for Id {
    fn from(uuid: Uuid) -> Self {
        Self(uuid.into_bytes())
    }
}

impl From<u128> for Id {
    fn from(value: u128) -> Self {
        Self::from_u128(value)
    }
}

impl From<[u8; 16]> for Id {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_words().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (high, low) = <(u64, u64)>::deserialize(deserializer)?;
        Ok(Self::from_words(high, low))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_is_unique() {
        assert_ne!(Id::mint(), Id::mint());
    }

    #[test]
    fn words_match_bytes() {
        let id = Id::from_words(0x0102_0304_0506_0708, 0x090a_0b0c_0d0e_0f10);
        assert_eq!(
            *id.as_bytes(),
            [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16]
        );
        assert_eq!(id.to_words(), (0x0102_0304_0506_0708, 0x090a_0b0c_0d0e_0f10));
    }

    #[test]
    fn ordering_follows_high_word_first() {
        let a = Id::from_words(1, u64::MAX);
        let b = Id::from_words(2, 0);
        assert!(a < b);
        assert!(Id::MIN < a && b < Id::MAX);
    }

    #[test]
    fn from_slice() {
        assert!(Id::from_slice(&[0u8; 16]).is_some());
        assert!(Id::from_slice(&[0u8; 15]).is_none());
        assert!(Id::from_slice(&[0u8; 17]).is_none());
    }

    #[test]
    fn serializes_as_word_pair() {
        let id = Id::from_words(7, 9);
        let bytes = weft_codec::to_cbor(&id).unwrap();
        assert_eq!(bytes, weft_codec::to_cbor(&(7u64, 9u64)).unwrap());
        assert_eq!(weft_codec::from_cbor::<Id>(&bytes).unwrap(), id);
    }
}
