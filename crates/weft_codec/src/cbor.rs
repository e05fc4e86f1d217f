//! CBOR encode/decode on top of ciborium.

use crate::error::{CodecError, CodecResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Cursor;

/// Serializes `value` to CBOR.
///
/// # Errors
///
/// Returns `EncodingFailed` if the serializer rejects the value.
pub fn to_cbor<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
    let mut buffer = Vec::new();
    ciborium::ser::into_writer(value, &mut buffer)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(buffer)
}

/// Deserializes exactly one CBOR value from `bytes`.
///
/// # Errors
///
/// Returns `DecodingFailed` for malformed or mistyped input and
/// `TrailingBytes` if anything follows the value.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    let mut cursor = Cursor::new(bytes);
    let value = ciborium::de::from_reader(&mut cursor)
        .map_err(|e| CodecError::decoding_failed(e.to_string()))?;
    let consumed = usize::try_from(cursor.position()).unwrap_or(bytes.len());
    if consumed < bytes.len() {
        return Err(CodecError::TrailingBytes {
            count: bytes.len() - consumed,
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn map_encoding_is_deterministic() {
        let mut a = BTreeMap::new();
        a.insert(9u64, 1u64);
        a.insert(1, 7);
        let mut b = BTreeMap::new();
        b.insert(1u64, 7u64);
        b.insert(9, 1);
        assert_eq!(to_cbor(&a).unwrap(), to_cbor(&b).unwrap());
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = to_cbor(&42u64).unwrap();
        bytes.extend_from_slice(&[0, 0]);
        assert_eq!(
            from_cbor::<u64>(&bytes),
            Err(CodecError::TrailingBytes { count: 2 })
        );
    }

    #[test]
    fn truncated_input_rejected() {
        let bytes = to_cbor(&vec![1u64, 2, 3, 4]).unwrap();
        let result = from_cbor::<Vec<u64>>(&bytes[..bytes.len() - 1]);
        assert!(matches!(result, Err(CodecError::DecodingFailed { .. })));
    }

    #[test]
    fn wrong_type_rejected() {
        let bytes = to_cbor("text").unwrap();
        assert!(matches!(
            from_cbor::<u64>(&bytes),
            Err(CodecError::DecodingFailed { .. })
        ));
    }

    #[test]
    fn empty_input_rejected() {
        assert!(from_cbor::<u64>(&[]).is_err());
    }
}
