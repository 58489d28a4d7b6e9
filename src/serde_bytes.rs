//! Serde helpers for byte strings
//!
//! In memory, keyset IDs, signatures and DLEQ scalars are hex strings. The
//! CBOR token format carries them as raw byte strings instead.

use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;

/// Serialize a hex `String` as a byte string and back
pub mod hex_bytes {
    use super::*;

    pub fn serialize<S>(hex_str: &str, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bytes = hex::decode(hex_str).map_err(serde::ser::Error::custom)?;
        serializer.serialize_bytes(&bytes)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_byte_buf(HexBytesVisitor)
    }
}

struct HexBytesVisitor;

impl<'de> Visitor<'de> for HexBytesVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a byte string")
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<String, E> {
        Ok(hex::encode(v))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<String, E> {
        Ok(hex::encode(v))
    }

    // Some encoders emit byte strings as arrays of small integers
    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<String, A::Error> {
        let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(byte) = seq.next_element::<u8>()? {
            bytes.push(byte);
        }
        Ok(hex::encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "super::hex_bytes")]
        c: String,
    }

    #[test]
    fn test_cbor_byte_string() {
        let w = Wrapper { c: "00ad268c4d1f5826".to_string() };
        let mut buf = Vec::new();
        ciborium::into_writer(&w, &mut buf).unwrap();
        // map(1) "c" bytes(8)
        assert_eq!(&buf[..4], &[0xa1, 0x61, b'c', 0x48]);

        let back: Wrapper = ciborium::from_reader(buf.as_slice()).unwrap();
        assert_eq!(back, w);
    }

    #[test]
    fn test_bad_hex_fails_to_serialize() {
        let w = Wrapper { c: "xyz".to_string() };
        let mut buf = Vec::new();
        assert!(ciborium::into_writer(&w, &mut buf).is_err());
    }
}
