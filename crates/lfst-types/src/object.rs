use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::TypeError;

/// Content-addressed identifier for an LFS object.
///
/// An `Oid` is the SHA-256 digest of an object's bytes. It is globally unique
/// for those bytes, so the store deduplicates by it across repositories. On
/// the wire and in JSON it is the lowercase 64-character hex encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid([u8; 32]);

impl Oid {
    /// Compute an `Oid` from raw bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Create an `Oid` from a pre-computed digest.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self.short_hex())
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Oid {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.to_hex()
    }
}

impl From<[u8; 32]> for Oid {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Identity and exact size of an LFS object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pointer {
    pub oid: Oid,
    pub size: u64,
}

impl Pointer {
    pub fn new(oid: Oid, size: u64) -> Self {
        Self { oid, size }
    }

    /// Pointer describing `data` exactly.
    pub fn for_content(data: &[u8]) -> Self {
        Self {
            oid: Oid::from_bytes(data),
            size: data.len() as u64,
        }
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes)", self.oid, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn from_bytes_is_sha256() {
        assert_eq!(Oid::from_bytes(b"").to_hex(), EMPTY_SHA256);
        assert_eq!(
            Oid::from_bytes(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn hex_roundtrip() {
        let oid = Oid::from_bytes(b"test");
        assert_eq!(Oid::from_hex(&oid.to_hex()).unwrap(), oid);
    }

    #[test]
    fn rejects_short_and_non_hex() {
        assert_eq!(
            Oid::from_hex("abcd").unwrap_err(),
            TypeError::InvalidLength { expected: 32, actual: 2 }
        );
        assert!(matches!(Oid::from_hex("zz"), Err(TypeError::InvalidHex(_))));
    }

    #[test]
    fn serializes_as_hex_string() {
        let pointer = Pointer::for_content(b"");
        let json = serde_json::to_string(&pointer).unwrap();
        assert_eq!(json, format!("{{\"oid\":\"{EMPTY_SHA256}\",\"size\":0}}"));
        let parsed: Pointer = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, pointer);
    }

    #[test]
    fn deserialize_rejects_bad_oid() {
        let err = serde_json::from_str::<Pointer>(r#"{"oid":"nope","size":1}"#);
        assert!(err.is_err());
    }

    #[test]
    fn debug_is_short() {
        let oid = Oid::from_hex(EMPTY_SHA256).unwrap();
        assert_eq!(format!("{oid:?}"), "Oid(e3b0c442)");
    }

    proptest::proptest! {
        #[test]
        fn parse_display_roundtrip(bytes in proptest::array::uniform32(proptest::num::u8::ANY)) {
            let oid = Oid::from_hash(bytes);
            let parsed: Oid = oid.to_string().parse().unwrap();
            proptest::prop_assert_eq!(parsed, oid);
        }
    }
}
