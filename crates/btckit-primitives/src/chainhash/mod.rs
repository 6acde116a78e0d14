//! Transaction-id hash type.
//!
//! A 32-byte hash stored in internal (little-endian) byte order with
//! conversion to and from the big-endian display form used in explorers
//! and RPC interfaces.

use std::fmt;

use crate::hash::sha256d;
use crate::PrimitivesError;

/// Size of a chain hash in bytes.
pub const HASH_SIZE: usize = 32;

/// A 32-byte hash in internal (little-endian) byte order.
///
/// Transaction ids and block hashes are displayed byte-reversed from their
/// internal order; `from_hex`/`to_hex` perform that reversal.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    /// Create a hash from a 32-byte array already in internal order.
    ///
    /// # Arguments
    /// * `bytes` - The 32 hash bytes.
    ///
    /// # Returns
    /// A `Hash` wrapping the bytes.
    pub fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }

    /// Create a hash from a byte slice in internal order.
    ///
    /// # Arguments
    /// * `bytes` - A slice of exactly 32 bytes.
    ///
    /// # Returns
    /// `Ok(Hash)` or an error if the slice length is wrong.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != HASH_SIZE {
            return Err(PrimitivesError::InvalidHash(format!(
                "expected {} bytes, got {}",
                HASH_SIZE,
                bytes.len()
            )));
        }
        let mut out = [0u8; HASH_SIZE];
        out.copy_from_slice(bytes);
        Ok(Hash(out))
    }

    /// Parse a hash from its display-order (big-endian) hex string.
    ///
    /// The decoded bytes are reversed into internal order.
    ///
    /// # Arguments
    /// * `hex_str` - A 64-character hex string as displayed by explorers.
    ///
    /// # Returns
    /// `Ok(Hash)` or an error if the hex is invalid or the wrong length.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        let mut bytes = hex::decode(hex_str)?;
        if bytes.len() != HASH_SIZE {
            return Err(PrimitivesError::InvalidHash(format!(
                "expected {} bytes, got {}",
                HASH_SIZE,
                bytes.len()
            )));
        }
        bytes.reverse();
        Self::from_bytes(&bytes)
    }

    /// Render the hash in display order (byte-reversed hex).
    ///
    /// # Returns
    /// A 64-character hex string.
    pub fn to_hex(&self) -> String {
        let mut bytes = self.0;
        bytes.reverse();
        hex::encode(bytes)
    }

    /// Access the raw internal-order bytes.
    ///
    /// # Returns
    /// A reference to the 32-byte array.
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

/// Compute the double-SHA256 of the data as a `Hash`.
///
/// # Arguments
/// * `data` - The bytes to hash.
///
/// # Returns
/// The sha256d digest wrapped in a `Hash`.
pub fn double_hash_h(data: &[u8]) -> Hash {
    Hash(sha256d(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// from_hex must reverse into internal order; to_hex must reverse back.
    #[test]
    fn test_from_hex_roundtrip() {
        let display = "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";
        let h = Hash::from_hex(display).expect("valid hex");
        assert_eq!(h.to_hex(), display);
        // Internal order starts with the last display byte.
        assert_eq!(h.as_bytes()[0], 0x3b);
    }

    #[test]
    fn test_from_hex_wrong_length() {
        assert!(Hash::from_hex("abcd").is_err());
    }

    #[test]
    fn test_from_bytes_wrong_length() {
        assert!(Hash::from_bytes(&[0u8; 31]).is_err());
    }

    #[test]
    fn test_double_hash_h() {
        let h = double_hash_h(b"");
        // sha256d("") in internal order, displayed reversed.
        assert_eq!(
            h.to_hex(),
            "56944c5d3f98413ef45cf54545538103cc9f298e0575820ad3591376e2e0f65d"
        );
    }
}
