//! secp256k1 public key with Bitcoin-specific functionality.
//!
//! Supports compressed/uncompressed SEC1 serialization, hash160 program
//! derivation, the x-only form used by taproot, and ECDSA verification.

use std::fmt;

use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::VerifyingKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;

use crate::ec::signature::Signature;
use crate::hash::hash160;
use crate::PrimitivesError;

/// Length of a compressed public key in bytes (prefix + 32-byte x-coordinate).
const COMPRESSED_LEN: usize = 33;

/// Length of an uncompressed public key in bytes (prefix + x + y).
const UNCOMPRESSED_LEN: usize = 65;

/// A secp256k1 public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    /// The underlying k256 verifying key.
    inner: VerifyingKey,
}

impl PublicKey {
    /// Create a PublicKey from raw SEC1-encoded bytes.
    ///
    /// Accepts both compressed (33-byte) and uncompressed (65-byte) formats.
    ///
    /// # Arguments
    /// * `bytes` - SEC1-encoded public key bytes.
    ///
    /// # Returns
    /// `Ok(PublicKey)` on success, or an error if the bytes are not a valid
    /// curve point.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.is_empty() {
            return Err(PrimitivesError::InvalidPublicKey(
                "pubkey bytes are empty".to_string(),
            ));
        }
        let vk = VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|e| PrimitivesError::InvalidPublicKey(e.to_string()))?;
        Ok(PublicKey { inner: vk })
    }

    /// Create a PublicKey from a hex-encoded SEC1 string.
    ///
    /// # Arguments
    /// * `hex_str` - A hex string of a compressed (66 chars) or uncompressed
    ///   (130 chars) key.
    ///
    /// # Returns
    /// `Ok(PublicKey)` on success, or an error if the hex or point is invalid.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        let bytes = hex::decode(hex_str)?;
        Self::from_bytes(&bytes)
    }

    /// Serialize the public key in compressed SEC1 format (33 bytes).
    ///
    /// # Returns
    /// A 33-byte array: 0x02/0x03 prefix followed by the x-coordinate.
    pub fn to_compressed(&self) -> [u8; COMPRESSED_LEN] {
        let point = self.inner.to_encoded_point(true);
        let mut out = [0u8; COMPRESSED_LEN];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Serialize the public key in uncompressed SEC1 format (65 bytes).
    ///
    /// # Returns
    /// A 65-byte array: 0x04 prefix followed by x and y coordinates.
    pub fn to_uncompressed(&self) -> [u8; UNCOMPRESSED_LEN] {
        let point = self.inner.to_encoded_point(false);
        let mut out = [0u8; UNCOMPRESSED_LEN];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Serialize the compressed key as a lowercase hex string.
    ///
    /// # Returns
    /// A 66-character hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_compressed())
    }

    /// Return the 32-byte x-only form used by taproot (BIP-340).
    ///
    /// # Returns
    /// The x-coordinate with the parity prefix dropped.
    pub fn x_only(&self) -> [u8; 32] {
        let compressed = self.to_compressed();
        let mut out = [0u8; 32];
        out.copy_from_slice(&compressed[1..33]);
        out
    }

    /// Whether the point's y-coordinate is odd (SEC1 prefix 0x03).
    ///
    /// # Returns
    /// `true` for odd parity.
    pub fn has_odd_y(&self) -> bool {
        self.to_compressed()[0] == 0x03
    }

    /// Compute the hash160 of the compressed public key.
    ///
    /// This is the program committed to by P2PKH and P2WPKH scripts.
    ///
    /// # Returns
    /// A 20-byte hash160 digest.
    pub fn hash160(&self) -> [u8; 20] {
        hash160(&self.to_compressed())
    }

    /// Verify an ECDSA signature against a 32-byte message hash.
    ///
    /// # Arguments
    /// * `hash` - The message hash that was signed.
    /// * `sig` - The signature to verify.
    ///
    /// # Returns
    /// `true` if the signature is valid.
    pub fn verify(&self, hash: &[u8], sig: &Signature) -> bool {
        self.inner.verify_prehash(hash, sig.as_k256()).is_ok()
    }

    /// Wrap a k256 verifying key.
    ///
    /// # Arguments
    /// * `vk` - The verifying key to wrap.
    ///
    /// # Returns
    /// A new `PublicKey`.
    pub(crate) fn from_k256_verifying_key(vk: &VerifyingKey) -> Self {
        PublicKey { inner: *vk }
    }
}

impl fmt::Display for PublicKey {
    /// Display the key as its compressed hex string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ec::private_key::PrivateKey;

    #[test]
    fn test_compressed_uncompressed_same_x() {
        let key = PrivateKey::from_hex(
            "0000000000000000000000000000000000000000000000000000000000000002",
        )
        .expect("valid scalar");
        let pk = key.pub_key();
        let compressed = pk.to_compressed();
        let uncompressed = pk.to_uncompressed();
        assert_eq!(uncompressed[0], 0x04);
        assert_eq!(&compressed[1..33], &uncompressed[1..33]);
        assert_eq!(pk.x_only(), compressed[1..33]);
    }

    #[test]
    fn test_from_hex_rejects_non_point() {
        // x = 5 has no curve point with prefix 0x02... actually use garbage.
        assert!(PublicKey::from_hex("02ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff").is_err());
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let key = PrivateKey::from_hex(
            "2222222222222222222222222222222222222222222222222222222222222222",
        )
        .expect("valid scalar");
        let hash = crate::hash::sha256(b"message");
        let sig = key.sign(&hash).expect("signing succeeds");
        assert!(key.pub_key().verify(&hash, &sig));
        let other_hash = crate::hash::sha256(b"other");
        assert!(!key.pub_key().verify(&other_hash, &sig));
    }
}
