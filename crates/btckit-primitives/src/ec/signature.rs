//! ECDSA signature with DER serialization and RFC6979 deterministic nonces.
//!
//! Wraps the k256 signature type, normalizing to low-S per BIP-0062 so that
//! identical inputs always produce identical transaction bytes.

use k256::ecdsa;

use crate::ec::private_key::PrivateKey;
use crate::PrimitivesError;

/// An ECDSA signature over secp256k1.
///
/// Always held in low-S normalized form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    inner: ecdsa::Signature,
}

impl Signature {
    /// Sign a message hash using RFC6979 deterministic nonces.
    ///
    /// The hash is padded or truncated to the 32-byte scalar size. The
    /// resulting signature is low-S normalized.
    ///
    /// # Arguments
    /// * `hash` - The message hash to sign.
    /// * `priv_key` - The private key to sign with.
    ///
    /// # Returns
    /// `Ok(Signature)` on success, or an error if signing fails.
    pub fn sign(hash: &[u8], priv_key: &PrivateKey) -> Result<Self, PrimitivesError> {
        let padded = normalize_hash(hash);
        let (sig, _recovery_id) = priv_key
            .signing_key()
            .sign_prehash_recoverable(&padded)
            .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;
        let normalized = sig.normalize_s().unwrap_or(sig);
        Ok(Signature { inner: normalized })
    }

    /// Parse a DER-encoded ECDSA signature.
    ///
    /// # Arguments
    /// * `bytes` - DER-encoded signature bytes.
    ///
    /// # Returns
    /// `Ok(Signature)` on success, or an error if the DER encoding is
    /// malformed.
    pub fn from_der(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let sig = ecdsa::Signature::from_der(bytes)
            .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;
        let normalized = sig.normalize_s().unwrap_or(sig);
        Ok(Signature { inner: normalized })
    }

    /// Serialize the signature in DER format.
    ///
    /// # Returns
    /// A byte vector containing the DER-encoded signature.
    pub fn to_der(&self) -> Vec<u8> {
        self.inner.to_der().as_bytes().to_vec()
    }

    /// Serialize as the raw 64-byte r||s form.
    ///
    /// # Returns
    /// A 64-byte array with big-endian R and S.
    pub fn to_raw(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out.copy_from_slice(&self.inner.to_bytes());
        out
    }

    /// Access the inner k256 signature.
    ///
    /// # Returns
    /// A reference to the wrapped signature.
    pub(crate) fn as_k256(&self) -> &ecdsa::Signature {
        &self.inner
    }
}

/// Normalize an arbitrary-length hash to exactly 32 bytes for secp256k1.
///
/// Pads shorter hashes with leading zeros and truncates longer ones.
fn normalize_hash(hash: &[u8]) -> [u8; 32] {
    let mut padded = [0u8; 32];
    if hash.len() >= 32 {
        padded.copy_from_slice(&hash[..32]);
    } else {
        padded[32 - hash.len()..].copy_from_slice(hash);
    }
    padded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::sha256;

    /// RFC6979 signing is deterministic: same key + hash, same DER bytes.
    #[test]
    fn test_signing_is_deterministic() {
        let key = PrivateKey::from_hex(
            "3333333333333333333333333333333333333333333333333333333333333333",
        )
        .expect("valid scalar");
        let hash = sha256(b"determinism");
        let a = key.sign(&hash).expect("sign").to_der();
        let b = key.sign(&hash).expect("sign").to_der();
        assert_eq!(a, b);
    }

    /// DER round trip preserves the signature.
    #[test]
    fn test_der_roundtrip() {
        let key = PrivateKey::from_hex(
            "4444444444444444444444444444444444444444444444444444444444444444",
        )
        .expect("valid scalar");
        let hash = sha256(b"roundtrip");
        let sig = key.sign(&hash).expect("sign");
        let parsed = Signature::from_der(&sig.to_der()).expect("parse DER");
        assert_eq!(sig.to_raw().to_vec(), parsed.to_raw().to_vec());
    }

    /// The S component never exceeds half the curve order.
    #[test]
    fn test_low_s() {
        const HALF_ORDER: [u8; 32] = [
            0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
            0xFF, 0xFF, 0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46,
            0x68, 0x1B, 0x20, 0xA0,
        ];
        let key = PrivateKey::from_hex(
            "5555555555555555555555555555555555555555555555555555555555555555",
        )
        .expect("valid scalar");
        for i in 0u8..16 {
            let sig = key.sign(&sha256(&[i])).expect("sign");
            let raw = sig.to_raw();
            assert!(raw[32..] <= HALF_ORDER[..], "S not normalized for msg {}", i);
        }
    }

    #[test]
    fn test_from_der_rejects_garbage() {
        assert!(Signature::from_der(&[0x30, 0x02, 0x01, 0x01]).is_err());
        assert!(Signature::from_der(b"not a signature").is_err());
    }
}
