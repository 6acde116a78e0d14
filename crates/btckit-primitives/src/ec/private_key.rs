//! secp256k1 private key with Bitcoin-specific functionality.
//!
//! Wraps a k256 signing key and adds the WIF codec (with network version and
//! compression flag) and deterministic ECDSA signing.

use k256::ecdsa::SigningKey;
use k256::Scalar;
use rand::rngs::OsRng;

use crate::ec::public_key::PublicKey;
use crate::ec::signature::Signature;
use crate::hash::sha256d;
use crate::PrimitivesError;

/// Length of a serialized private key in bytes.
const PRIVATE_KEY_BYTES_LEN: usize = 32;

/// Compression flag byte appended to WIF payloads for compressed public keys.
const COMPRESS_MAGIC: u8 = 0x01;

/// A secp256k1 private key for transaction signing.
#[derive(Clone, Debug)]
pub struct PrivateKey {
    /// The underlying k256 signing key.
    inner: SigningKey,
}

/// The result of decoding a WIF string.
///
/// Carries everything the encoding states: the key itself, whether the
/// corresponding public key should be serialized compressed, and the
/// network version byte the WIF was encoded for.
#[derive(Clone, Debug)]
pub struct DecodedWif {
    /// The decoded private key.
    pub key: PrivateKey,
    /// Whether the public key should be serialized in compressed form.
    pub compressed: bool,
    /// The network version byte (0x80 mainnet, 0xef testnet).
    pub version: u8,
}

impl PrivateKey {
    /// Generate a new random private key using the OS random number generator.
    ///
    /// # Returns
    /// A new randomly generated `PrivateKey`.
    pub fn new() -> Self {
        PrivateKey {
            inner: SigningKey::random(&mut OsRng),
        }
    }

    /// Create a private key from a raw 32-byte scalar.
    ///
    /// # Arguments
    /// * `bytes` - A 32-byte slice representing the private key scalar.
    ///
    /// # Returns
    /// `Ok(PrivateKey)` if the bytes represent a valid non-zero scalar,
    /// or an error otherwise.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != PRIVATE_KEY_BYTES_LEN {
            return Err(PrimitivesError::InvalidPrivateKey(format!(
                "expected {} bytes, got {}",
                PRIVATE_KEY_BYTES_LEN,
                bytes.len()
            )));
        }
        let signing_key = SigningKey::from_bytes(bytes.into())
            .map_err(|e| PrimitivesError::InvalidPrivateKey(e.to_string()))?;
        Ok(PrivateKey { inner: signing_key })
    }

    /// Create a private key from a hexadecimal string.
    ///
    /// # Arguments
    /// * `hex_str` - A 64-character hex string representing the 32-byte scalar.
    ///
    /// # Returns
    /// `Ok(PrivateKey)` on success, or an error if the hex or scalar is invalid.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        if hex_str.is_empty() {
            return Err(PrimitivesError::InvalidPrivateKey(
                "private key hex is empty".to_string(),
            ));
        }
        let bytes = hex::decode(hex_str)?;
        Self::from_bytes(&bytes)
    }

    /// Decode a WIF (Wallet Import Format) string.
    ///
    /// Validates the Base58Check checksum and extracts the key scalar,
    /// compression flag, and network version byte.
    ///
    /// # Arguments
    /// * `wif` - A Base58Check-encoded WIF string (compressed or uncompressed).
    ///
    /// # Returns
    /// `Ok(DecodedWif)` on success, or an error if the WIF is malformed or
    /// the checksum fails.
    pub fn decode_wif(wif: &str) -> Result<DecodedWif, PrimitivesError> {
        let decoded = bs58::decode(wif)
            .into_vec()
            .map_err(|e| PrimitivesError::InvalidWif(e.to_string()))?;
        let decoded_len = decoded.len();

        // version(1) + key(32) + [compress flag(1)] + checksum(4)
        let compressed = match decoded_len {
            38 => {
                if decoded[33] != COMPRESS_MAGIC {
                    return Err(PrimitivesError::InvalidWif(
                        "malformed private key: invalid compression flag".to_string(),
                    ));
                }
                true
            }
            37 => false,
            _ => {
                return Err(PrimitivesError::InvalidWif(format!(
                    "malformed private key: invalid length {}",
                    decoded_len
                )));
            }
        };

        let payload_end = decoded_len - 4;
        let checksum = sha256d(&decoded[..payload_end]);
        if checksum[..4] != decoded[payload_end..] {
            return Err(PrimitivesError::ChecksumMismatch);
        }

        let key = Self::from_bytes(&decoded[1..1 + PRIVATE_KEY_BYTES_LEN])?;
        Ok(DecodedWif {
            key,
            compressed,
            version: decoded[0],
        })
    }

    /// Create a private key from a WIF string, discarding the metadata.
    ///
    /// # Arguments
    /// * `wif` - A Base58Check-encoded WIF string.
    ///
    /// # Returns
    /// `Ok(PrivateKey)` on success.
    pub fn from_wif(wif: &str) -> Result<Self, PrimitivesError> {
        Ok(Self::decode_wif(wif)?.key)
    }

    /// Encode the private key as a compressed-key WIF string.
    ///
    /// # Arguments
    /// * `version` - The network version byte (0x80 mainnet, 0xef testnet).
    ///
    /// # Returns
    /// A Base58Check-encoded WIF string.
    pub fn to_wif(&self, version: u8) -> String {
        let key_bytes = self.to_bytes();
        let mut payload = Vec::with_capacity(1 + PRIVATE_KEY_BYTES_LEN + 1 + 4);
        payload.push(version);
        payload.extend_from_slice(&key_bytes);
        payload.push(COMPRESS_MAGIC);

        let checksum = sha256d(&payload);
        payload.extend_from_slice(&checksum[..4]);

        bs58::encode(payload).into_string()
    }

    /// Serialize the private key as a 32-byte big-endian array.
    ///
    /// # Returns
    /// A 32-byte array containing the private key scalar.
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.inner.to_bytes());
        out
    }

    /// Serialize the private key as a lowercase hexadecimal string.
    ///
    /// # Returns
    /// A 64-character hex string representing the 32-byte scalar.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Derive the corresponding public key for this private key.
    ///
    /// # Returns
    /// The `PublicKey` corresponding to this private key.
    pub fn pub_key(&self) -> PublicKey {
        PublicKey::from_k256_verifying_key(self.inner.verifying_key())
    }

    /// Sign a 32-byte message hash using deterministic RFC6979 nonces.
    ///
    /// Produces a low-S normalized signature per BIP-0062.
    ///
    /// # Arguments
    /// * `hash` - The message hash to sign (32 bytes).
    ///
    /// # Returns
    /// `Ok(Signature)` on success, or an error if signing fails.
    pub fn sign(&self, hash: &[u8]) -> Result<Signature, PrimitivesError> {
        Signature::sign(hash, self)
    }

    /// Access the private key scalar for tweak arithmetic.
    ///
    /// # Returns
    /// The key as a k256 `Scalar`.
    pub(crate) fn to_scalar(&self) -> Scalar {
        *self.inner.as_nonzero_scalar().as_ref()
    }

    /// Access the underlying k256 `SigningKey`.
    ///
    /// # Returns
    /// A reference to the inner `SigningKey`.
    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.inner
    }
}

impl Default for PrivateKey {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Known vector: key of scalar 1 has the generator point as pubkey.
    #[test]
    fn test_from_hex_generator_key() {
        let key = PrivateKey::from_hex(
            "0000000000000000000000000000000000000000000000000000000000000001",
        )
        .expect("valid scalar");
        assert_eq!(
            hex::encode(key.pub_key().to_compressed()),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
    }

    /// WIF decode must surface the compression flag and version byte.
    #[test]
    fn test_decode_wif_compressed_mainnet() {
        // Compressed mainnet WIF for scalar 1.
        let wif = "KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWn";
        let decoded = PrivateKey::decode_wif(wif).expect("valid WIF");
        assert!(decoded.compressed);
        assert_eq!(decoded.version, 0x80);
        assert_eq!(
            decoded.key.to_hex(),
            "0000000000000000000000000000000000000000000000000000000000000001"
        );
    }

    /// WIF encode/decode round trip with the testnet version byte.
    #[test]
    fn test_wif_roundtrip_testnet() {
        let key = PrivateKey::from_hex(
            "1111111111111111111111111111111111111111111111111111111111111111",
        )
        .expect("valid scalar");
        let wif = key.to_wif(0xef);
        let decoded = PrivateKey::decode_wif(&wif).expect("roundtrip WIF");
        assert_eq!(decoded.version, 0xef);
        assert!(decoded.compressed);
        assert_eq!(decoded.key.to_bytes(), key.to_bytes());
    }

    #[test]
    fn test_decode_wif_bad_checksum() {
        // Flip the last character of a valid WIF.
        let wif = "KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWm";
        assert!(PrivateKey::decode_wif(wif).is_err());
    }

    #[test]
    fn test_from_bytes_rejects_zero() {
        assert!(PrivateKey::from_bytes(&[0u8; 32]).is_err());
    }

    #[test]
    fn test_from_bytes_rejects_wrong_length() {
        assert!(PrivateKey::from_bytes(&[1u8; 31]).is_err());
    }
}
