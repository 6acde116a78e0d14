/// btckit SDK - Cryptographic and wire-format primitives.
///
/// Provides the hash functions, secp256k1 key/signature types (ECDSA and
/// BIP-340 Schnorr), transaction-id type, and binary reader/writer helpers
/// shared by the script, transaction, PSBT, and envelope crates.

pub mod chainhash;
pub mod ec;
pub mod hash;
pub mod util;

mod error;
pub use error::PrimitivesError;
