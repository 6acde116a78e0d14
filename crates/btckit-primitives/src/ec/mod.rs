/// Elliptic curve cryptography on secp256k1.
///
/// Provides private keys (with WIF codec), public keys, DER-encoded ECDSA
/// signatures, and the BIP-340 Schnorr / taproot-tweak operations used for
/// segwit-v1 signing.

pub mod private_key;
pub mod public_key;
pub mod schnorr;
pub mod signature;

pub use private_key::{DecodedWif, PrivateKey};
pub use public_key::PublicKey;
pub use signature::Signature;
