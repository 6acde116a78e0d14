//! BIP-340 Schnorr signing and BIP-341 taproot key tweaking.
//!
//! Taproot outputs commit to an internal key tweaked by a tagged hash of the
//! key itself and an optional script-tree merkle root. Key-path spending
//! signs with the tweaked key; script-path spending signs with the untweaked
//! internal key and reveals the leaf plus a control block.

use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::elliptic_curve::PrimeField;
use k256::schnorr;
use k256::{AffinePoint, EncodedPoint, ProjectivePoint, Scalar};

use crate::ec::private_key::PrivateKey;
use crate::hash::tagged_sha256;
use crate::PrimitivesError;

/// A taproot output key with its parity bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TweakedKey {
    /// The x-only output key (the witness program of a P2TR output).
    pub x_only: [u8; 32],
    /// Whether the output key's y-coordinate is odd. Needed for the
    /// control block in script-path spends.
    pub odd_parity: bool,
}

/// Sign a message with BIP-340 Schnorr using zeroed auxiliary randomness.
///
/// Zero aux randomness keeps signing deterministic, which the builder relies
/// on for byte-identical rebuilds.
///
/// # Arguments
/// * `key` - The (already tweaked, if key-path) private key.
/// * `msg` - The message to sign; for sighash use this is the 32-byte digest.
///
/// # Returns
/// A 64-byte Schnorr signature, or an error if the key is invalid.
pub fn sign_bip340(key: &PrivateKey, msg: &[u8]) -> Result<[u8; 64], PrimitivesError> {
    let signing_key = schnorr::SigningKey::from_bytes(&key.to_bytes())
        .map_err(|e| PrimitivesError::InvalidPrivateKey(e.to_string()))?;
    let sig = signing_key
        .sign_raw(msg, &[0u8; 32])
        .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;
    let mut out = [0u8; 64];
    out.copy_from_slice(&sig.to_bytes());
    Ok(out)
}

/// Verify a BIP-340 Schnorr signature against an x-only public key.
///
/// # Arguments
/// * `x_only` - The 32-byte x-only public key.
/// * `msg` - The signed message.
/// * `sig` - The 64-byte signature.
///
/// # Returns
/// `true` if the signature is valid.
pub fn verify_bip340(x_only: &[u8; 32], msg: &[u8], sig: &[u8; 64]) -> bool {
    let Ok(vk) = schnorr::VerifyingKey::from_bytes(x_only) else {
        return false;
    };
    let Ok(signature) = schnorr::Signature::try_from(sig.as_slice()) else {
        return false;
    };
    vk.verify_raw(msg, &signature).is_ok()
}

/// Compute the taproot output key for an internal key and optional merkle root.
///
/// Output key Q = lift_x(P) + t*G where t = H_TapTweak(x(P) || merkle_root).
///
/// # Arguments
/// * `internal_x` - The x-only internal public key.
/// * `merkle_root` - The script-tree merkle root, or `None` for key-path-only
///   outputs (the tweak then commits to the key alone).
///
/// # Returns
/// The tweaked output key with its parity, or an error if the internal key
/// is not a valid x-coordinate or the tweak is out of range.
pub fn taproot_output_key(
    internal_x: &[u8; 32],
    merkle_root: Option<&[u8; 32]>,
) -> Result<TweakedKey, PrimitivesError> {
    let p = lift_x(internal_x)?;
    let t = tap_tweak_scalar(internal_x, merkle_root)?;

    let q = ProjectivePoint::from(p) + ProjectivePoint::GENERATOR * t;
    let encoded = q.to_affine().to_encoded_point(true);
    let bytes = encoded.as_bytes();
    if bytes.len() != 33 {
        return Err(PrimitivesError::InvalidTweak(
            "tweaked key is the point at infinity".to_string(),
        ));
    }

    let mut x_only = [0u8; 32];
    x_only.copy_from_slice(&bytes[1..33]);
    Ok(TweakedKey {
        x_only,
        odd_parity: bytes[0] == 0x03,
    })
}

/// Derive the tweaked private key for taproot key-path signing.
///
/// The internal key scalar is negated first if its public key has odd y
/// (BIP-340 implicitly uses the even-y key), then the TapTweak scalar is
/// added.
///
/// # Arguments
/// * `key` - The internal private key.
/// * `merkle_root` - The script-tree merkle root, or `None` for
///   key-path-only outputs.
///
/// # Returns
/// The tweaked private key, or an error if the tweak is out of range or the
/// result is zero.
pub fn tweaked_signing_key(
    key: &PrivateKey,
    merkle_root: Option<&[u8; 32]>,
) -> Result<PrivateKey, PrimitivesError> {
    let pub_key = key.pub_key();
    let mut d = key.to_scalar();
    if pub_key.has_odd_y() {
        d = -d;
    }

    let internal_x = pub_key.x_only();
    let t = tap_tweak_scalar(&internal_x, merkle_root)?;
    let tweaked = d + t;

    PrivateKey::from_bytes(&tweaked.to_bytes())
}

/// Compute the TapTweak scalar t = H_TapTweak(x(P) || merkle_root).
fn tap_tweak_scalar(
    internal_x: &[u8; 32],
    merkle_root: Option<&[u8; 32]>,
) -> Result<Scalar, PrimitivesError> {
    let mut buf = Vec::with_capacity(64);
    buf.extend_from_slice(internal_x);
    if let Some(root) = merkle_root {
        buf.extend_from_slice(root);
    }
    let tweak = tagged_sha256("TapTweak", &buf);

    Option::<Scalar>::from(Scalar::from_repr(tweak.into())).ok_or_else(|| {
        PrimitivesError::InvalidTweak("tweak value exceeds the curve order".to_string())
    })
}

/// Lift an x-only key to the curve point with even y.
fn lift_x(x: &[u8; 32]) -> Result<AffinePoint, PrimitivesError> {
    let mut sec1 = [0u8; 33];
    sec1[0] = 0x02;
    sec1[1..].copy_from_slice(x);
    let encoded = EncodedPoint::from_bytes(sec1)
        .map_err(|e| PrimitivesError::InvalidPublicKey(e.to_string()))?;
    Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded)).ok_or_else(|| {
        PrimitivesError::InvalidPublicKey("x-only key is not on the curve".to_string())
    })
}
