/// btckit SDK - Metaprotocol envelope codecs.
///
/// Three codecs that embed application data inside otherwise-valid
/// scripts: ordinal inscriptions (taproot script-path commit/reveal),
/// atomicals asset-balance rules over colored satoshis, and runes
/// OP_RETURN edict encoding with its two deployed varint byte orders.

pub mod atomicals;
pub mod ordinals;
pub mod runes;

mod error;
pub use atomicals::{
    build_asset_transfer, AssetKind, AssetOutputSpec, AssetPrevOutput, AssetTag,
    AssetTransferRequest,
};
pub use error::EnvelopeError;
pub use ordinals::{inscribe, InscribeResult, InscriptionData, InscriptionRequest};
pub use runes::{
    build_rune_transfer, build_runestone_script, parse_runestone_script, Edict,
    RuneTransferRequest, VarintOrder,
};
