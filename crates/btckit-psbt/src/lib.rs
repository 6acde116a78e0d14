/// btckit SDK - BIP-174 partially signed transactions.
///
/// Provides the PSBT container with a lossless binary codec (unknown
/// key-value pairs included), input finalization and transaction
/// extraction, and the two-party seller/buyer listing exchange built on
/// SIGHASH_SINGLE|ANYONECANPAY.

pub mod exchange;
pub mod packet;

mod error;
pub use error::PsbtError;
pub use exchange::{
    buyer_assemble_and_sign, seller_create_listing, BuyerOrder, ExchangeResult, SellerListing,
    SELLER_SLOT_INDEX,
};
pub use packet::{KeyValue, Psbt, PsbtInput, PsbtOutput};
