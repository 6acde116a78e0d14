/// btckit SDK - Transaction building, signing, and serialization.
///
/// Provides the Transaction type with legacy+segwit wire codec, the three
/// sighash algorithms (legacy, BIP-143, BIP-341), per-input signing
/// dispatched from prevout script bytes, weight/virtual-size computation,
/// and the fee/change feedback-loop builder.

pub mod builder;
pub mod input;
pub mod output;
pub mod sighash;
pub mod signer;
pub mod transaction;
pub mod utxo;

mod error;
pub use builder::{BuildParams, BuildResult, OutputSpec, TransactionBuilder};
pub use error::TransactionError;
pub use input::TxInput;
pub use output::TxOutput;
pub use signer::SignatureEngine;
pub use transaction::Transaction;
pub use utxo::{Outpoint, PrevOutput, UtxoEntry, UtxoSet};
