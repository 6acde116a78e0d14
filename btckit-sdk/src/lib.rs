#![deny(missing_docs)]

//! btckit SDK - Complete SDK.
//!
//! Re-exports all btckit components for convenient single-crate usage.

pub use btckit_envelopes as envelopes;
pub use btckit_primitives as primitives;
pub use btckit_psbt as psbt;
pub use btckit_script as script;
pub use btckit_transaction as transaction;
