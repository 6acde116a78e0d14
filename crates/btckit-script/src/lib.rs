/// btckit SDK - Script construction, classification, and addresses.
///
/// Provides the Script type with push-data encoding and chunk parsing,
/// a pure byte-pattern classifier producing the closed `ScriptKind` union,
/// the per-chain `NetworkProfile` table, and address conversion for the
/// four supported script kinds (P2PKH, P2SH, P2WPKH, P2TR).

pub mod address;
pub mod chunk;
pub mod network;
pub mod opcodes;
pub mod script;

mod error;
pub use address::{Address, AddressKind};
pub use error::ScriptError;
pub use network::NetworkProfile;
pub use script::{Script, ScriptKind};
