/// Error types for script and address operations.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// The script byte stream is truncated or otherwise malformed.
    #[error("malformed script: {0}")]
    MalformedScript(String),

    /// A push payload exceeds what a single push operation can carry.
    #[error("push data too large: {0} bytes")]
    PushDataTooLarge(usize),

    /// An opcode was used where it is not allowed (e.g. raw PUSHDATA via
    /// `append_opcodes`).
    #[error("invalid opcode usage: {0}")]
    InvalidOpcode(String),

    /// The address string does not match any supported encoding.
    #[error("unsupported address: {0}")]
    UnsupportedAddress(String),

    /// The address decodes but belongs to a different network.
    #[error("address '{address}' is not valid for network {network}")]
    WrongNetwork { address: String, network: String },

    /// The address payload has an unexpected length.
    #[error("invalid address length for '{0}'")]
    InvalidAddressLength(String),

    /// A base58check checksum did not verify.
    #[error("address checksum mismatch")]
    ChecksumMismatch,

    /// The script bytes do not correspond to any address form.
    #[error("script has no address form: {0}")]
    NoAddressForm(String),

    /// Invalid hexadecimal input.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// An underlying primitives error.
    #[error("primitives error: {0}")]
    Primitives(#[from] btckit_primitives::PrimitivesError),
}
