/// Error types for transaction construction and signing.
///
/// The taxonomy separates caller-recoverable failures (insufficient
/// balance, which carries the computed requirement) from fatal ones
/// (signing failures, protocol limits). Nothing here is retried
/// internally.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// The request is malformed and was rejected before signing
    /// (bad address, bad script, missing prevout).
    #[error("validation error: {0}")]
    Validation(String),

    /// Inputs do not cover outputs plus the computed fee. Carries the fee
    /// the transaction would need so the caller can fund and retry without
    /// a second sizing round trip.
    #[error("insufficient balance: requires fee of {required_fee} sat")]
    InsufficientBalance {
        /// The fee the transaction requires at the requested rate.
        required_fee: u64,
    },

    /// The prevout script matches none of the four signable kinds.
    #[error("unknown script type: {0}")]
    UnknownScriptType(String),

    /// The supplied private key is malformed or out of range.
    #[error("bad private key: {0}")]
    BadPrivateKey(String),

    /// A cryptographic signing operation failed. Always fatal.
    #[error("signing failure: {0}")]
    SigningFailure(String),

    /// A protocol cap was exceeded (transaction weight, payload size).
    /// Fatal; the caller must restructure the request.
    #[error("{what} of {actual} exceeds limit {limit}")]
    ProtocolLimitExceeded {
        /// What was measured (e.g. "transaction weight").
        what: String,
        /// The configured cap.
        limit: u64,
        /// The measured value.
        actual: u64,
    },

    /// An error during binary/hex serialization or deserialization.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An underlying script error.
    #[error("script error: {0}")]
    Script(#[from] btckit_script::ScriptError),

    /// An underlying primitives error.
    #[error("primitives error: {0}")]
    Primitives(#[from] btckit_primitives::PrimitivesError),
}
