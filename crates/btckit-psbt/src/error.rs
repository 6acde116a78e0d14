/// Error types for PSBT encoding and the two-party exchange.
#[derive(Debug, thiserror::Error)]
pub enum PsbtError {
    /// The binary container is malformed (bad magic, truncated map,
    /// duplicate or misplaced typed key).
    #[error("malformed psbt: {0}")]
    Malformed(String),

    /// Seller and buyer disagree about the transaction shape: slot index
    /// out of range, or the seller's outpoint not reproduced
    /// byte-for-byte.
    #[error("assembly error: {0}")]
    AssemblyError(String),

    /// An input cannot be finalized: missing witness or non-witness UTXO
    /// data, or no usable signature.
    #[error("finalization error at input {input}: {reason}")]
    FinalizationError {
        /// Index of the offending input.
        input: usize,
        /// Why finalization failed.
        reason: String,
    },

    /// An underlying transaction error.
    #[error("transaction error: {0}")]
    Transaction(#[from] btckit_transaction::TransactionError),

    /// An underlying script error.
    #[error("script error: {0}")]
    Script(#[from] btckit_script::ScriptError),

    /// An underlying primitives error.
    #[error("primitives error: {0}")]
    Primitives(#[from] btckit_primitives::PrimitivesError),
}
