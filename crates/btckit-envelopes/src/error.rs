/// Error types for the metaprotocol codecs.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// The request is malformed and was rejected before any transaction
    /// bytes were constructed.
    #[error("validation error: {0}")]
    Validation(String),

    /// More than one distinct asset id flows through the request.
    #[error("request mixes assets: {asset_ids:?}")]
    MultiAsset {
        /// The distinct asset ids encountered.
        asset_ids: Vec<String>,
    },

    /// The same asset id appears as both fungible and non-fungible.
    #[error("asset {asset_id} tagged with mixed kinds")]
    MixedAssetKinds {
        /// The offending asset id.
        asset_id: String,
    },

    /// A non-fungible asset id appears more than once on a single input.
    #[error("duplicate NFT id {asset_id} on one input")]
    DuplicateNft {
        /// The duplicated asset id.
        asset_id: String,
    },

    /// An output names an asset id no input funds.
    #[error("asset {asset_id} is not funded by any input")]
    UnfundedAsset {
        /// The unfunded asset id.
        asset_id: String,
    },

    /// A runestone payload exceeds the OP_RETURN cap. Fatal.
    #[error("runestone payload of {len} bytes exceeds {max}")]
    ScriptTooLong {
        /// The payload length.
        len: usize,
        /// The cap.
        max: usize,
    },

    /// A varint stream ended mid-value or overflowed.
    #[error("malformed varint payload: {0}")]
    MalformedPayload(String),

    /// An underlying transaction error, including `InsufficientBalance`
    /// and `ProtocolLimitExceeded`.
    #[error("transaction error: {0}")]
    Transaction(#[from] btckit_transaction::TransactionError),

    /// An underlying script error.
    #[error("script error: {0}")]
    Script(#[from] btckit_script::ScriptError),

    /// An underlying primitives error.
    #[error("primitives error: {0}")]
    Primitives(#[from] btckit_primitives::PrimitivesError),
}
