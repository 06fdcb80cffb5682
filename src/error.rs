//! Error types for address classification and input adaptation

use crate::source::SourceError;

/// Failures raised while resolving payments or adapting UTXOs into inputs.
///
/// Address *decoding* never produces one of these; an unrecognized address
/// decodes to `AddressType::Unknown` instead.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// A taproot or wrapped-segwit UTXO has no public key to build signing data from.
    #[error("missing pubkey for address {address}")]
    MissingPubkey { address: String },

    #[error("unsupported address type")]
    UnsupportedAddressType,

    /// Confirmation was required and the data source reports the funding tx as pending.
    #[error("utxo {txid}:{vout} is not confirmed")]
    UnconfirmedUtxo { txid: String, vout: u32 },

    #[error("invalid public key: {0}")]
    InvalidPubkey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid txid: {0}")]
    InvalidTxid(String),

    #[error("hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Passed through untouched so callers can apply their own retry policy.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A confirmation task ended without reporting (panicked or limiter closed).
    #[error("confirmation check aborted before reporting")]
    ConfirmationAborted,
}

impl AdapterError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            AdapterError::MissingPubkey { .. } => "MISSING_PUBKEY",
            AdapterError::UnsupportedAddressType => "UNSUPPORTED_ADDRESS_TYPE",
            AdapterError::UnconfirmedUtxo { .. } => "UNCONFIRMED_UTXO",
            AdapterError::InvalidPubkey(_) => "INVALID_PUBKEY",
            AdapterError::InvalidAddress(_) => "INVALID_ADDRESS",
            AdapterError::InvalidTxid(_) => "INVALID_TXID",
            AdapterError::Hex(_) => "INVALID_HEX",
            AdapterError::Source(_) => "DATA_SOURCE",
            AdapterError::ConfirmationAborted => "CONFIRMATION_ABORTED",
        }
    }
}

pub type Result<T, E = AdapterError> = std::result::Result<T, E>;
