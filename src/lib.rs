//! Address classification and UTXO-to-signing-input adaptation for assets
//! anchored on Bitcoin.
//!
//! - [`bitcoin_utils::address`] classifies address strings (network, script family, dust)
//! - [`bitcoin_utils::keys`] derives payments/addresses from public keys
//! - [`utxo`] turns UTXOs into signing-ready inputs and batch-prepares them
//!   against a [`source::DataSource`]

pub mod bitcoin_utils;
pub mod commands;
pub mod error;
pub mod source;
pub mod types;
pub mod utxo;

pub use error::AdapterError;
pub use source::{DataSource, SourceError};
pub use types::*;
pub use utxo::{fill_utxo_pubkey, prepare_utxo_inputs, utxo_to_input, utxos_to_inputs, PrepareOptions};
