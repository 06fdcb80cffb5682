//! Command handlers for each subcommand

pub mod decode_address;
pub mod derive_address;
pub mod prepare_inputs;

pub use decode_address::*;
pub use derive_address::*;
pub use prepare_inputs::*;

use anyhow::{Error, Result};

use crate::types::{AddressType, NetworkType};

pub(crate) fn parse_network(s: &str) -> Result<NetworkType> {
    s.parse().map_err(Error::msg)
}

pub(crate) fn parse_address_type(s: &str) -> Result<AddressType> {
    s.parse().map_err(Error::msg)
}
