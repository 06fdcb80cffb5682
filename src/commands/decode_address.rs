//! Decode address command: classify an address and report its dust threshold
use anyhow::*;

use crate::bitcoin_utils::*;

use super::parse_network;

#[derive(clap::Parser, Debug)]
pub struct DecodeAddressOpts {
    #[arg(long)] pub address: String,
    /// Also report whether the address is valid on this network
    #[arg(long)] pub network: Option<String>,
}

pub fn run_decode_address(o: DecodeAddressOpts) -> Result<()> {
    let decoded = decode_address(&o.address);

    let mut out = serde_json::json!({
        "address": o.address,
        "networkType": decoded.network_type,
        "addressType": decoded.address_type,
        "dust": decoded.dust,
        "supportedFrom": decoded.address_type.is_supported_from(),
    });
    if let Some(network) = &o.network {
        let network = parse_network(network)?;
        out["valid"] = serde_json::json!(is_valid_address(&o.address, network));
    }

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
