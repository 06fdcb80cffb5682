//! Derive address command: public key + script family + network -> address
use anyhow::*;

use crate::bitcoin_utils::*;

use super::{parse_address_type, parse_network};

#[derive(clap::Parser, Debug)]
pub struct DeriveAddressOpts {
    /// Hex public key (33/65-byte SEC, or 32-byte x-only for p2tr)
    #[arg(long)] pub pubkey: String,
    /// p2pkh | p2wpkh | p2tr | p2sh-p2wpkh
    #[arg(long, default_value="p2wpkh")] pub address_type: String,
    #[arg(long, default_value="mainnet")] pub network: String,
}

pub fn run_derive_address(o: DeriveAddressOpts) -> Result<()> {
    let network = parse_network(&o.network)?;
    let address_type = parse_address_type(&o.address_type)?;

    let payment = public_key_to_payment(&o.pubkey, address_type, network)?
        .ok_or_else(|| anyhow!("cannot derive a {} address from a public key", address_type))?;

    let out = serde_json::json!({
        "address": payment.address.to_string(),
        "addressType": address_type,
        "networkType": network,
        "scriptPubkey": hex::encode(payment.script_pubkey.as_bytes()),
        "redeemScript": payment.redeem_script.map(|s| hex::encode(s.as_bytes())),
        "dust": address_type.dust(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
