//! Address classification: network, script family and dust threshold
//!
//! Segwit addresses are recognized by their bech32 prefix and classified by
//! witness version and program length. Legacy addresses go through base58check
//! and are matched on their version byte. Nothing here returns an error; an
//! address that cannot be classified decodes to `UNKNOWN` on mainnet.

use bitcoin::{base58, bech32};
use tracing::trace;

use crate::types::{AddressType, DecodedAddress, NetworkType};

use super::keys::address_to_script_public_key;

const BECH32_PREFIXES: &[&str] = &["bc1", "tb1", "bcrt1"];

/// Base58 version bytes per network
struct Base58Versions {
    pub_key_hash: u8,
    script_hash: u8,
}

fn base58_versions(network: NetworkType) -> Base58Versions {
    match network {
        NetworkType::Mainnet => Base58Versions { pub_key_hash: 0x00, script_hash: 0x05 },
        NetworkType::Testnet | NetworkType::Regtest => Base58Versions { pub_key_hash: 0x6f, script_hash: 0xc4 },
    }
}

fn bech32_hrp(network: NetworkType) -> &'static str {
    match network {
        NetworkType::Mainnet => "bc",
        NetworkType::Testnet => "tb",
        NetworkType::Regtest => "bcrt",
    }
}

/// Decode an address into its network, script family and dust threshold.
///
/// The `bc1`/`tb1`/`bcrt1` prefix match ignores case, so all-uppercase
/// bech32 addresses (valid per BIP173) are classified like lowercase ones.
/// Mixed-case strings still fail bech32 decoding and end up `UNKNOWN`.
pub fn decode_address(address: &str) -> DecodedAddress {
    let lower = address.to_ascii_lowercase();
    if BECH32_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        if let Some(decoded) = decode_segwit(address) {
            return decoded;
        }
    }
    if let Some(decoded) = decode_legacy(address) {
        return decoded;
    }

    trace!(address, "unrecognized address, falling back to UNKNOWN");
    DecodedAddress::unknown()
}

fn decode_segwit(address: &str) -> Option<DecodedAddress> {
    let (hrp, version, program) = bech32::segwit::decode(address).ok()?;
    let hrp = hrp.as_str().to_ascii_lowercase();
    let network = NetworkType::ALL.into_iter().find(|n| bech32_hrp(*n) == hrp)?;

    let address_type = match (version.to_u8(), program.len()) {
        (0, 20) => AddressType::P2wpkh,
        (0, 32) => AddressType::P2wsh,
        (1, 32) => AddressType::P2tr,
        _ => return None,
    };
    Some(DecodedAddress::new(network, address_type))
}

fn decode_legacy(address: &str) -> Option<DecodedAddress> {
    let payload = base58::decode_check(address).ok()?;
    if payload.len() != 21 {
        return None;
    }

    // Testnet and regtest share version bytes; the first table that matches wins.
    // Script-hash addresses are treated as wrapped segwit, never as plain P2SH.
    let version = payload[0];
    NetworkType::ALL.into_iter().find_map(|network| {
        let versions = base58_versions(network);
        if version == versions.pub_key_hash {
            Some(DecodedAddress::new(network, AddressType::P2pkh))
        } else if version == versions.script_hash {
            Some(DecodedAddress::new(network, AddressType::P2shP2wpkh))
        } else {
            None
        }
    })
}

pub fn get_address_type(address: &str) -> AddressType {
    decode_address(address).address_type
}

pub fn get_address_type_dust(address_type: AddressType) -> u64 {
    address_type.dust()
}

/// True when the address yields an output script on `network`.
pub fn is_valid_address(address: &str, network: NetworkType) -> bool {
    address_to_script_public_key(address, network).is_ok()
}

/// True when outputs at this address may fund a protocol transaction.
pub fn is_supported_from_address(address: &str) -> bool {
    get_address_type(address).is_supported_from()
}
