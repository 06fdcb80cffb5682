//! Key handling and payment derivation
//!
//! Turns a hex public key into the output script/address of a given script
//! family, and addresses back into output scripts for a specific network.

use bitcoin::address::{Address, NetworkUnchecked};
use bitcoin::{CompressedPublicKey, Network, PublicKey, ScriptBuf, XOnlyPublicKey};
use secp256k1::Secp256k1;

use crate::error::{AdapterError, Result};
use crate::types::{AddressType, NetworkType};

/// A spendable output derived from a public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payment {
    pub address: Address,
    pub script_pubkey: ScriptBuf,
    /// Only set for P2SH-wrapped payments
    pub redeem_script: Option<ScriptBuf>,
}

/// Parse a hex-encoded SEC public key (compressed or uncompressed).
pub fn parse_public_key(pubkey_hex: &str) -> Result<PublicKey> {
    let bytes = hex::decode(pubkey_hex.trim())?;
    PublicKey::from_slice(&bytes).map_err(|e| AdapterError::InvalidPubkey(e.to_string()))
}

/// Segwit v0 outputs only commit to compressed keys.
fn compressed(pk: &PublicKey) -> Result<CompressedPublicKey> {
    if !pk.compressed {
        return Err(AdapterError::InvalidPubkey("segwit requires a compressed public key".into()));
    }
    Ok(CompressedPublicKey(pk.inner))
}

/// X-only form of a public key, as used for taproot internal keys.
///
/// Accepts a 32-byte x-only key as-is, or drops the parity of a SEC key.
pub fn to_x_only(pubkey_hex: &str) -> Result<XOnlyPublicKey> {
    let bytes = hex::decode(pubkey_hex.trim())?;
    if bytes.len() == 32 {
        return XOnlyPublicKey::from_slice(&bytes).map_err(|e| AdapterError::InvalidPubkey(e.to_string()));
    }
    let pk = PublicKey::from_slice(&bytes).map_err(|e| AdapterError::InvalidPubkey(e.to_string()))?;
    Ok(pk.inner.x_only_public_key().0)
}

/// P2WPKH output script for a key; doubles as the P2SH-P2WPKH redeem script.
pub fn p2wpkh_redeem_script(pubkey_hex: &str) -> Result<ScriptBuf> {
    let pk = compressed(&parse_public_key(pubkey_hex)?)?;
    Ok(Address::p2wpkh(&pk, Network::Bitcoin).script_pubkey())
}

/// Derive the payment for `pubkey_hex` in the given script family.
///
/// An empty key, or a family that cannot be derived from a single key
/// (P2WSH, plain P2SH, UNKNOWN), yields `None`.
pub fn public_key_to_payment(
    pubkey_hex: &str,
    address_type: AddressType,
    network: NetworkType,
) -> Result<Option<Payment>> {
    if pubkey_hex.trim().is_empty() {
        return Ok(None);
    }
    let net = Network::from(network);

    let payment = match address_type {
        AddressType::P2pkh => {
            let pk = parse_public_key(pubkey_hex)?;
            let address = Address::p2pkh(pk.pubkey_hash(), net);
            Payment { script_pubkey: address.script_pubkey(), address, redeem_script: None }
        }
        AddressType::P2wpkh => {
            let pk = compressed(&parse_public_key(pubkey_hex)?)?;
            let address = Address::p2wpkh(&pk, net);
            Payment { script_pubkey: address.script_pubkey(), address, redeem_script: None }
        }
        AddressType::P2tr => {
            // Key-path only: BIP341 tweak with an empty script tree
            let internal_key = to_x_only(pubkey_hex)?;
            let secp = Secp256k1::verification_only();
            let address = Address::p2tr(&secp, internal_key, None, net);
            Payment { script_pubkey: address.script_pubkey(), address, redeem_script: None }
        }
        AddressType::P2shP2wpkh => {
            let pk = compressed(&parse_public_key(pubkey_hex)?)?;
            let redeem = Address::p2wpkh(&pk, net).script_pubkey();
            let address = Address::p2shwpkh(&pk, net);
            Payment { script_pubkey: address.script_pubkey(), address, redeem_script: Some(redeem) }
        }
        AddressType::P2wsh | AddressType::P2sh | AddressType::Unknown => return Ok(None),
    };
    Ok(Some(payment))
}

pub fn public_key_to_address(pubkey_hex: &str, address_type: AddressType, network: NetworkType) -> Result<String> {
    public_key_to_payment(pubkey_hex, address_type, network)?
        .map(|p| p.address.to_string())
        .ok_or(AdapterError::UnsupportedAddressType)
}

/// Output script for an address, which must be valid on `network`.
pub fn address_to_script_public_key(address: &str, network: NetworkType) -> Result<ScriptBuf> {
    let addr = address
        .parse::<Address<NetworkUnchecked>>()
        .map_err(|e| AdapterError::InvalidAddress(format!("{address}: {e}")))?
        .require_network(network.into())
        .map_err(|e| AdapterError::InvalidAddress(format!("{address}: {e}")))?;
    Ok(addr.script_pubkey())
}

pub fn address_to_script_public_key_hex(address: &str, network: NetworkType) -> Result<String> {
    Ok(hex::encode(address_to_script_public_key(address, network)?.as_bytes()))
}

/// True for a witness v1 32-byte program (OP_1 <32 bytes>). Bad hex is not taproot.
pub fn is_p2tr_script(script_hex: &str) -> bool {
    match hex::decode(script_hex) {
        Ok(bytes) => ScriptBuf::from_bytes(bytes).is_p2tr(),
        Err(_) => false,
    }
}

pub fn is_p2wpkh_script(script_hex: &str) -> bool {
    match hex::decode(script_hex) {
        Ok(bytes) => ScriptBuf::from_bytes(bytes).is_p2wpkh(),
        Err(_) => false,
    }
}
