//! Shared data structures and types

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use bitcoin::{Network, ScriptBuf, Txid, XOnlyPublicKey};
use serde::{Deserialize, Serialize};

// ── Constants ────────────────────────────────────────────────────────────────

// Dust thresholds in sats, keyed by the script family of the output
pub const P2WPKH_DUST_SATS: u64 = 294;
pub const P2TR_DUST_SATS: u64 = 330;
pub const DEFAULT_DUST_SATS: u64 = 546;

/// Upper bound on simultaneous confirmation lookups against a data source
pub const DEFAULT_CONFIRMATION_CONCURRENCY: usize = 10;

// ── Address Taxonomy ─────────────────────────────────────────────────────────

/// Script/address family of an output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AddressType {
    P2pkh,
    P2wpkh,
    P2tr,
    P2shP2wpkh,
    P2wsh,
    P2sh,
    Unknown,
}

impl AddressType {
    /// Minimum economical output value for this script family.
    pub fn dust(self) -> u64 {
        match self {
            AddressType::P2wpkh => P2WPKH_DUST_SATS,
            AddressType::P2tr => P2TR_DUST_SATS,
            AddressType::P2pkh
            | AddressType::P2shP2wpkh
            | AddressType::P2wsh
            | AddressType::P2sh
            | AddressType::Unknown => DEFAULT_DUST_SATS,
        }
    }

    /// Whether outputs of this family can fund a protocol transaction.
    pub fn is_supported_from(self) -> bool {
        match self {
            AddressType::P2wpkh | AddressType::P2tr | AddressType::P2sh | AddressType::P2shP2wpkh => true,
            AddressType::P2pkh | AddressType::P2wsh | AddressType::Unknown => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AddressType::P2pkh => "P2PKH",
            AddressType::P2wpkh => "P2WPKH",
            AddressType::P2tr => "P2TR",
            AddressType::P2shP2wpkh => "P2SH_P2WPKH",
            AddressType::P2wsh => "P2WSH",
            AddressType::P2sh => "P2SH",
            AddressType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AddressType {
    type Err = String;

    /// Accepts `P2SH_P2WPKH`, `p2sh-p2wpkh` and friends.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "P2PKH" => Ok(AddressType::P2pkh),
            "P2WPKH" => Ok(AddressType::P2wpkh),
            "P2TR" => Ok(AddressType::P2tr),
            "P2SH_P2WPKH" => Ok(AddressType::P2shP2wpkh),
            "P2WSH" => Ok(AddressType::P2wsh),
            "P2SH" => Ok(AddressType::P2sh),
            "UNKNOWN" => Ok(AddressType::Unknown),
            _ => Err(format!("unknown address type: {s}")),
        }
    }
}

/// Bitcoin network an address is encoded for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetworkType {
    Mainnet,
    Testnet,
    Regtest,
}

impl NetworkType {
    pub const ALL: [NetworkType; 3] = [NetworkType::Mainnet, NetworkType::Testnet, NetworkType::Regtest];

    pub fn as_str(self) -> &'static str {
        match self {
            NetworkType::Mainnet => "mainnet",
            NetworkType::Testnet => "testnet",
            NetworkType::Regtest => "regtest",
        }
    }
}

impl From<NetworkType> for Network {
    fn from(network: NetworkType) -> Self {
        match network {
            NetworkType::Mainnet => Network::Bitcoin,
            NetworkType::Testnet => Network::Testnet,
            NetworkType::Regtest => Network::Regtest,
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "bitcoin" => Ok(NetworkType::Mainnet),
            "testnet" => Ok(NetworkType::Testnet),
            "regtest" => Ok(NetworkType::Regtest),
            _ => Err(format!("network must be mainnet|testnet|regtest, got {s}")),
        }
    }
}

/// Result of classifying an address string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedAddress {
    pub network_type: NetworkType,
    pub address_type: AddressType,
    pub dust: u64,
}

impl DecodedAddress {
    pub fn new(network_type: NetworkType, address_type: AddressType) -> Self {
        Self { network_type, address_type, dust: address_type.dust() }
    }

    /// What every unrecognized address decodes to.
    pub fn unknown() -> Self {
        Self::new(NetworkType::Mainnet, AddressType::Unknown)
    }
}

// ── UTXO Types ───────────────────────────────────────────────────────────────

/// Known public keys (hex) by address, supplied by the wallet.
pub type AddressToPubkeyMap = HashMap<String, String>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utxo {
    pub txid: String,
    pub vout: u32,
    pub value: u64,
    pub script_pk: String, // Prevout script (hex) for witness_utxo
    pub address_type: AddressType,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<String>,
}

/// Value and script of the output being spent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WitnessUtxo {
    pub value: u64,
    pub script: ScriptBuf,
}

/// Signing material beyond the witness-utxo; at most one per input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InputExtra {
    TapInternalKey(XOnlyPublicKey),
    RedeemScript(ScriptBuf),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputData {
    pub hash: Txid,
    pub index: u32,
    pub witness_utxo: WitnessUtxo,
    #[serde(flatten)]
    pub extra: Option<InputExtra>,
}

impl InputData {
    pub fn tap_internal_key(&self) -> Option<&XOnlyPublicKey> {
        match &self.extra {
            Some(InputExtra::TapInternalKey(key)) => Some(key),
            _ => None,
        }
    }

    pub fn redeem_script(&self) -> Option<&ScriptBuf> {
        match &self.extra {
            Some(InputExtra::RedeemScript(script)) => Some(script),
            _ => None,
        }
    }
}

/// Signing-ready input paired with the UTXO it was built from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Input {
    pub data: InputData,
    pub utxo: Utxo,
}
