//! Hand-off to PSBT builders and UTXO list parsing
//!
//! The transaction builder that consumes our inputs works on PSBTs; this
//! module turns an adapted input into the per-input PSBT map and parses the
//! compact `txid:vout:value_sat` UTXO lists accepted on the command line.

use anyhow::*;
use bitcoin::{psbt, Amount, TxOut};

use crate::types::{InputData, InputExtra, NetworkType, Utxo};

use super::address::decode_address;
use super::keys::address_to_script_public_key_hex;

impl From<&InputData> for psbt::Input {
    fn from(data: &InputData) -> Self {
        let mut input = psbt::Input {
            witness_utxo: Some(TxOut {
                value: Amount::from_sat(data.witness_utxo.value),
                script_pubkey: data.witness_utxo.script.clone(),
            }),
            ..Default::default()
        };
        match &data.extra {
            Some(InputExtra::TapInternalKey(key)) => input.tap_internal_key = Some(*key),
            Some(InputExtra::RedeemScript(script)) => input.redeem_script = Some(script.clone()),
            None => {}
        }
        input
    }
}

/// Parse `txid:vout:value_sat,...` into UTXOs owned by `address`.
///
/// Every entry shares the address's output script and classification.
pub fn parse_utxos(csv: &str, address: &str, network: NetworkType) -> Result<Vec<Utxo>> {
    let script_pk = address_to_script_public_key_hex(address, network)?;
    let address_type = decode_address(address).address_type;

    let mut v = vec![];
    for (i, s) in csv.split(',').enumerate() {
        let p: Vec<_> = s.trim().split(':').collect();
        ensure!(
            p.len() == 3,
            "bad utxos[{}] (txid:vout:value_sat)",
            i
        );
        let txid: bitcoin::Txid = p[0].parse().with_context(|| format!("bad txid in utxos[{i}]"))?;
        v.push(Utxo {
            txid: txid.to_string(),
            vout: p[1].parse().with_context(|| format!("bad vout in utxos[{i}]"))?,
            value: p[2].parse().with_context(|| format!("bad value in utxos[{i}]"))?,
            script_pk: script_pk.clone(),
            address_type,
            address: address.to_string(),
            pubkey: None,
        });
    }
    Ok(v)
}
