//! UTXO to signing-input adaptation
//!
//! Every function here takes UTXOs by reference and hands back new values, so
//! one UTXO list can feed several preparation calls at once.

use std::sync::Arc;

use bitcoin::{ScriptBuf, Txid};
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use crate::bitcoin_utils::keys::{is_p2tr_script, p2wpkh_redeem_script, to_x_only};
use crate::error::{AdapterError, Result};
use crate::source::DataSource;
use crate::types::{
    AddressToPubkeyMap, AddressType, Input, InputData, InputExtra, Utxo, WitnessUtxo,
    DEFAULT_CONFIRMATION_CONCURRENCY,
};

/// Options for [`prepare_utxo_inputs`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrepareOptions {
    /// Fail when a taproot UTXO's pubkey cannot be found in the map
    pub require_pubkey: bool,
    /// Fail when any funding transaction is still unconfirmed
    pub require_confirmed: bool,
    /// Maximum confirmation lookups in flight; 0 is treated as 1
    pub concurrency: usize,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            require_pubkey: false,
            require_confirmed: false,
            concurrency: DEFAULT_CONFIRMATION_CONCURRENCY,
        }
    }
}

fn non_empty(pubkey: Option<&String>) -> Option<&str> {
    pubkey.map(String::as_str).filter(|pk| !pk.is_empty())
}

fn required_pubkey(utxo: &Utxo) -> Result<&str> {
    non_empty(utxo.pubkey.as_ref())
        .ok_or_else(|| AdapterError::MissingPubkey { address: utxo.address.clone() })
}

/// Build the signing data for a single UTXO.
pub fn utxo_to_input(utxo: &Utxo) -> Result<Input> {
    let extra = match utxo.address_type {
        AddressType::P2wpkh | AddressType::P2sh => None,
        AddressType::P2tr => {
            let pubkey = required_pubkey(utxo)?;
            Some(InputExtra::TapInternalKey(to_x_only(pubkey)?))
        }
        AddressType::P2shP2wpkh => {
            let pubkey = required_pubkey(utxo)?;
            Some(InputExtra::RedeemScript(p2wpkh_redeem_script(pubkey)?))
        }
        AddressType::P2pkh | AddressType::P2wsh | AddressType::Unknown => {
            return Err(AdapterError::UnsupportedAddressType)
        }
    };

    let hash: Txid = utxo.txid.parse().map_err(|_| AdapterError::InvalidTxid(utxo.txid.clone()))?;
    let script = ScriptBuf::from_bytes(hex::decode(&utxo.script_pk)?);

    Ok(Input {
        data: InputData {
            hash,
            index: utxo.vout,
            witness_utxo: WitnessUtxo { value: utxo.value, script },
            extra,
        },
        utxo: utxo.clone(),
    })
}

/// Order-preserving [`utxo_to_input`] over a batch; the first failure wins.
pub fn utxos_to_inputs(utxos: &[Utxo]) -> Result<Vec<Input>> {
    utxos.iter().map(utxo_to_input).collect()
}

/// Copy of `utxo` with a taproot pubkey backfilled from `pubkey_map`.
///
/// Only taproot-shaped outputs without a pubkey are touched; an existing
/// pubkey always wins over the map. Empty strings count as missing, both on
/// the UTXO and in the map.
pub fn fill_utxo_pubkey(utxo: &Utxo, pubkey_map: &AddressToPubkeyMap, require_pubkey: bool) -> Result<Utxo> {
    let mut filled = utxo.clone();
    if non_empty(filled.pubkey.as_ref()).is_some() || !is_p2tr_script(&filled.script_pk) {
        return Ok(filled);
    }

    match non_empty(pubkey_map.get(&filled.address)) {
        Some(pubkey) => {
            debug!(address = %filled.address, "filled taproot pubkey from map");
            filled.pubkey = Some(pubkey.to_string());
        }
        None if require_pubkey => {
            return Err(AdapterError::MissingPubkey { address: filled.address });
        }
        None => {}
    }
    Ok(filled)
}

/// Backfill pubkeys for a UTXO batch and optionally require confirmations.
///
/// Confirmation lookups run concurrently, capped at `options.concurrency`.
/// The first unconfirmed UTXO or source error fails the call; lookups already
/// started still run to completion in the background.
pub async fn prepare_utxo_inputs(
    utxos: &[Utxo],
    source: Arc<dyn DataSource>,
    pubkey_map: Option<&AddressToPubkeyMap>,
    options: &PrepareOptions,
) -> Result<Vec<Utxo>> {
    let empty = AddressToPubkeyMap::new();
    let pubkey_map = pubkey_map.unwrap_or(&empty);

    let prepared = utxos
        .iter()
        .map(|u| fill_utxo_pubkey(u, pubkey_map, options.require_pubkey))
        .collect::<Result<Vec<_>>>()?;

    if options.require_confirmed {
        ensure_confirmed(&prepared, source, options.concurrency).await?;
    }

    info!(
        utxos = prepared.len(),
        confirmed_checked = options.require_confirmed,
        "prepared utxo inputs"
    );
    Ok(prepared)
}

async fn ensure_confirmed(utxos: &[Utxo], source: Arc<dyn DataSource>, concurrency: usize) -> Result<()> {
    let concurrency = concurrency.max(1);
    debug!(utxos = utxos.len(), concurrency, "checking utxo confirmations");

    let limiter = Arc::new(Semaphore::new(concurrency));
    let (tx, mut rx) = mpsc::unbounded_channel();

    for utxo in utxos {
        let txid = utxo.txid.clone();
        let vout = utxo.vout;
        let source = Arc::clone(&source);
        let limiter = Arc::clone(&limiter);
        let tx = tx.clone();

        // Detached: dropping the handle lets in-flight checks finish after an early return
        tokio::spawn(async move {
            let outcome = async {
                let _permit = limiter.acquire_owned().await.map_err(|_| AdapterError::ConfirmationAborted)?;
                check_confirmed(source.as_ref(), &txid, vout).await
            }
            .await;
            let _ = tx.send(outcome);
        });
    }
    drop(tx);

    for _ in 0..utxos.len() {
        match rx.recv().await {
            Some(Ok(())) => {}
            Some(Err(err)) => return Err(err),
            None => return Err(AdapterError::ConfirmationAborted),
        }
    }
    Ok(())
}

async fn check_confirmed(source: &dyn DataSource, txid: &str, vout: u32) -> Result<()> {
    if source.is_transaction_confirmed(txid).await? {
        Ok(())
    } else {
        warn!(txid, vout, "utxo is not confirmed");
        Err(AdapterError::UnconfirmedUtxo { txid: txid.to_string(), vout })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TXID: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const PUBKEY: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
    const XONLY: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
    const P2WPKH_SPK: &str = "0014751e76e8199196d454941c45d1b3a323f1433bd6";
    const P2TR_ADDR: &str = "tb1pmfr3p9j00pfxjh0zmgp99y8zftmd3s5pmedqhyptwy6lm87hf5ssk79hv2";
    const P2TR_SPK: &str = "5120da4710964f7852695de2da025290e24af6d8c281de5a0b902b7135fd9fd74d21";
    const P2SH_ADDR: &str = "2NAUYAHhujozruyzpsFRP63mbrdaU5wnEpN";
    const P2SH_SPK: &str = "a914bcfeb728b584253d5f3f70bcb780e9ef218a68f487";

    fn utxo(address_type: AddressType, script_pk: &str, address: &str, pubkey: Option<&str>) -> Utxo {
        Utxo {
            txid: TXID.to_string(),
            vout: 0,
            value: 10_000,
            script_pk: script_pk.to_string(),
            address_type,
            address: address.to_string(),
            pubkey: pubkey.map(str::to_string),
        }
    }

    fn p2tr(pubkey: Option<&str>) -> Utxo {
        utxo(AddressType::P2tr, P2TR_SPK, P2TR_ADDR, pubkey)
    }

    // ── utxo_to_input ───────────────────────────────────────────────────────

    #[test]
    fn p2wpkh_gets_witness_utxo_only() {
        let u = utxo(
            AddressType::P2wpkh,
            P2WPKH_SPK,
            "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx",
            None,
        );
        let input = utxo_to_input(&u).unwrap();
        assert_eq!(input.data.hash.to_string(), TXID);
        assert_eq!(input.data.index, 0);
        assert_eq!(input.data.witness_utxo.value, 10_000);
        assert_eq!(hex::encode(input.data.witness_utxo.script.as_bytes()), P2WPKH_SPK);
        assert_eq!(input.data.extra, None);
        assert_eq!(input.utxo, u);
    }

    #[test]
    fn p2sh_gets_witness_utxo_only() {
        let u = utxo(AddressType::P2sh, P2SH_SPK, P2SH_ADDR, None);
        let input = utxo_to_input(&u).unwrap();
        assert_eq!(input.data.extra, None);
        assert_eq!(hex::encode(input.data.witness_utxo.script.as_bytes()), P2SH_SPK);
    }

    #[test]
    fn p2tr_requires_pubkey() {
        let err = utxo_to_input(&p2tr(None)).unwrap_err();
        match err {
            AdapterError::MissingPubkey { address } => assert_eq!(address, P2TR_ADDR),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(utxo_to_input(&p2tr(Some(""))), Err(AdapterError::MissingPubkey { .. })));
    }

    #[test]
    fn p2tr_gets_tap_internal_key() {
        let input = utxo_to_input(&p2tr(Some(PUBKEY))).unwrap();
        let key = input.data.tap_internal_key().expect("tap internal key");
        assert_eq!(hex::encode(key.serialize()), XONLY);
        assert!(input.data.redeem_script().is_none());
    }

    #[test]
    fn p2sh_p2wpkh_requires_pubkey() {
        let u = utxo(AddressType::P2shP2wpkh, P2SH_SPK, P2SH_ADDR, None);
        let err = utxo_to_input(&u).unwrap_err();
        assert_eq!(err.code(), "MISSING_PUBKEY");
    }

    #[test]
    fn p2sh_p2wpkh_gets_redeem_script() {
        let u = utxo(AddressType::P2shP2wpkh, P2SH_SPK, P2SH_ADDR, Some(PUBKEY));
        let input = utxo_to_input(&u).unwrap();
        let redeem = input.data.redeem_script().expect("redeem script");
        assert_eq!(hex::encode(redeem.as_bytes()), P2WPKH_SPK);
        assert!(input.data.tap_internal_key().is_none());
    }

    #[test]
    fn unsupported_types_fail() {
        for t in [AddressType::P2pkh, AddressType::P2wsh, AddressType::Unknown] {
            let u = utxo(t, P2WPKH_SPK, "whatever", Some(PUBKEY));
            assert!(matches!(utxo_to_input(&u), Err(AdapterError::UnsupportedAddressType)), "{t}");
        }
    }

    #[test]
    fn malformed_fields_fail() {
        let mut u = utxo(AddressType::P2wpkh, P2WPKH_SPK, "addr", None);
        u.txid = "nope".into();
        assert!(matches!(utxo_to_input(&u), Err(AdapterError::InvalidTxid(_))));

        let u = utxo(AddressType::P2wpkh, "00zz", "addr", None);
        assert!(matches!(utxo_to_input(&u), Err(AdapterError::Hex(_))));
    }

    #[test]
    fn batch_preserves_order() {
        let mut second = p2tr(Some(PUBKEY));
        second.vout = 7;
        let first = utxo(AddressType::P2wpkh, P2WPKH_SPK, "addr", None);
        let inputs = utxos_to_inputs(&[first, second]).unwrap();
        assert_eq!(inputs.iter().map(|i| i.data.index).collect::<Vec<_>>(), vec![0, 7]);
    }

    // ── fill_utxo_pubkey ────────────────────────────────────────────────────

    fn map() -> AddressToPubkeyMap {
        AddressToPubkeyMap::from([(P2TR_ADDR.to_string(), PUBKEY.to_string())])
    }

    #[test]
    fn fills_missing_taproot_pubkey() {
        let original = p2tr(None);
        let filled = fill_utxo_pubkey(&original, &map(), false).unwrap();
        assert_eq!(filled.pubkey.as_deref(), Some(PUBKEY));
        // the input is left alone
        assert_eq!(original.pubkey, None);
    }

    #[test]
    fn existing_pubkey_wins() {
        let original = p2tr(Some(XONLY));
        let filled = fill_utxo_pubkey(&original, &map(), true).unwrap();
        assert_eq!(filled, original);
    }

    #[test]
    fn non_taproot_passes_through() {
        let original = utxo(AddressType::P2wpkh, P2WPKH_SPK, P2TR_ADDR, None);
        let filled = fill_utxo_pubkey(&original, &map(), true).unwrap();
        assert_eq!(filled, original);
    }

    #[test]
    fn taproot_shape_comes_from_script() {
        // declared type is ignored; only the script decides
        let original = utxo(AddressType::Unknown, P2TR_SPK, P2TR_ADDR, None);
        let filled = fill_utxo_pubkey(&original, &map(), false).unwrap();
        assert_eq!(filled.pubkey.as_deref(), Some(PUBKEY));
    }

    #[test]
    fn missing_map_entry() {
        let empty = AddressToPubkeyMap::new();
        let filled = fill_utxo_pubkey(&p2tr(None), &empty, false).unwrap();
        assert_eq!(filled.pubkey, None);

        let err = fill_utxo_pubkey(&p2tr(None), &empty, true).unwrap_err();
        assert!(matches!(err, AdapterError::MissingPubkey { ref address } if address == P2TR_ADDR));
    }

    #[test]
    fn empty_pubkey_is_filled_from_map() {
        let original: Utxo = serde_json::from_value(serde_json::json!({
            "txid": TXID,
            "vout": 0,
            "value": 10_000,
            "scriptPk": P2TR_SPK,
            "addressType": "P2TR",
            "address": P2TR_ADDR,
            "pubkey": "",
        }))
        .unwrap();
        let filled = fill_utxo_pubkey(&original, &map(), true).unwrap();
        assert_eq!(filled.pubkey.as_deref(), Some(PUBKEY));
        let input = utxo_to_input(&filled).unwrap();
        assert_eq!(input.data.tap_internal_key().map(|k| k.to_string()).as_deref(), Some(XONLY));
    }

    #[test]
    fn empty_map_entry_counts_as_missing() {
        let blank = AddressToPubkeyMap::from([(P2TR_ADDR.to_string(), String::new())]);
        let err = fill_utxo_pubkey(&p2tr(Some("")), &blank, true).unwrap_err();
        assert!(matches!(err, AdapterError::MissingPubkey { ref address } if address == P2TR_ADDR));

        let filled = fill_utxo_pubkey(&p2tr(None), &blank, false).unwrap();
        assert_eq!(filled.pubkey, None);
    }

    #[test]
    fn fill_is_idempotent() {
        let once = fill_utxo_pubkey(&p2tr(None), &map(), false).unwrap();
        let twice = fill_utxo_pubkey(&once, &map(), false).unwrap();
        assert_eq!(once, twice);
    }
}
