//! Prepare inputs command: enrich UTXOs, check confirmations, emit signing inputs
use std::sync::Arc;

use anyhow::*;

use crate::bitcoin_utils::*;
use crate::source::{default_esplora_url, BitcoinRpcSource, DataSource, EsploraSource};
use crate::types::*;
use crate::utxo::{prepare_utxo_inputs, utxos_to_inputs, PrepareOptions};

use super::parse_network;

#[derive(clap::Parser, Debug)]
pub struct PrepareInputsOpts {
    /// JSON array of UTXOs ({txid, vout, value, scriptPk, addressType, address, pubkey?})
    #[arg(long)] pub utxos_file: Option<String>,
    /// Format: "txid:vout:value_sat,txid:vout:value_sat,..." (requires --address)
    #[arg(long)] pub utxos: Option<String>,
    /// Owner of the --utxos entries
    #[arg(long)] pub address: Option<String>,
    /// JSON object mapping address -> hex pubkey, used for taproot UTXOs
    #[arg(long)] pub pubkeys: Option<String>,
    #[arg(long, default_value="mainnet")] pub network: String,

    // Confirmation source; Esplora at the public endpoint unless overridden
    #[arg(long)] pub esplora_url: Option<String>,
    #[arg(long)] pub rpc_url: Option<String>,
    #[arg(long)] pub rpc_user: Option<String>,
    #[arg(long)] pub rpc_password: Option<String>,

    #[arg(long)] pub require_confirmed: bool,
    #[arg(long)] pub require_pubkey: bool,
    #[arg(long, default_value_t=DEFAULT_CONFIRMATION_CONCURRENCY)] pub concurrency: usize,

    /// Write inputs here instead of stdout
    #[arg(long)] pub out: Option<String>,
}

pub async fn run_prepare_inputs(o: PrepareInputsOpts) -> Result<()> {
    let network = parse_network(&o.network)?;

    let utxos: Vec<Utxo> = if let Some(path) = &o.utxos_file {
        let json = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
        serde_json::from_str(&json).with_context(|| format!("parsing {path}"))?
    } else if let Some(csv) = &o.utxos {
        let address = o.address.as_deref().context("--utxos requires --address")?;
        parse_utxos(csv, address, network)?
    } else {
        bail!("Must provide either --utxos-file or --utxos with --address");
    };
    ensure!(!utxos.is_empty(), "No UTXOs to prepare");
    eprintln!("Loaded {} UTXO(s)", utxos.len());

    for u in &utxos {
        if !u.address_type.is_supported_from() {
            eprintln!("  warning: {}:{} is {}, which cannot fund a transaction", u.txid, u.vout, u.address_type);
        }
    }

    let pubkey_map: Option<AddressToPubkeyMap> = match &o.pubkeys {
        Some(path) => {
            let json = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            Some(serde_json::from_str(&json).with_context(|| format!("parsing {path}"))?)
        }
        None => None,
    };

    let source: Arc<dyn DataSource> = if let Some(rpc_url) = &o.rpc_url {
        let mut rpc = BitcoinRpcSource::new(rpc_url.clone());
        if let Some(user) = &o.rpc_user {
            rpc = rpc.with_auth(user.clone(), o.rpc_password.clone().unwrap_or_default());
        }
        Arc::new(rpc)
    } else {
        let base = o.esplora_url.clone().unwrap_or_else(|| default_esplora_url(network).to_string());
        Arc::new(EsploraSource::new(base))
    };

    let options = PrepareOptions {
        require_pubkey: o.require_pubkey,
        require_confirmed: o.require_confirmed,
        concurrency: o.concurrency,
    };
    if options.require_confirmed {
        eprintln!("Checking confirmations (up to {} at a time)...", options.concurrency.max(1));
    }

    let prepared = prepare_utxo_inputs(&utxos, source, pubkey_map.as_ref(), &options).await?;
    let inputs = utxos_to_inputs(&prepared)?;

    let total: u64 = inputs.iter().map(|i| i.data.witness_utxo.value).sum();
    let json = serde_json::to_string_pretty(&inputs)?;
    match &o.out {
        Some(path) => {
            std::fs::write(path, json)?;
            eprintln!("Wrote {} input(s) totaling {} sats to {}", inputs.len(), total, path);
        }
        None => {
            println!("{json}");
            eprintln!("Prepared {} input(s) totaling {} sats", inputs.len(), total);
        }
    }
    Ok(())
}
