//! anchor-utxo CLI entry point

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use anchor_utxo::commands::*;

#[derive(Parser, Debug)]
#[command(name="anchor-utxo", about="Classify addresses and prepare UTXOs as signing-ready inputs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Decode an address into network, address type and dust threshold
    DecodeAddress(DecodeAddressOpts),
    /// Derive an address of a given type from a public key
    DeriveAddress(DeriveAddressOpts),
    /// Fill pubkeys, check confirmations and emit signing inputs for a UTXO set
    PrepareInputs(PrepareInputsOpts),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::DecodeAddress(o) => run_decode_address(o),
        Commands::DeriveAddress(o) => run_derive_address(o),
        Commands::PrepareInputs(o) => run_prepare_inputs(o).await,
    }
}
