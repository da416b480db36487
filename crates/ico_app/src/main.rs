mod plan;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use ico_core::{DeployConfig, MNEMONIC_ENV, classify_error, from_nano, logging};
use ico_ton::{
    AddressExt, ContractCode, DeployParams, Deployer, DeploymentLocks, MnemonicSigner,
    NodeClient, OnchainMetadataEncoder, WalletV4,
};

#[derive(Parser, Debug)]
#[command(name = "ico-deploy", version, about = "Deploy and configure a jetton ICO contract")]
struct Cli {
    /// Path to the deployment config (JSON)
    #[arg(short, long, default_value = "deploy.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Derive the contract address and encode both messages, offline
    Plan,
    /// Sign and submit the deployment from the deployer wallet
    Deploy,
    /// Show the deployer wallet's seqno and balance
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match logging::init_logging() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("warning: file logging disabled: {e:#}");
            None
        }
    };
    info!("Starting ico-deploy v{}", env!("CARGO_PKG_VERSION"));

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let classified = classify_error(&e);
            error!(category = ?classified.category, "{e:#}");
            eprintln!("error: {e:#}");
            eprintln!("{}", classified.user_message);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Init { force } => init_config(&cli.config, force),
        Command::Plan => {
            let config = DeployConfig::load_from_path(&cli.config)?;
            let plan = plan::build_plan(&config).await?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
            Ok(())
        }
        Command::Deploy => {
            let config = DeployConfig::load_from_path(&cli.config)?;
            deploy(&config).await
        }
        Command::Status => {
            let config = DeployConfig::load_from_path(&cli.config)?;
            status(&config).await
        }
    }
}

fn init_config(path: &std::path::Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite",
            path.display()
        );
    }
    DeployConfig::default().save_to_path(path)?;
    info!(path = %path.display(), "Wrote default config");
    println!("Wrote {}", path.display());
    Ok(())
}

fn signer(config: &DeployConfig) -> Result<MnemonicSigner> {
    let phrase = config
        .mnemonic
        .as_deref()
        .with_context(|| format!("{MNEMONIC_ENV} is not set; deploy needs the wallet mnemonic"))?;
    MnemonicSigner::from_phrase(phrase)
        .with_context(|| format!("{MNEMONIC_ENV} does not hold a usable wallet mnemonic"))
}

async fn deploy(config: &DeployConfig) -> Result<()> {
    config.validate()?;
    let signer = signer(config)?;
    let address = plan::deployer_address(config)?;
    let params = DeployParams::from_config(config)?;
    let code = ContractCode::load(config.contract_code_path()?, config.system_cell.as_deref())?;
    let endpoint = config.endpoint()?;

    info!(
        network = %config.network,
        wallet = %address,
        endpoint = %endpoint.url,
        "Deploying from mnemonic wallet"
    );
    let wallet = WalletV4::new(address, NodeClient::new(&endpoint), signer);
    let deployer = Deployer::new(
        params,
        code,
        Arc::new(wallet),
        Arc::new(OnchainMetadataEncoder),
    )
    .with_locks(DeploymentLocks::new());

    let report = deployer.deploy().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    println!(
        "Contract: {}",
        report
            .address
            .to_friendly(true, config.network.is_test_only())
    );
    Ok(())
}

async fn status(config: &DeployConfig) -> Result<()> {
    let address = plan::deployer_address(config)?;
    let endpoint = config.endpoint()?;
    let node = NodeClient::new(&endpoint);

    let seqno = node
        .wallet_seqno(&address)
        .await
        .context("failed to fetch wallet seqno")?;
    let balance = node
        .balance(&address)
        .await
        .context("failed to fetch wallet balance")?;

    println!("Network: {}", config.network);
    println!("Endpoint: {}", endpoint.url);
    println!(
        "Wallet: {}",
        address.to_friendly(true, config.network.is_test_only())
    );
    println!("Seqno: {seqno}");
    println!("Balance: {} TON", from_nano(balance));
    Ok(())
}
