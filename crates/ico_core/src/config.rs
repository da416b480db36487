use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::network::{Endpoint, Network};
use crate::units::to_nano;

/// Environment variable holding the deployer wallet mnemonic.
pub const MNEMONIC_ENV: &str = "ICO_MNEMONIC";

// ---------------------------------------------------------------------------
// Token metadata
// ---------------------------------------------------------------------------

/// Human-readable jetton metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenMetadata {
    pub name: String,
    pub description: String,
    pub symbol: String,
    pub image: String,
}

impl Default for TokenMetadata {
    fn default() -> Self {
        Self {
            name: "XXX".into(),
            description: "This is ton for ICO test smart contract".into(),
            symbol: "XXX".into(),
            image: "https://gateway.pinata.cloud/ipfs/QmUGvSSYZrCZuZW524Z5BrUW5eTnxknkYNAL3X7UXP5djW"
                .into(),
        }
    }
}

// ---------------------------------------------------------------------------
// DeployConfig
// ---------------------------------------------------------------------------

/// Deployment configuration stored as JSON.
///
/// Amounts are decimal coin strings (`"0.15"`) and are converted to nano units
/// by [`DeployConfig::amounts`]. The mnemonic is **never** written to the file;
/// it is read from [`MNEMONIC_ENV`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    #[serde(skip)]
    pub mnemonic: Option<String>,

    // Network
    pub network: Network,
    pub endpoint: Option<String>,
    pub request_timeout_secs: u64,

    // Deployer
    pub workchain: i8,
    pub deployer_address: Option<String>,

    // Contract artifacts
    pub contract_code: Option<PathBuf>,
    pub system_cell: Option<PathBuf>,

    // Token
    pub metadata: TokenMetadata,
    pub max_supply: String,
    pub initial_mint: String,

    // Sale
    pub price: String,
    pub start_time: u64,
    pub end_time: u64,
    pub hard_cap: String,

    // Per-message value allowance
    pub message_value: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            mnemonic: None,
            network: Network::Sandbox,
            endpoint: None,
            request_timeout_secs: crate::network::DEFAULT_TIMEOUT_SECS,
            workchain: 0,
            deployer_address: None,
            contract_code: None,
            system_cell: None,
            metadata: TokenMetadata::default(),
            max_supply: "1000000000000000".into(),
            initial_mint: "1000000000".into(),
            price: "0.01".into(),
            start_time: 0,
            end_time: 3 * 24 * 60 * 60,
            hard_cap: "12345678".into(),
            message_value: "0.15".into(),
        }
    }
}

/// Deployment amounts in nano units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amounts {
    pub max_supply: u128,
    pub initial_mint: u128,
    pub price: u128,
    pub hard_cap: u128,
    pub message_value: u128,
}

impl DeployConfig {
    /// Returns the base directory: `~/.ico-deploy/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".ico-deploy"))
    }

    /// Returns the logs directory: `~/.ico-deploy/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Load config from a specific file path and pick up the mnemonic from
    /// the environment.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config.mnemonic = std::env::var(MNEMONIC_ENV).ok().filter(|m| !m.trim().is_empty());
        info!(path = %path.display(), network = %config.network, "loaded deploy config");
        Ok(config)
    }

    /// Save config to a specific file path (the mnemonic is excluded).
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Resolve the node endpoint, preferring a custom URL when set.
    pub fn endpoint(&self) -> Result<Endpoint> {
        let endpoint = match &self.endpoint {
            Some(url) => Endpoint::custom(self.network, url.clone())?,
            None => Endpoint::default_for(self.network),
        };
        Ok(endpoint.with_timeout(self.request_timeout_secs))
    }

    /// Parse every amount field into nano units.
    pub fn amounts(&self) -> Result<Amounts> {
        Ok(Amounts {
            max_supply: to_nano(&self.max_supply).context("invalid max_supply")?,
            initial_mint: to_nano(&self.initial_mint).context("invalid initial_mint")?,
            price: to_nano(&self.price).context("invalid price")?,
            hard_cap: to_nano(&self.hard_cap).context("invalid hard_cap")?,
            message_value: to_nano(&self.message_value).context("invalid message_value")?,
        })
    }

    /// Check the fields that can be validated without touching the chain.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.workchain, 0 | -1) {
            bail!("config workchain must be 0 or -1, got {}", self.workchain);
        }
        self.endpoint()?;
        let amounts = self.amounts()?;
        if amounts.message_value == 0 {
            bail!("config message_value must be greater than zero");
        }
        if self.metadata.name.trim().is_empty() || self.metadata.symbol.trim().is_empty() {
            bail!("config metadata requires a name and a symbol");
        }
        if self.start_time > self.end_time {
            bail!(
                "config sale window is inverted: start_time {} > end_time {}",
                self.start_time,
                self.end_time
            );
        }
        Ok(())
    }

    /// Path of the compiled contract code, required for any deployment.
    pub fn contract_code_path(&self) -> Result<&Path> {
        self.contract_code
            .as_deref()
            .context("config is missing contract_code (path to the code BoC)")
    }
}
