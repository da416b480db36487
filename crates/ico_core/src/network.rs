use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported TON networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Sandbox,
    Testnet,
}

impl Network {
    /// Human-readable label for the network.
    pub fn label(&self) -> &'static str {
        match self {
            Network::Mainnet => "TON Mainnet",
            Network::Sandbox => "TON Sandbox",
            Network::Testnet => "TON Testnet",
        }
    }

    /// Default v4 HTTP API endpoint for this network.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://mainnet-v4.tonhubapi.com",
            Network::Sandbox => "https://sandbox-v4.tonhubapi.com",
            Network::Testnet => "https://testnet-v4.tonhubapi.com",
        }
    }

    /// Whether user-friendly addresses on this network carry the test-only flag.
    pub fn is_test_only(&self) -> bool {
        !matches!(self, Network::Mainnet)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Resolved endpoint for a node connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub network: Network,
    pub url: String,
    pub is_custom: bool,
    pub timeout_secs: u64,
}

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

impl Endpoint {
    /// Endpoint using the network's built-in URL.
    pub fn default_for(network: Network) -> Self {
        Self {
            network,
            url: network.default_endpoint().to_string(),
            is_custom: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Endpoint with a custom URL. Returns `Err` if the URL fails validation.
    pub fn custom(network: Network, url: String) -> anyhow::Result<Self> {
        if !validate_url(&url) {
            anyhow::bail!("invalid node endpoint URL: {url}");
        }
        Ok(Self {
            network,
            url: url.trim_end_matches('/').to_string(),
            is_custom: true,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Validate that a URL is well-formed and uses HTTP or HTTPS.
pub fn validate_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            (scheme == "http" || scheme == "https") && parsed.host().is_some()
        }
        Err(_) => false,
    }
}
