//! Chain environment selection.
//!
//! The selected environment is an explicit value handed to whatever needs an
//! RPC endpoint. Switching environments means building new clients from a
//! new [NetworkConfig]; nothing cached for the old environment carries over.

use std::{fmt, str::FromStr};

use solana_sdk::signature::Signature;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Cluster {
    #[default]
    Devnet,
    Testnet,
    MainnetBeta,
}

impl Cluster {
    pub const ALL: [Cluster; 3] = [Cluster::Devnet, Cluster::MainnetBeta, Cluster::Testnet];

    pub fn as_str(&self) -> &'static str {
        match self {
            Cluster::Devnet => "devnet",
            Cluster::Testnet => "testnet",
            Cluster::MainnetBeta => "mainnet-beta",
        }
    }

    /// Human readable name
    pub fn label(&self) -> &'static str {
        match self {
            Cluster::Devnet => "Devnet",
            Cluster::Testnet => "Testnet",
            Cluster::MainnetBeta => "Mainnet",
        }
    }

    /// The public RPC endpoint for the cluster
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown network: {0}")]
pub struct UnknownCluster(pub String);

impl FromStr for Cluster {
    type Err = UnknownCluster;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" => Ok(Cluster::Devnet),
            "testnet" => Ok(Cluster::Testnet),
            "mainnet" | "mainnet-beta" => Ok(Cluster::MainnetBeta),
            _ => Err(UnknownCluster(s.to_string())),
        }
    }
}

/// The selected environment and the endpoint derived from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkConfig {
    pub cluster: Cluster,
    /// Replaces the public endpoint for every cluster when set
    pub endpoint_override: Option<String>,
}

impl NetworkConfig {
    pub fn new(cluster: Cluster, endpoint_override: Option<String>) -> Self {
        Self {
            cluster,
            endpoint_override: endpoint_override.filter(|url| !url.trim().is_empty()),
        }
    }

    pub fn endpoint(&self) -> String {
        self.endpoint_override
            .clone()
            .unwrap_or_else(|| self.cluster.default_endpoint().to_string())
    }

    /// The same configuration pointed at another cluster
    pub fn with_cluster(&self, cluster: Cluster) -> Self {
        Self {
            cluster,
            endpoint_override: self.endpoint_override.clone(),
        }
    }

    /// Link to a transaction on the block explorer for this cluster
    pub fn explorer_url(&self, signature: &Signature) -> String {
        match self.cluster {
            Cluster::MainnetBeta => format!("https://solscan.io/tx/{signature}"),
            cluster => format!("https://solscan.io/tx/{signature}?cluster={cluster}"),
        }
    }
}
