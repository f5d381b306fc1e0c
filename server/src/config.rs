use std::{net::SocketAddr, path::PathBuf};

use anyhow::{bail, Context};
use lut_manager_client::{
    network::{Cluster, NetworkConfig},
    workflow::ExtendOptions,
};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3006";

/// Server settings, read from the environment (and `.env`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub network: NetworkConfig,
    /// Keypair backing the wallet; without one the wallet is disconnected
    pub keypair_path: Option<PathBuf>,
    pub listen_addr: SocketAddr,
    pub extend_options: ExtendOptions,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| get(key).filter(|value| !value.trim().is_empty());

        let cluster = match get("LUT_NETWORK") {
            Some(name) => name.parse::<Cluster>().context("LUT_NETWORK")?,
            None => Cluster::default(),
        };
        let listen_addr = get("LUT_LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
            .parse()
            .context("LUT_LISTEN_ADDR")?;
        let dedup_candidates = match get("LUT_DEDUP_CANDIDATES") {
            Some(value) => parse_flag(&value).context("LUT_DEDUP_CANDIDATES")?,
            None => false,
        };

        Ok(Self {
            network: NetworkConfig::new(cluster, get("LUT_RPC_URL")),
            keypair_path: get("LUT_KEYPAIR").map(PathBuf::from),
            listen_addr,
            extend_options: ExtendOptions { dedup_candidates },
        })
    }
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected true or false, got {other:?}"),
    }
}
