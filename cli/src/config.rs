//! Network configuration and optional config file

use anyhow::{Context, Result};
use phoenix_state::DEFAULT_LADDER_DEPTH;
use serde::Deserialize;
use solana_sdk::commitment_config::CommitmentConfig;
use std::fs;
use std::path::PathBuf;

/// Values read from `--config <path>`. Every field is optional.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub network: Option<String>,
    pub url: Option<String>,
    pub commitment: Option<String>,
    pub depth: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &str) -> Result<Self> {
        let expanded = shellexpand::full(path)
            .with_context(|| format!("Failed to expand config path: {}", path))?;
        let path = PathBuf::from(expanded.as_ref());
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// Settings given on the command line; they win over the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub network: Option<String>,
    pub url: Option<String>,
    pub commitment: Option<String>,
}

pub struct NetworkConfig {
    pub network: String,
    pub rpc_url: String,
    pub commitment: CommitmentConfig,
    /// Ladder depth when a command does not pass `--depth`
    pub depth: usize,
}

impl NetworkConfig {
    pub fn new(network: &str, rpc_url: Option<String>, commitment: &str) -> Result<Self> {
        let default_rpc = match network {
            "localnet" | "local" => "http://127.0.0.1:8899",
            "devnet" => "https://api.devnet.solana.com",
            "mainnet-beta" | "mainnet" => "https://api.mainnet-beta.solana.com",
            _ => anyhow::bail!(
                "Unknown network: {}. Use localnet, devnet, or mainnet-beta",
                network
            ),
        };

        Ok(Self {
            network: network.to_string(),
            rpc_url: rpc_url.unwrap_or_else(|| default_rpc.to_string()),
            commitment: parse_commitment(commitment)?,
            depth: DEFAULT_LADDER_DEPTH,
        })
    }

    /// Flags, then file, then defaults (`mainnet-beta`, `confirmed`).
    pub fn resolve(overrides: Overrides, file: FileConfig) -> Result<Self> {
        let network = overrides
            .network
            .or(file.network)
            .unwrap_or_else(|| "mainnet-beta".to_string());
        let commitment = overrides
            .commitment
            .or(file.commitment)
            .unwrap_or_else(|| "confirmed".to_string());

        let mut config = Self::new(&network, overrides.url.or(file.url), &commitment)?;
        if let Some(depth) = file.depth {
            config.depth = depth;
        }
        Ok(config)
    }
}

pub fn parse_commitment(commitment: &str) -> Result<CommitmentConfig> {
    match commitment {
        "processed" => Ok(CommitmentConfig::processed()),
        "confirmed" => Ok(CommitmentConfig::confirmed()),
        "finalized" => Ok(CommitmentConfig::finalized()),
        _ => anyhow::bail!(
            "Unknown commitment: {}. Use processed, confirmed, or finalized",
            commitment
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_network_urls() {
        let config = NetworkConfig::new("devnet", None, "confirmed").unwrap();
        assert_eq!(config.rpc_url, "https://api.devnet.solana.com");
        assert_eq!(config.depth, DEFAULT_LADDER_DEPTH);

        let config =
            NetworkConfig::new("localnet", Some("http://10.0.0.1:8899".into()), "finalized")
                .unwrap();
        assert_eq!(config.rpc_url, "http://10.0.0.1:8899");
        assert_eq!(config.commitment, CommitmentConfig::finalized());

        assert!(NetworkConfig::new("testnet-7", None, "confirmed").is_err());
        assert!(NetworkConfig::new("devnet", None, "rooted").is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let file = FileConfig {
            network: Some("devnet".into()),
            url: Some("http://file:8899".into()),
            commitment: Some("processed".into()),
            depth: Some(25),
        };
        let overrides = Overrides {
            url: Some("http://flag:8899".into()),
            ..Overrides::default()
        };
        let config = NetworkConfig::resolve(overrides, file).unwrap();
        assert_eq!(config.network, "devnet");
        assert_eq!(config.rpc_url, "http://flag:8899");
        assert_eq!(config.commitment, CommitmentConfig::processed());
        assert_eq!(config.depth, 25);
    }

    #[test]
    fn test_defaults() {
        let config = NetworkConfig::resolve(Overrides::default(), FileConfig::default()).unwrap();
        assert_eq!(config.network, "mainnet-beta");
        assert_eq!(config.rpc_url, "https://api.mainnet-beta.solana.com");
        assert_eq!(config.commitment, CommitmentConfig::confirmed());
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "network = \"devnet\"\ndepth = 5").unwrap();
        let loaded = FileConfig::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(
            loaded,
            FileConfig {
                network: Some("devnet".into()),
                depth: Some(5),
                ..FileConfig::default()
            }
        );
    }

    #[test]
    fn test_load_rejects_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "keypair = \"~/id.json\"").unwrap();
        assert!(FileConfig::load(file.path().to_str().unwrap()).is_err());
    }
}
