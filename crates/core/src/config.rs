use std::{str::FromStr, time::Duration};

use alloy::primitives::Address;
use color_eyre::eyre::{self, Context as _};
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::chain::Chain;

pub const CONFIG_FILE: &str = "coinswap.yaml";
pub const ENV_PREFIX: &str = "COINSWAP_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub chain_id: u64,

    /// RPC endpoint URL
    pub rpc_url: String,

    /// Address of the deployed exchange contract
    pub exchange_address: String,

    /// Hex private key of the trading account. Without it the desk is watch-only.
    #[serde(default)]
    pub private_key: Option<String>,

    /// Account to watch when no private key is configured
    #[serde(default)]
    pub account: Option<String>,

    /// How long to wait for a swap receipt, e.g. `"90s"` or `"2m"`
    #[serde(default = "default_confirmation_timeout")]
    pub confirmation_timeout: String,

    /// `tracing` filter directive used when `RUST_LOG` is unset
    #[serde(default)]
    pub log_level: Option<String>,
}

fn default_confirmation_timeout() -> String {
    "60s".to_string()
}

impl Config {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, figment::Error> {
        Self::extract(
            Figment::new()
                .merge(Yaml::file(CONFIG_FILE))
                .merge(Env::prefixed(ENV_PREFIX)),
        )
    }

    pub fn extract(figment: Figment) -> Result<Self, figment::Error> {
        figment.extract()
    }

    pub fn chain(&self) -> eyre::Result<Chain> {
        Chain::new(self.chain_id, &self.rpc_url, &self.exchange_address)
            .wrap_err("failed to parse chain info")
    }

    pub fn confirmation_timeout(&self) -> eyre::Result<Duration> {
        humantime::parse_duration(&self.confirmation_timeout).wrap_err_with(|| {
            format!(
                "invalid confirmation_timeout `{}`",
                self.confirmation_timeout
            )
        })
    }

    pub fn watch_account(&self) -> eyre::Result<Option<Address>> {
        self.account
            .as_deref()
            .map(|account| Address::from_str(account).wrap_err("failed to parse account address"))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
chain_id: 31337
rpc_url: http://127.0.0.1:8545
exchange_address: "0x5fbdb2315678afecb367f032d93f642f64180aa3"
account: "0x70997970c51812dc3a010c7d01b50e0d17dc79c8"
"#;

    #[test]
    fn extracts_yaml_with_defaults() {
        let config = Config::extract(Figment::new().merge(Yaml::string(YAML))).unwrap();

        assert_eq!(config.chain().unwrap(), Chain::anvil());
        assert_eq!(
            config.confirmation_timeout().unwrap(),
            Duration::from_secs(60)
        );
        assert!(config.private_key.is_none());
        assert_eq!(
            config.watch_account().unwrap(),
            Some(Address::from_str("0x70997970c51812dc3a010c7d01b50e0d17dc79c8").unwrap())
        );
    }

    #[test]
    fn rejects_bad_timeout() {
        let config = Config::extract(
            Figment::new()
                .merge(Yaml::string(YAML))
                .merge(Yaml::string("confirmation_timeout: soon")),
        )
        .unwrap();
        assert!(config.confirmation_timeout().is_err());
    }

    #[test]
    fn missing_required_fields_fail_extraction() {
        assert!(Config::extract(Figment::new().merge(Yaml::string("chain_id: 1"))).is_err());
    }
}
