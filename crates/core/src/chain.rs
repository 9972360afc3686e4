use std::{
    fmt::{self, Display},
    str::FromStr,
};

use alloy::primitives::Address;
use color_eyre::eyre::{self, Context};

/// The network the exchange contract is deployed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chain {
    pub metadata: alloy_chains::Chain,
    pub rpc_url: String,
    pub exchange_address: Address,
}

impl Chain {
    pub fn new(chain_id: u64, rpc_url: &str, exchange_address: &str) -> eyre::Result<Self> {
        let exchange_address = Address::from_str(exchange_address)
            .wrap_err("failed to parse exchange contract address")?;

        Ok(Self {
            metadata: alloy_chains::Chain::from_id(chain_id),
            rpc_url: rpc_url.to_string(),
            exchange_address,
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.metadata.id()
    }

    #[cfg(test)]
    pub fn anvil() -> Self {
        Self {
            metadata: alloy_chains::Chain::from_named(alloy_chains::NamedChain::AnvilHardhat),
            rpc_url: "http://127.0.0.1:8545".to_string(),
            exchange_address: Address::from_str("0x5fbdb2315678afecb367f032d93f642f64180aa3")
                .expect("Couldn't convert to address"),
        }
    }
}

impl Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (id={})", self.metadata, self.chain_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_and_unknown_chains() {
        let chain = Chain::new(31337, "http://127.0.0.1:8545", "0x5FbDB2315678afecb367f032d93F642f64180aa3")
            .unwrap();
        assert_eq!(chain, Chain::anvil());
        assert!(chain.to_string().ends_with("(id=31337)"));

        let custom = Chain::new(424242, "http://rpc.example", "0x5fbdb2315678afecb367f032d93f642f64180aa3")
            .unwrap();
        assert_eq!(custom.chain_id(), 424242);
    }

    #[test]
    fn rejects_malformed_exchange_address() {
        assert!(Chain::new(1, "http://rpc.example", "0x1234").is_err());
    }
}
