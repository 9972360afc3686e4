use color_eyre::eyre;
use thiserror::Error;

use crate::{asset::Asset, balances::BalanceSnapshot, route::SwapOperation};

/// Message shown to the user for any failed swap.
pub const SWAP_FAILED_MESSAGE: &str = "Swap failed. Please try again.";
/// Message shown to the user when balances could not be loaded.
pub const BALANCES_FAILED_MESSAGE: &str = "Failed to load balances";

/// A swap or session precondition that failed before anything was sent to the chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no account is connected")]
    NotConnected,

    #[error("the connected account has no signer")]
    NoSigner,

    #[error("a swap is already in flight")]
    Busy,

    #[error("no destination asset selected")]
    MissingDestination,

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("cannot swap {0} for itself")]
    SameAsset(Asset),

    #[error("there is no native to native conversion")]
    NativeToNative,
}

/// One or more balance lookups failed. Entries that did resolve are kept in `partial`.
#[derive(Debug, Error)]
#[error("failed to query balances for {}", .failed.iter().map(Asset::symbol).collect::<Vec<_>>().join(", "))]
pub struct QueryError {
    pub failed: Vec<Asset>,
    pub partial: BalanceSnapshot,
    #[source]
    pub source: eyre::Report,
}

#[derive(Debug, Error)]
pub enum SwapError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The dry run was rejected; nothing was submitted.
    #[error("simulation of {operation} failed")]
    Simulation {
        operation: SwapOperation,
        #[source]
        source: eyre::Report,
    },

    #[error("submission of {operation} failed")]
    Submission {
        operation: SwapOperation,
        #[source]
        source: eyre::Report,
    },
}

impl SwapError {
    /// Whether the failure happened after the chain was contacted.
    pub fn is_network(&self) -> bool {
        !matches!(self, SwapError::Validation(_))
    }

    pub fn user_message(&self) -> &'static str {
        SWAP_FAILED_MESSAGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Token;

    #[test]
    fn query_error_lists_failed_assets() {
        let err = QueryError {
            failed: vec![Asset::Native, Asset::Token(Token::CoinB)],
            partial: BalanceSnapshot::default(),
            source: eyre::eyre!("connection refused"),
        };
        assert_eq!(err.to_string(), "failed to query balances for ETH, CoinB");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn validation_errors_are_not_network_errors() {
        assert!(!SwapError::from(ValidationError::NotConnected).is_network());
        let sim = SwapError::Simulation {
            operation: SwapOperation::TokenToNative {
                source: Token::CoinA,
                amount: alloy::primitives::U256::from(1u64),
            },
            source: eyre::eyre!("execution reverted"),
        };
        assert!(sim.is_network());
        assert_eq!(sim.user_message(), SWAP_FAILED_MESSAGE);
    }
}
