//! Seams between the swap logic and the chain.
//!
//! [`ChainReader`] covers the read-only queries used to build balance snapshots, and
//! [`ChainWriter`] the dry-run and submission steps of a swap. [`crate::exchange::Exchange`]
//! implements both over an alloy provider; tests use the generated mocks.
use alloy::{
    primitives::{Address, TxHash, U256},
    rpc::types::TransactionRequest,
};
use async_trait::async_trait;
use color_eyre::eyre;

use crate::{asset::Token, route::SwapOperation};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Ledger balance of the native asset, in base units.
    async fn native_balance(&self, account: Address) -> eyre::Result<U256>;

    /// Balance the exchange contract reports for `token`, in base units.
    async fn token_balance(&self, token: Token, account: Address) -> eyre::Result<U256>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainWriter: Send + Sync {
    /// Dry-runs `operation` from `account` against current chain state.
    ///
    /// Succeeds only if the call would not revert, returning the request to submit.
    async fn simulate(
        &self,
        operation: &SwapOperation,
        account: Address,
    ) -> eyre::Result<PreparedSwap>;

    /// Sends a simulated request for inclusion and waits for its receipt.
    async fn submit(&self, prepared: PreparedSwap) -> eyre::Result<SwapReceipt>;
}

/// A chain-verified call request produced by [`ChainWriter::simulate`].
#[derive(Debug, Clone)]
pub struct PreparedSwap {
    pub operation: SwapOperation,
    pub account: Address,
    pub request: TransactionRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}
