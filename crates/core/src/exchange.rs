use std::time::Duration;

use alloy::{
    contract::{CallBuilder, CallDecoder},
    network::{ReceiptResponse as _, TransactionBuilder as _},
    primitives::{Address, U256},
    providers::Provider,
    rpc::types::{TransactionReceipt, TransactionRequest},
    sol,
};
use async_trait::async_trait;
use color_eyre::eyre::{self, WrapErr as _, bail};
use tracing::{debug, info, instrument};

use crate::{
    asset::Token,
    client::{ChainReader, ChainWriter, PreparedSwap, SwapReceipt},
    route::SwapOperation,
};

// Tokens are addressed by name; all amounts are scaled by 10^18.
sol!(
    #[sol(rpc)]
    contract ICustomSwap {
        function getBalance(string tokenName, address account) external view returns (uint256);
        function swapEthToToken(string tokenName) external payable;
        function swapTokenToEth(string tokenName, uint256 amount) external;
        function swapTokenToToken(string fromToken, string toToken, uint256 amount) external;
    }
);

/// Client for the deployed exchange contract over any alloy provider.
///
/// Reads work with a plain provider. Submitting requires a provider built with a wallet.
#[derive(Debug, Clone)]
pub struct Exchange<P> {
    address: Address,
    provider: P,
    confirmation_timeout: Option<Duration>,
}

impl<P: Provider + Clone> Exchange<P> {
    pub fn new(address: Address, provider: P) -> Self {
        Self {
            address,
            provider,
            confirmation_timeout: None,
        }
    }

    /// Bounds how long [`ChainWriter::submit`] waits for a receipt.
    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = Some(timeout);
        self
    }

    fn contract(&self) -> ICustomSwap::ICustomSwapInstance<P> {
        ICustomSwap::new(self.address, self.provider.clone())
    }
}

#[async_trait]
impl<P: Provider + Clone> ChainReader for Exchange<P> {
    async fn native_balance(&self, account: Address) -> eyre::Result<U256> {
        self.provider
            .get_balance(account)
            .await
            .wrap_err("failed to fetch native balance")
    }

    async fn token_balance(&self, token: Token, account: Address) -> eyre::Result<U256> {
        self.contract()
            .getBalance(token.id().to_string(), account)
            .call()
            .await
            .wrap_err_with(|| format!("getBalance({token}) call failed"))
    }
}

#[async_trait]
impl<P: Provider + Clone> ChainWriter for Exchange<P> {
    #[instrument(skip(self), fields(exchange = %self.address))]
    async fn simulate(
        &self,
        operation: &SwapOperation,
        account: Address,
    ) -> eyre::Result<PreparedSwap> {
        let contract = self.contract();
        let request = match *operation {
            SwapOperation::NativeToToken { destination, value } => {
                dry_run(
                    contract
                        .swapEthToToken(destination.id().to_string())
                        .from(account)
                        .value(value),
                )
                .await
            }
            SwapOperation::TokenToNative { source, amount } => {
                dry_run(
                    contract
                        .swapTokenToEth(source.id().to_string(), amount)
                        .from(account),
                )
                .await
            }
            SwapOperation::TokenToToken {
                source,
                destination,
                amount,
            } => {
                dry_run(
                    contract
                        .swapTokenToToken(
                            source.id().to_string(),
                            destination.id().to_string(),
                            amount,
                        )
                        .from(account),
                )
                .await
            }
        }
        .wrap_err_with(|| format!("{} would revert", operation.function_name()))?;

        debug!(gas = ?request.gas, "simulation succeeded");

        Ok(PreparedSwap {
            operation: *operation,
            account,
            request,
        })
    }

    #[instrument(skip_all, fields(exchange = %self.address, operation = %prepared.operation))]
    async fn submit(&self, prepared: PreparedSwap) -> eyre::Result<SwapReceipt> {
        let pending = self
            .provider
            .send_transaction(prepared.request)
            .await
            .wrap_err("failed to send swap transaction")?;
        info!(tx_hash = %pending.tx_hash(), "swap transaction sent");

        let receipt = pending
            .with_timeout(self.confirmation_timeout)
            .get_receipt()
            .await
            .wrap_err("failed to fetch swap receipt")?;

        settle(&receipt)
    }
}

/// A mined receipt as a [`SwapReceipt`]. Reverted transactions are errors.
fn settle(receipt: &TransactionReceipt) -> eyre::Result<SwapReceipt> {
    if !receipt.status() {
        bail!(
            "swap transaction reverted (hash: {}, gas_used: {})",
            receipt.transaction_hash,
            receipt.gas_used
        );
    }

    Ok(SwapReceipt {
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number,
        gas_used: receipt.gas_used,
    })
}

/// `eth_call` then gas estimation, both against the latest block.
async fn dry_run<P, D>(call: CallBuilder<P, D>) -> eyre::Result<TransactionRequest>
where
    P: Provider,
    D: CallDecoder,
{
    call.call_raw().await.wrap_err("eth_call failed")?;
    let gas = call.estimate_gas().await.wrap_err("gas estimation failed")?;
    Ok(call.into_transaction_request().with_gas_limit(gas))
}
