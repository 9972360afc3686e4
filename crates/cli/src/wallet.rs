//! Turns configuration into the exchange clients and the wallet connection.
use std::str::FromStr as _;

use alloy::{
    network::EthereumWallet,
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use color_eyre::eyre::{self, Context as _, bail};
use coinswap_core::{chain::Chain, config::Config, exchange::Exchange, session::WalletEvent};
use tracing::{info, instrument};

pub(crate) type ExchangeClient = Exchange<DynProvider>;

pub(crate) struct Connection {
    pub reader: ExchangeClient,
    /// `None` when neither a private key nor an account is configured.
    pub wallet: Option<WalletEvent<ExchangeClient>>,
}

#[instrument(skip_all, fields(chain = %chain))]
pub(crate) async fn connect(config: &Config, chain: &Chain) -> eyre::Result<Connection> {
    let url = Url::parse(&chain.rpc_url).wrap_err("failed to parse rpc url")?;

    let provider = ProviderBuilder::new().connect_http(url.clone());
    let remote_id = provider
        .get_chain_id()
        .await
        .wrap_err("failed to fetch chain id from rpc")?;
    if remote_id != chain.chain_id() {
        bail!(
            "rpc reports chain id {remote_id} but {} is configured",
            chain.chain_id()
        );
    }
    let reader = Exchange::new(chain.exchange_address, provider.erased());

    let wallet = match (&config.private_key, config.watch_account()?) {
        (Some(private_key), _) => {
            let signer = PrivateKeySigner::from_str(private_key.trim_start_matches("0x"))
                .wrap_err("failed to parse private key")?;
            let account = signer.address();
            let provider = ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer))
                .connect_http(url)
                .erased();
            let writer = Exchange::new(chain.exchange_address, provider)
                .with_confirmation_timeout(config.confirmation_timeout()?);
            info!(%account, "using signing account");
            Some(WalletEvent::Connected {
                account,
                writer: Some(writer),
            })
        }
        (None, Some(account)) => {
            info!(%account, "using watch-only account");
            Some(WalletEvent::Connected {
                account,
                writer: None,
            })
        }
        (None, None) => None,
    };

    Ok(Connection { reader, wallet })
}
