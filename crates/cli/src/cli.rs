use std::collections::BTreeMap;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{self, Context as _, bail};
use coinswap_core::{
    asset::Asset,
    config::Config,
    desk::{Desk, SwapForm},
    orchestrator::SwapPhase,
};
use futures::StreamExt as _;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::wallet::{self, ExchangeClient};

type SwapDesk = Desk<ExchangeClient, ExchangeClient>;

#[derive(Parser)]
#[command(name = "coinswap", about)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Clone)]
pub(crate) struct SwapArgs {
    /// Asset to sell: ETH, CoinA, CoinB or CoinC
    #[arg(long)]
    from: Asset,

    /// Asset to buy
    #[arg(long)]
    to: Asset,

    /// Amount of `from` to sell, as a decimal string
    #[arg(long)]
    amount: String,
}

impl SwapArgs {
    fn form(&self) -> SwapForm {
        SwapForm {
            source: self.from,
            destination: Some(self.to),
            from_amount: self.amount.clone(),
            to_amount: String::new(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show balances of the configured account
    Balances {
        /// Print balances as JSON
        #[arg(long)]
        json: bool,
    },

    /// Simulate a swap without submitting it
    DryRun(SwapArgs),

    /// Simulate and submit a swap
    Swap(SwapArgs),
}

impl Cli {
    pub(crate) async fn run(
        self,
        config: Config,
        shutdown_token: CancellationToken,
    ) -> eyre::Result<()> {
        let chain = config.chain()?;
        info!(chain.name = %chain.metadata,
            chain.id = %chain.chain_id(),
            exchange = %chain.exchange_address,
            "🔗 Initialized chain info from config");

        let connection = wallet::connect(&config, &chain).await?;
        let Some(event) = connection.wallet else {
            bail!("no account configured, set `private_key` or `account`");
        };

        let mut desk: SwapDesk = Desk::new(connection.reader);
        let loaded = desk.on_wallet_event(event).await;

        match self.command {
            Commands::Balances { json } => {
                print_balances(&desk, json)?;
                loaded.wrap_err("balances are incomplete")
            }
            Commands::DryRun(args) => {
                desk.form = args.form();
                let prepared = desk.preview().await?;
                println!(
                    "{} from {} would succeed (gas limit: {})",
                    prepared.operation,
                    prepared.account,
                    prepared
                        .request
                        .gas
                        .map_or_else(|| "unknown".to_string(), |gas| gas.to_string())
                );
                Ok(())
            }
            Commands::Swap(args) => {
                if shutdown_token.is_cancelled() {
                    bail!("shutdown requested before the swap started");
                }
                desk.form = args.form();
                swap(&mut desk).await
            }
        }
    }
}

async fn swap(desk: &mut SwapDesk) -> eyre::Result<()> {
    let mut phases = WatchStream::new(desk.orchestrator().subscribe_phase());
    let phase_logger = tokio::spawn(async move {
        while let Some(phase) = phases.next().await {
            info!(%phase, "swap phase");
            if matches!(phase, SwapPhase::Failed) {
                break;
            }
        }
    });

    let result = desk.submit().await;
    phase_logger.abort();

    match result {
        Ok(report) => {
            println!(
                "{} confirmed in block {} (tx: {}, gas used: {})",
                report.operation,
                report
                    .receipt
                    .block_number
                    .map_or_else(|| "pending".to_string(), |block| block.to_string()),
                report.receipt.tx_hash,
                report.receipt.gas_used
            );
            if let Err(e) = &report.resync {
                warn!(error = %e, "balances not refreshed after swap");
            }
            if let Some(message) = desk.message() {
                eprintln!("{message}");
            }
            print_balances(desk, false)
        }
        Err(e) => {
            if let Some(message) = desk.message() {
                eprintln!("{message}");
            }
            Err(e).wrap_err("swap failed")
        }
    }
}

fn print_balances(desk: &SwapDesk, json: bool) -> eyre::Result<()> {
    let view = desk.balances();

    if json {
        let balances = Asset::ALL
            .into_iter()
            .map(|asset| (asset.symbol(), view.display(asset)))
            .collect::<BTreeMap<_, _>>();
        let output = serde_json::json!({
            "account": view.account,
            "stale": view.stale,
            "balances": balances,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).wrap_err("failed to serialize balances")?
        );
        return Ok(());
    }

    if let Some(message) = desk.message() {
        eprintln!("{message}");
    }
    for asset in Asset::ALL {
        println!("{:>6}: {}", asset.symbol(), desk.balance_of(asset));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinswap_core::asset::Token;

    #[test]
    fn parses_swap_arguments() {
        let cli = Cli::try_parse_from([
            "coinswap", "swap", "--from", "eth", "--to", "CoinB", "--amount", "0.5",
        ])
        .unwrap();

        let Commands::Swap(args) = cli.command else {
            panic!("expected swap command");
        };
        let form = args.form();
        assert_eq!(form.source, Asset::Native);
        assert_eq!(form.destination, Some(Token::CoinB.into()));
        assert_eq!(form.from_amount, "0.5");
    }

    #[test]
    fn rejects_unknown_assets() {
        assert!(
            Cli::try_parse_from([
                "coinswap", "dry-run", "--from", "DOGE", "--to", "CoinA", "--amount", "1",
            ])
            .is_err()
        );
    }

    #[test]
    fn balances_defaults_to_text_output() {
        let cli = Cli::try_parse_from(["coinswap", "balances"]).unwrap();
        assert!(matches!(cli.command, Commands::Balances { json: false }));
    }
}
