//! The swap desk: one session, its form and the orchestrator driving it.
use alloy::primitives::Address;
use tracing::{debug, warn};

use crate::{
    amount::parse_amount,
    asset::Asset,
    balances::BalanceView,
    client::{ChainReader, ChainWriter, PreparedSwap},
    error::{BALANCES_FAILED_MESSAGE, QueryError, SwapError, ValidationError},
    orchestrator::{Orchestrator, SwapReport},
    route::SwapIntent,
    session::{Session, WalletEvent},
};

/// User input for the next swap. Amounts are kept as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwapForm {
    pub source: Asset,
    pub destination: Option<Asset>,
    pub from_amount: String,
    pub to_amount: String,
}

impl SwapForm {
    /// Reverses the direction: assets trade places and so do the amount fields.
    ///
    /// Without a destination only the amounts move.
    pub fn flip(&mut self) {
        if let Some(destination) = self.destination {
            self.destination = Some(self.source);
            self.source = destination;
        }
        std::mem::swap(&mut self.from_amount, &mut self.to_amount);
    }

    pub fn clear_amounts(&mut self) {
        self.from_amount.clear();
        self.to_amount.clear();
    }

    pub fn intent(&self) -> Result<SwapIntent, ValidationError> {
        let destination = self.destination.ok_or(ValidationError::MissingDestination)?;
        let amount = parse_amount(&self.from_amount)
            .map_err(|e| ValidationError::InvalidAmount(e.to_string()))?;
        Ok(SwapIntent::new(self.source, destination, amount))
    }

    /// Whether the form is complete enough to attempt a swap.
    pub fn can_submit(&self, connected: bool, busy: bool) -> bool {
        connected && !self.from_amount.trim().is_empty() && self.destination.is_some() && !busy
    }
}

pub struct Desk<R, W> {
    orchestrator: Orchestrator<R>,
    session: Session<W>,
    pub form: SwapForm,
    message: Option<&'static str>,
}

impl<R: ChainReader, W: ChainWriter> Desk<R, W> {
    pub fn new(reader: R) -> Self {
        Self {
            orchestrator: Orchestrator::new(reader),
            session: Session::Disconnected,
            form: SwapForm::default(),
            message: None,
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator<R> {
        &self.orchestrator
    }

    pub fn balances(&self) -> BalanceView {
        self.orchestrator.balances().view()
    }

    /// Last message meant for the user, cleared when the next swap starts.
    pub fn message(&self) -> Option<&'static str> {
        self.message
    }

    /// Balance of `asset` as shown to the user. Unknown balances read as `"0"`.
    pub fn balance_of(&self, asset: Asset) -> String {
        self.balances()
            .display(asset)
            .unwrap_or_else(|| "0".to_string())
    }

    pub fn can_submit(&self) -> bool {
        self.form
            .can_submit(self.session.is_connected(), self.orchestrator.is_busy())
    }

    /// Applies a wallet event, loading balances when a new account connects.
    pub async fn on_wallet_event(&mut self, event: WalletEvent<W>) -> Result<(), QueryError> {
        match self.session.apply(event) {
            Some(account) => {
                self.orchestrator.balances().track(account);
                self.refresh_account(account).await
            }
            None if !self.session.is_connected() => {
                self.orchestrator.balances().clear();
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Swaps what the form describes. Amounts are cleared only if the swap went through.
    pub async fn submit(&mut self) -> Result<SwapReport, SwapError> {
        self.message = None;
        let result = match self.form.intent() {
            Ok(intent) => self.orchestrator.execute_swap(&self.session, &intent).await,
            Err(e) => Err(e.into()),
        };

        match &result {
            Ok(report) => {
                self.form.clear_amounts();
                if report.resync.is_err() {
                    self.message = Some(BALANCES_FAILED_MESSAGE);
                }
            }
            Err(e) => {
                warn!(error = %e, "swap failed");
                self.message = Some(e.user_message());
            }
        }
        result
    }

    /// Simulates what the form describes without submitting it.
    pub async fn preview(&self) -> Result<PreparedSwap, SwapError> {
        let intent = self.form.intent()?;
        self.orchestrator.preview(&self.session, &intent).await
    }

    async fn refresh_account(&mut self, account: Address) -> Result<(), QueryError> {
        match self.orchestrator.refresh(account).await {
            Ok(_) => Ok(()),
            Err(e) => {
                debug!(error = %e, "recording balance failure for the user");
                self.message = Some(BALANCES_FAILED_MESSAGE);
                Err(e)
            }
        }
    }
}
