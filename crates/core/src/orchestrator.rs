//! The two-phase swap protocol.
//!
//! Every swap moves through `Validating -> Simulating -> Submitting -> Resyncing` and ends in
//! `Idle` on success or `Failed` otherwise. Submission is only reachable through a successful
//! simulation, and at most one swap is in flight per [`Orchestrator`].
use std::{
    fmt::{self, Display},
    sync::atomic::{AtomicBool, Ordering},
};

use alloy::primitives::Address;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::{
    balances::{BalanceBook, Refresh},
    client::{ChainReader, ChainWriter, PreparedSwap, SwapReceipt},
    error::{QueryError, SwapError, ValidationError},
    route::{SwapIntent, SwapOperation},
    session::Session,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwapPhase {
    #[default]
    Idle,
    Validating,
    Simulating,
    Submitting,
    Resyncing,
    Failed,
}

impl Display for SwapPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            SwapPhase::Idle => "idle",
            SwapPhase::Validating => "validating",
            SwapPhase::Simulating => "simulating",
            SwapPhase::Submitting => "submitting",
            SwapPhase::Resyncing => "resyncing",
            SwapPhase::Failed => "failed",
        };
        f.write_str(phase)
    }
}

/// Outcome of a submitted swap.
#[derive(Debug)]
pub struct SwapReport {
    pub operation: SwapOperation,
    pub receipt: SwapReceipt,
    /// The swap stands even if this failed; balances are then stale.
    pub resync: Result<Refresh, QueryError>,
}

impl SwapReport {
    /// Whether fresh balances were published after the swap.
    pub fn refreshed(&self) -> bool {
        matches!(self.resync, Ok(Refresh::Published))
    }
}

/// Runs swaps for one session and owns the balances they resync.
#[derive(Debug)]
pub struct Orchestrator<R> {
    reader: R,
    balances: BalanceBook,
    busy: AtomicBool,
    phase_tx: watch::Sender<SwapPhase>,
}

impl<R: ChainReader> Orchestrator<R> {
    pub fn new(reader: R) -> Self {
        let (phase_tx, _) = watch::channel(SwapPhase::Idle);
        Self {
            reader,
            balances: BalanceBook::new(),
            busy: AtomicBool::new(false),
            phase_tx,
        }
    }

    pub fn balances(&self) -> &BalanceBook {
        &self.balances
    }

    pub fn phase(&self) -> SwapPhase {
        *self.phase_tx.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<SwapPhase> {
        self.phase_tx.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Refreshes balances of `account` outside of a swap.
    pub async fn refresh(&self, account: Address) -> Result<Refresh, QueryError> {
        self.balances.refresh(&self.reader, account).await
    }

    /// Validates, simulates and submits `intent`, then resyncs balances.
    ///
    /// Fails without touching the chain if another swap is in flight or the session cannot
    /// sign. A rejected simulation is terminal: nothing is submitted and nothing is retried.
    #[instrument(skip_all, fields(source = %intent.source, destination = %intent.destination))]
    pub async fn execute_swap<W>(
        &self,
        session: &Session<W>,
        intent: &SwapIntent,
    ) -> Result<SwapReport, SwapError>
    where
        W: ChainWriter,
    {
        let in_flight = self.begin()?;
        let (account, writer, operation) = validate(&in_flight, session, intent)?;

        let prepared = simulate(&in_flight, writer, operation, account).await?;

        in_flight.enter(SwapPhase::Submitting);
        let receipt = writer.submit(prepared).await.map_err(|source| {
            warn!(%operation, error = %source, "swap submission failed");
            SwapError::Submission { operation, source }
        })?;
        info!(%operation, tx_hash = %receipt.tx_hash, block = ?receipt.block_number, "swap confirmed");

        in_flight.enter(SwapPhase::Resyncing);
        let resync = self.balances.refresh(&self.reader, account).await;
        if let Err(e) = &resync {
            warn!(error = %e, "swap confirmed but balance refresh failed");
        }

        in_flight.succeed();
        Ok(SwapReport {
            operation,
            receipt,
            resync,
        })
    }

    /// Validates and simulates `intent` without submitting it.
    #[instrument(skip_all, fields(source = %intent.source, destination = %intent.destination))]
    pub async fn preview<W>(
        &self,
        session: &Session<W>,
        intent: &SwapIntent,
    ) -> Result<PreparedSwap, SwapError>
    where
        W: ChainWriter,
    {
        let in_flight = self.begin()?;
        let (account, writer, operation) = validate(&in_flight, session, intent)?;
        let prepared = simulate(&in_flight, writer, operation, account).await?;
        in_flight.succeed();
        Ok(prepared)
    }

    fn begin(&self) -> Result<InFlight<'_>, ValidationError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                debug!("rejecting swap while another is in flight");
                ValidationError::Busy
            })?;
        Ok(InFlight {
            busy: &self.busy,
            phase_tx: &self.phase_tx,
            succeeded: false,
        })
    }
}

fn validate<'s, W>(
    in_flight: &InFlight<'_>,
    session: &'s Session<W>,
    intent: &SwapIntent,
) -> Result<(Address, &'s W, SwapOperation), ValidationError> {
    in_flight.enter(SwapPhase::Validating);
    let (account, writer) = session.signing()?;
    intent.validate()?;
    let operation = intent.operation().ok_or(ValidationError::NativeToNative)?;
    Ok((account, writer, operation))
}

async fn simulate<W: ChainWriter>(
    in_flight: &InFlight<'_>,
    writer: &W,
    operation: SwapOperation,
    account: Address,
) -> Result<PreparedSwap, SwapError> {
    in_flight.enter(SwapPhase::Simulating);
    writer
        .simulate(&operation, account)
        .await
        .map_err(|source| {
            warn!(%operation, error = %source, "swap simulation failed");
            SwapError::Simulation { operation, source }
        })
}

/// Holds the busy flag for one swap and settles the phase when dropped.
struct InFlight<'a> {
    busy: &'a AtomicBool,
    phase_tx: &'a watch::Sender<SwapPhase>,
    succeeded: bool,
}

impl InFlight<'_> {
    fn enter(&self, phase: SwapPhase) {
        debug!(%phase, "entering swap phase");
        self.phase_tx.send_replace(phase);
    }

    fn succeed(mut self) {
        self.succeeded = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let phase = if self.succeeded {
            SwapPhase::Idle
        } else {
            SwapPhase::Failed
        };
        self.phase_tx.send_replace(phase);
        self.busy.store(false, Ordering::Release);
    }
}
