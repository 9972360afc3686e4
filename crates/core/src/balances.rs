use std::{collections::HashMap, sync::Arc};

use alloy::primitives::{Address, U256};
use futures::future::join_all;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::{amount::format_amount, asset::Asset, client::ChainReader, error::QueryError};

/// Point-in-time balances of one account, in base units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceSnapshot {
    balances: HashMap<Asset, U256>,
}

impl BalanceSnapshot {
    pub fn insert(&mut self, asset: Asset, balance: U256) -> Option<U256> {
        self.balances.insert(asset, balance)
    }

    pub fn get(&self, asset: Asset) -> Option<U256> {
        self.balances.get(&asset).copied()
    }

    /// Human decimal string for `asset`, if it was resolved.
    pub fn display(&self, asset: Asset) -> Option<String> {
        self.get(asset).map(format_amount)
    }

    /// Whether every known asset has an entry.
    pub fn is_complete(&self) -> bool {
        Asset::ALL.iter().all(|asset| self.balances.contains_key(asset))
    }

    pub fn missing(&self) -> Vec<Asset> {
        Asset::ALL
            .into_iter()
            .filter(|asset| !self.balances.contains_key(asset))
            .collect()
    }

    /// Resolved entries in [`Asset::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Asset, U256)> + '_ {
        Asset::ALL
            .into_iter()
            .filter_map(|asset| self.get(asset).map(|balance| (asset, balance)))
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

/// Fetches every asset's balance for `account`.
///
/// All lookups run concurrently and are all awaited. If any of them fails the whole refresh
/// fails with a [`QueryError`] that still carries the entries that did resolve; a failed lookup
/// is never replaced by a zero balance.
#[instrument(skip(reader))]
pub async fn refresh_balances<R>(reader: &R, account: Address) -> Result<BalanceSnapshot, QueryError>
where
    R: ChainReader + ?Sized,
{
    let lookups = Asset::ALL.map(|asset| async move {
        let balance = match asset {
            Asset::Native => reader.native_balance(account).await,
            Asset::Token(token) => reader.token_balance(token, account).await,
        };
        (asset, balance)
    });

    let mut snapshot = BalanceSnapshot::default();
    let mut failed = Vec::new();
    let mut first_error = None;

    for (asset, balance) in join_all(lookups).await {
        match balance {
            Ok(balance) => {
                debug!(%asset, %balance, "fetched balance");
                snapshot.insert(asset, balance);
            }
            Err(e) => {
                warn!(%asset, error = %e, "balance lookup failed");
                failed.push(asset);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        None => Ok(snapshot),
        Some(source) => Err(QueryError {
            failed,
            partial: snapshot,
            source,
        }),
    }
}

/// What the desk currently shows for the connected account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceView {
    /// Account the balances belong to. `None` while disconnected.
    pub account: Option<Address>,
    /// Latest complete snapshot, if any refresh has succeeded.
    pub snapshot: Option<Arc<BalanceSnapshot>>,
    /// Set when the most recent refresh failed and `snapshot` may be out of date.
    pub stale: bool,
}

impl BalanceView {
    pub fn display(&self, asset: Asset) -> Option<String> {
        self.snapshot.as_ref().and_then(|snapshot| snapshot.display(asset))
    }
}

/// What a [`BalanceBook::refresh`] did with a successful snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    Published,
    /// The account stopped being tracked while the lookups ran; nothing was published.
    Dropped,
}

/// Holds the authoritative balances for the tracked account.
///
/// Refreshes may overlap; whichever completes last is published. Results for an account that is
/// no longer tracked are dropped.
#[derive(Debug)]
pub struct BalanceBook {
    view_tx: watch::Sender<BalanceView>,
}

impl Default for BalanceBook {
    fn default() -> Self {
        Self::new()
    }
}

impl BalanceBook {
    pub fn new() -> Self {
        let (view_tx, _) = watch::channel(BalanceView::default());
        Self { view_tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<BalanceView> {
        self.view_tx.subscribe()
    }

    pub fn view(&self) -> BalanceView {
        self.view_tx.borrow().clone()
    }

    /// Starts tracking `account`, discarding balances of any previous account.
    pub fn track(&self, account: Address) {
        self.view_tx.send_replace(BalanceView {
            account: Some(account),
            snapshot: None,
            stale: false,
        });
    }

    /// Forgets the tracked account; all balances become unknown.
    pub fn clear(&self) {
        self.view_tx.send_replace(BalanceView::default());
    }

    /// Refreshes the balances of `account` and publishes the result if it is still tracked.
    ///
    /// On failure the previous snapshot is kept and marked stale.
    pub async fn refresh<R>(&self, reader: &R, account: Address) -> Result<Refresh, QueryError>
    where
        R: ChainReader + ?Sized,
    {
        let result = refresh_balances(reader, account).await;

        let published = self.view_tx.send_if_modified(|view| {
            if view.account != Some(account) {
                debug!(%account, "dropping balances of an account that is no longer tracked");
                return false;
            }
            match &result {
                Ok(snapshot) => {
                    view.snapshot = Some(Arc::new(snapshot.clone()));
                    view.stale = false;
                }
                Err(_) => view.stale = true,
            }
            true
        });

        match result {
            Ok(_) if !published => Ok(Refresh::Dropped),
            Ok(snapshot) => {
                info!(%account, assets = snapshot.len(), "balances refreshed");
                Ok(Refresh::Published)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        amount::units,
        asset::Token,
        client::MockChainReader,
    };
    use color_eyre::eyre::eyre;
    use mockall::predicate::eq;

    fn account() -> Address {
        Address::repeat_byte(0x11)
    }

    fn healthy_reader() -> MockChainReader {
        let mut reader = MockChainReader::new();
        reader
            .expect_native_balance()
            .with(eq(account()))
            .returning(|_| Ok(units(3)));
        reader
            .expect_token_balance()
            .returning(|token, _| {
                Ok(match token {
                    Token::CoinA => units(10),
                    Token::CoinB => units(20),
                    Token::CoinC => U256::ZERO,
                })
            });
        reader
    }

    #[tokio::test]
    async fn refresh_covers_every_asset() {
        let reader = healthy_reader();

        let snapshot = refresh_balances(&reader, account()).await.unwrap();

        assert!(snapshot.is_complete());
        assert_eq!(snapshot.get(Asset::Native), Some(units(3)));
        assert_eq!(snapshot.display(Token::CoinB.into()).as_deref(), Some("20"));
        assert_eq!(snapshot.display(Token::CoinC.into()).as_deref(), Some("0"));
        assert_eq!(
            snapshot.iter().map(|(asset, _)| asset).collect::<Vec<_>>(),
            Asset::ALL.to_vec()
        );
    }

    #[tokio::test]
    async fn single_failure_fails_the_refresh_without_zero_substitution() {
        let mut reader = MockChainReader::new();
        reader.expect_native_balance().returning(|_| Ok(units(1)));
        reader.expect_token_balance().returning(|token, _| match token {
            Token::CoinB => Err(eyre!("execution reverted")),
            _ => Ok(units(7)),
        });

        let err = refresh_balances(&reader, account()).await.unwrap_err();

        assert_eq!(err.failed, vec![Asset::Token(Token::CoinB)]);
        assert_eq!(err.partial.get(Token::CoinB.into()), None);
        assert_eq!(err.partial.missing(), vec![Asset::Token(Token::CoinB)]);
        assert_eq!(err.partial.get(Asset::Native), Some(units(1)));
        assert!(!err.partial.is_complete());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot_and_marks_it_stale() {
        let book = BalanceBook::new();
        book.track(account());
        book.refresh(&healthy_reader(), account()).await.unwrap();
        let before = book.view().snapshot.unwrap();

        let mut failing = MockChainReader::new();
        failing
            .expect_native_balance()
            .returning(|_| Err(eyre!("connection refused")));
        failing.expect_token_balance().returning(|_, _| Ok(units(1)));
        assert!(book.refresh(&failing, account()).await.is_err());

        let view = book.view();
        assert!(view.stale);
        assert_eq!(view.snapshot.unwrap(), before);
    }

    #[tokio::test]
    async fn results_for_untracked_account_are_dropped() {
        let book = BalanceBook::new();
        let mut rx = book.subscribe();

        assert_eq!(
            book.refresh(&healthy_reader(), account()).await.unwrap(),
            Refresh::Dropped
        );
        assert!(!rx.has_changed().unwrap());
        assert_eq!(book.view(), BalanceView::default());

        book.track(account());
        assert_eq!(
            book.refresh(&healthy_reader(), account()).await.unwrap(),
            Refresh::Published
        );
        assert!(rx.has_changed().unwrap());
        assert_eq!(
            rx.borrow_and_update().display(Asset::Native).as_deref(),
            Some("3")
        );

        book.clear();
        assert_eq!(book.view().display(Asset::Native), None);
    }
}
