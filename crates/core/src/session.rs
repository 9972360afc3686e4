use alloy::primitives::Address;
use tracing::info;

use crate::error::ValidationError;

/// What the wallet-connection collaborator reports.
#[derive(Debug, Clone)]
pub enum WalletEvent<W> {
    Connected { account: Address, writer: Option<W> },
    Disconnected,
}

/// Connection state of the desk. `W` is the write capability handed over by the wallet.
#[derive(Debug, Clone)]
pub enum Session<W> {
    Disconnected,
    Connected {
        account: Address,
        /// `None` for watch-only connections.
        writer: Option<W>,
    },
}

impl<W> Default for Session<W> {
    fn default() -> Self {
        Session::Disconnected
    }
}

impl<W> Session<W> {
    pub fn is_connected(&self) -> bool {
        matches!(self, Session::Connected { .. })
    }

    pub fn account(&self) -> Option<Address> {
        match self {
            Session::Connected { account, .. } => Some(*account),
            Session::Disconnected => None,
        }
    }

    /// Account and writer needed to submit a swap.
    pub fn signing(&self) -> Result<(Address, &W), ValidationError> {
        match self {
            Session::Disconnected => Err(ValidationError::NotConnected),
            Session::Connected { writer: None, .. } => Err(ValidationError::NoSigner),
            Session::Connected {
                account,
                writer: Some(writer),
            } => Ok((*account, writer)),
        }
    }

    /// Applies a wallet event. Returns the newly connected account when the account changed.
    pub fn apply(&mut self, event: WalletEvent<W>) -> Option<Address> {
        match event {
            WalletEvent::Connected { account, writer } => {
                let changed = self.account() != Some(account);
                info!(%account, signer = writer.is_some(), "wallet connected");
                *self = Session::Connected { account, writer };
                changed.then_some(account)
            }
            WalletEvent::Disconnected => {
                if self.is_connected() {
                    info!("wallet disconnected");
                }
                *self = Session::Disconnected;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnected_session_cannot_sign() {
        let session: Session<()> = Session::default();
        assert!(!session.is_connected());
        assert_eq!(session.account(), None);
        assert_eq!(session.signing().unwrap_err(), ValidationError::NotConnected);
    }

    #[test]
    fn watch_only_session_has_no_signer() {
        let mut session: Session<()> = Session::default();
        let account = Address::repeat_byte(0x22);
        assert_eq!(
            session.apply(WalletEvent::Connected {
                account,
                writer: None
            }),
            Some(account)
        );
        assert_eq!(session.account(), Some(account));
        assert_eq!(session.signing().unwrap_err(), ValidationError::NoSigner);
    }

    #[test]
    fn reconnecting_same_account_is_not_a_change() {
        let mut session = Session::default();
        let account = Address::repeat_byte(0x33);
        session.apply(WalletEvent::Connected {
            account,
            writer: Some(1u8),
        });
        assert_eq!(
            session.apply(WalletEvent::Connected {
                account,
                writer: Some(2u8)
            }),
            None
        );
        assert_eq!(session.signing().unwrap(), (account, &2u8));

        assert_eq!(session.apply(WalletEvent::Disconnected), None);
        assert!(!session.is_connected());
    }
}
