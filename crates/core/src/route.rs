use std::fmt::{self, Display};

use alloy::primitives::U256;

use crate::{
    amount::format_amount,
    asset::{Asset, Token},
    error::ValidationError,
};

/// What the user asked for: trade `amount` base units of `source` into `destination`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapIntent {
    pub source: Asset,
    pub destination: Asset,
    pub amount: U256,
}

impl SwapIntent {
    pub fn new(source: Asset, destination: Asset, amount: U256) -> Self {
        Self {
            source,
            destination,
            amount,
        }
    }

    /// Checks the intent before any chain call is made.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.source == self.destination {
            if self.source.is_native() {
                return Err(ValidationError::NativeToNative);
            }
            return Err(ValidationError::SameAsset(self.source));
        }
        if self.amount.is_zero() {
            return Err(ValidationError::ZeroAmount);
        }
        Ok(())
    }

    /// The contract operation for this intent, if one exists.
    pub fn operation(&self) -> Option<SwapOperation> {
        select_operation(self.source, self.destination, self.amount)
    }
}

/// One of the three conversion entry points exposed by the exchange contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOperation {
    /// Pay `value` of the native asset, receive `destination`.
    NativeToToken { destination: Token, value: U256 },
    /// Sell `amount` of `source` for the native asset.
    TokenToNative { source: Token, amount: U256 },
    TokenToToken {
        source: Token,
        destination: Token,
        amount: U256,
    },
}

impl SwapOperation {
    pub fn function_name(&self) -> &'static str {
        match self {
            SwapOperation::NativeToToken { .. } => "swapEthToToken",
            SwapOperation::TokenToNative { .. } => "swapTokenToEth",
            SwapOperation::TokenToToken { .. } => "swapTokenToToken",
        }
    }

    pub fn source(&self) -> Asset {
        match self {
            SwapOperation::NativeToToken { .. } => Asset::Native,
            SwapOperation::TokenToNative { source, .. }
            | SwapOperation::TokenToToken { source, .. } => Asset::Token(*source),
        }
    }

    pub fn destination(&self) -> Asset {
        match self {
            SwapOperation::TokenToNative { .. } => Asset::Native,
            SwapOperation::NativeToToken { destination, .. }
            | SwapOperation::TokenToToken { destination, .. } => Asset::Token(*destination),
        }
    }

    pub fn amount(&self) -> U256 {
        match self {
            SwapOperation::NativeToToken { value, .. } => *value,
            SwapOperation::TokenToNative { amount, .. }
            | SwapOperation::TokenToToken { amount, .. } => *amount,
        }
    }

    /// Native value attached to the transaction. Only native sales carry value.
    pub fn value(&self) -> U256 {
        match self {
            SwapOperation::NativeToToken { value, .. } => *value,
            _ => U256::ZERO,
        }
    }
}

impl Display for SwapOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({} {} -> {})",
            self.function_name(),
            format_amount(self.amount()),
            self.source(),
            self.destination()
        )
    }
}

/// Maps a source/destination pair onto the exchange entry point to call.
///
/// A native source always buys a token, a native destination always sells one, and anything
/// else is a token-to-token conversion. There is no operation for `(Native, Native)`; callers
/// reject it during validation.
pub fn select_operation(source: Asset, destination: Asset, amount: U256) -> Option<SwapOperation> {
    match (source, destination) {
        (Asset::Native, Asset::Token(destination)) => Some(SwapOperation::NativeToToken {
            destination,
            value: amount,
        }),
        (Asset::Token(source), Asset::Native) => {
            Some(SwapOperation::TokenToNative { source, amount })
        }
        (Asset::Token(source), Asset::Token(destination)) => Some(SwapOperation::TokenToToken {
            source,
            destination,
            amount,
        }),
        (Asset::Native, Asset::Native) => None,
    }
}
