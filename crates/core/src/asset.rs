use std::{
    fmt::{self, Display},
    str::FromStr,
};

use color_eyre::eyre::{self, eyre};
use serde::{Deserialize, Serialize};

/// Tokens held by the exchange contract. Each is addressed on-chain by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Token {
    CoinA,
    CoinB,
    CoinC,
}

impl Token {
    pub const ALL: [Token; 3] = [Token::CoinA, Token::CoinB, Token::CoinC];

    /// Identifier passed to the exchange contract's `string` arguments.
    pub fn id(&self) -> &'static str {
        match self {
            Token::CoinA => "CoinA",
            Token::CoinB => "CoinB",
            Token::CoinC => "CoinC",
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Every unit the desk can trade. `Native` is the chain's base currency and has no token contract.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Asset {
    #[default]
    Native,
    Token(Token),
}

impl Asset {
    pub const ALL: [Asset; 4] = [
        Asset::Native,
        Asset::Token(Token::CoinA),
        Asset::Token(Token::CoinB),
        Asset::Token(Token::CoinC),
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Asset::Native => "ETH",
            Asset::Token(token) => token.id(),
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Asset::Native)
    }

    pub fn token(&self) -> Option<Token> {
        match self {
            Asset::Native => None,
            Asset::Token(token) => Some(*token),
        }
    }
}

impl From<Token> for Asset {
    fn from(token: Token) -> Self {
        Asset::Token(token)
    }
}

impl Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Asset {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Asset::ALL
            .into_iter()
            .find(|asset| asset.symbol().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                eyre!(
                    "unknown asset `{s}`, expected one of {}",
                    Asset::ALL.map(|asset| asset.symbol()).join(", ")
                )
            })
    }
}
