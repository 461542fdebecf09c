use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Card rank as far as blackjack totals care.
/// `Ten` pools 10, J, Q and K. `Any` is an unknown card (dealer hole card,
/// or "next card not known" in a query).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    Any,
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
}

impl Rank {
    /// The ten real ranks in ascending pip order.
    pub const ALL: [Rank; 10] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
    ];

    /// Pip value with the ace counted as 1. The wildcard counts 0.
    pub fn pip(&self) -> u8 {
        match self {
            Rank::Any => 0,
            Rank::Ace => 1,
            Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 9,
            Rank::Ten => 10,
        }
    }

    /// Slot in per-rank count arrays: Ace=0 .. Ten=9.
    pub fn index(&self) -> Option<usize> {
        match self {
            Rank::Any => None,
            _ => Some(self.pip() as usize - 1),
        }
    }

    pub fn from_pip(pip: u8) -> Option<Self> {
        match pip {
            0 => Some(Rank::Any),
            1..=10 => Some(Rank::ALL[pip as usize - 1]),
            _ => None,
        }
    }

    pub fn is_any(&self) -> bool {
        *self == Rank::Any
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::Any => write!(f, "?"),
            Rank::Ace => write!(f, "A"),
            other => write!(f, "{}", other.pip()),
        }
    }
}

impl FromStr for Rank {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "?" | "*" | "ANY" => Ok(Rank::Any),
            "A" | "ACE" | "1" | "11" => Ok(Rank::Ace),
            "T" | "J" | "Q" | "K" | "10" => Ok(Rank::Ten),
            other => other
                .parse::<u8>()
                .ok()
                .filter(|pip| (2..=9).contains(pip))
                .and_then(Rank::from_pip)
                .ok_or_else(|| Error::InvalidRank(s.to_string())),
        }
    }
}
