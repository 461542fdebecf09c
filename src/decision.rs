use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Rank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Surrender,
    Hit,
    Split,
    Stand,
    Double,
    /// Reserved; never chosen by the solver.
    Race,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Surrender => "Surrender",
            Move::Hit => "Hit",
            Move::Split => "Split",
            Move::Stand => "Stand",
            Move::Double => "Double",
            Move::Race => "Race",
        };
        f.write_str(name)
    }
}

/// Best action for a position and its expected value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Expected profit in wager units.
    pub ev: f64,
    /// The next card the decision assumed, or `Rank::Any`.
    pub next_rank: Rank,
    pub action: Move,
}

impl Decision {
    pub fn new(ev: f64, next_rank: Rank, action: Move) -> Self {
        Self {
            ev,
            next_rank,
            action,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Next card: {}, Move: {}, EV: {:+.6}",
            self.next_rank, self.action, self.ev
        )
    }
}

/// Expected value of every action at a decision point.
/// `None` marks an action the position or the rules do not offer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionValues {
    pub stand: f64,
    pub hit: f64,
    pub double: Option<f64>,
    pub split: Option<f64>,
    pub surrender: Option<f64>,
}

impl ActionValues {
    /// Picks the action by priority Split > Double > Hit > Stand > Surrender.
    /// Each action must be strictly better than everything below it, so ties
    /// go to the more committal action only when it wins outright.
    pub fn best(&self) -> (Move, f64) {
        let double = self.double.unwrap_or(f64::NEG_INFINITY);
        let surrender = self.surrender.unwrap_or(f64::NEG_INFINITY);

        if let Some(split) = self.split {
            if split > double && split > self.hit && split > self.stand && split > surrender {
                return (Move::Split, split);
            }
        }
        if let Some(double) = self.double {
            if double > self.hit && double > self.stand && double > surrender {
                return (Move::Double, double);
            }
        }
        if self.hit > self.stand && self.hit > surrender {
            (Move::Hit, self.hit)
        } else if self.stand > surrender {
            (Move::Stand, self.stand)
        } else {
            (Move::Surrender, surrender)
        }
    }
}
