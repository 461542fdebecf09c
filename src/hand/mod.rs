use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Move, PayoutRatio, Rank, SubHand};

/// Active index once no subhand can act any more.
pub const COMPLETE: usize = 2;

/// Where the player's hand stands in play, derived from the active subhand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandState {
    /// Nothing left to decide.
    Complete,
    /// An unsplit pair: every action including split is open.
    Doubles,
    /// Two cards on the active subhand: double is still open.
    Fresh,
    /// Only hit or stand remain.
    Open,
}

impl fmt::Display for HandState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandState::Complete => "Complete",
            HandState::Doubles => "Doubles",
            HandState::Fresh => "Fresh",
            HandState::Open => "Open",
        };
        f.write_str(name)
    }
}

/// The player's spot: one subhand, or two after a split, played in order.
///
/// Every mutation has an inverse for search backtracking. An inverse only
/// undoes the most recent mutation; the subhand it applies to is recovered
/// from the cards, so nested search frames can unwind in any depth.
#[derive(Debug, Clone, Copy)]
pub struct Hand {
    sub_hands: [SubHand; 2],
    len: usize,
    active: usize,
}

impl Hand {
    pub fn new(first: Rank, second: Rank) -> Result<Self, Error> {
        if first.is_any() || second.is_any() {
            return Err(Error::InvalidRank(
                "player cards must be known".to_string(),
            ));
        }
        let sub_hand = SubHand::new(first, second);
        let active = if sub_hand.effective_total() == 21 {
            COMPLETE
        } else {
            0
        };
        Ok(Self {
            sub_hands: [sub_hand, SubHand::default()],
            len: 1,
            active,
        })
    }

    pub fn state(&self) -> HandState {
        if self.is_complete() {
            return HandState::Complete;
        }
        if self.sub_hands[self.active].is_fresh() {
            if self.len == 1 && self.sub_hands[0].is_doubles() {
                HandState::Doubles
            } else {
                HandState::Fresh
            }
        } else {
            HandState::Open
        }
    }

    pub fn is_complete(&self) -> bool {
        self.active == COMPLETE
    }

    /// Index of the subhand being played, or `COMPLETE`.
    pub fn active(&self) -> usize {
        self.active
    }

    /// Number of subhands: 1, or 2 after a split.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn sub_hands(&self) -> &[SubHand] {
        &self.sub_hands[..self.len]
    }

    /// # Panics
    ///
    /// Panics if `index >= self.len()`; an unsplit hand only has subhand 0.
    pub fn sub_hand(&self, index: usize) -> &SubHand {
        &self.sub_hands()[index]
    }

    /// Checks that `action` is legal in the current state.
    pub fn check(&self, action: Move) -> Result<(), Error> {
        let state = self.state();
        let legal = match action {
            Move::Hit | Move::Stand => state != HandState::Complete,
            Move::Double => matches!(state, HandState::Fresh | HandState::Doubles),
            Move::Split => state == HandState::Doubles,
            Move::Surrender | Move::Race => false,
        };
        if legal {
            Ok(())
        } else {
            Err(Error::InvalidAction(format!(
                "cannot {action} while the hand is {state}"
            )))
        }
    }

    pub fn stand(&mut self) -> Result<(), Error> {
        self.check(Move::Stand)?;
        self.advance();
        Ok(())
    }

    /// Takes back a stand. On the first subhand nothing has been stood yet
    /// and the hand is left as it is.
    pub fn back_stand(&mut self) {
        if self.active == 0 {
            return;
        }
        self.active = self.last_stood();
    }

    /// Hits the active subhand. Reaching 21 or busting ends its turn.
    pub fn hit(&mut self, rank: Rank) -> Result<(), Error> {
        self.check(Move::Hit)?;
        let sub_hand = &mut self.sub_hands[self.active];
        sub_hand.hit(rank)?;
        if sub_hand.effective_total() >= 21 {
            self.advance();
        }
        Ok(())
    }

    /// Takes back the last hit. Without a drawn card the hand is left as it is.
    pub fn back_hit(&mut self) {
        let drawn = self.last_drawn();
        if self.sub_hands[drawn].is_fresh() {
            return;
        }
        self.active = drawn;
        self.sub_hands[drawn].back_hit();
    }

    pub fn double_down(&mut self, rank: Rank) -> Result<(), Error> {
        self.check(Move::Double)?;
        self.sub_hands[self.active].double_down(rank)?;
        self.advance();
        Ok(())
    }

    /// Takes back a double down. Without one the hand is left as it is.
    pub fn back_double_down(&mut self) {
        let drawn = self.last_drawn();
        if self.sub_hands[drawn].wager() < 2 {
            return;
        }
        self.active = drawn;
        self.sub_hands[drawn].back_double_down();
    }

    /// Splits the pair; `first` and `second` complete the two new subhands.
    pub fn split(&mut self, first: Rank, second: Rank) -> Result<(), Error> {
        self.check(Move::Split)?;
        let [left, right] = self.sub_hands[0].split(first, second)?;
        self.sub_hands = [left, right];
        self.len = 2;
        self.active = match (left.effective_total() >= 21, right.effective_total() >= 21) {
            (true, true) => COMPLETE,
            (true, false) => 1,
            _ => 0,
        };
        Ok(())
    }

    /// Rebuilds the pair. An unsplit hand is left as it is.
    pub fn back_split(&mut self) {
        if self.len != 2 {
            return;
        }
        let [first, second] = self.sub_hands;
        self.sub_hands[0].back_split(&first, &second);
        self.sub_hands[1] = SubHand::default();
        self.len = 1;
        self.active = 0;
    }

    pub fn profit(&self, dealer: &SubHand, payout: PayoutRatio) -> f64 {
        self.sub_hands()
            .iter()
            .map(|sub_hand| sub_hand.profit(dealer, payout))
            .sum()
    }

    fn advance(&mut self) {
        self.active = match self.active {
            0 if self.len == 2 => {
                if self.sub_hands[1].effective_total() >= 21 {
                    COMPLETE
                } else {
                    1
                }
            }
            _ => COMPLETE,
        };
    }

    /// Subhand that took the most recent hit or double. A second subhand
    /// only leaves two cards by being played, which happens after the first
    /// is finished.
    fn last_drawn(&self) -> usize {
        match self.active {
            0 => 0,
            1 if self.sub_hands[1].is_fresh() => 0,
            1 => 1,
            _ if self.len == 2 && !self.sub_hands[1].is_fresh() => 1,
            _ => 0,
        }
    }

    /// Subhand the most recent stand was taken on. Standing on the second
    /// subhand requires it to be under 21; at 21 or more it was skipped.
    fn last_stood(&self) -> usize {
        match self.active {
            1 => 0,
            _ if self.len == 2 && self.sub_hands[1].effective_total() < 21 => 1,
            _ => 0,
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, sub_hand) in self.sub_hands().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if i == self.active {
                write!(f, "A: ")?;
            }
            write!(f, "{sub_hand}")?;
        }
        write!(f, ")")
    }
}
