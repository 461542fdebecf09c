use crate::{PayoutRatio, SubHand};

const BUST: usize = 0;
const BLACKJACK: usize = 6;

/// Distribution of the dealer's finished hand.
/// [P(bust), P(17), P(18), P(19), P(20), P(21), P(blackjack)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DealerOutcomes([f64; 7]);

impl DealerOutcomes {
    /// The dealer has stopped drawing: one outcome with certainty.
    pub fn settled(dealer: &SubHand) -> Self {
        let slot = if dealer.is_blackjack() {
            BLACKJACK
        } else if dealer.is_bust() {
            BUST
        } else {
            debug_assert!(dealer.effective_total() >= 17, "dealer stopped below 17");
            (dealer.effective_total().max(17) - 16) as usize
        };
        let mut probs = [0.0; 7];
        probs[slot] = 1.0;
        Self(probs)
    }

    pub fn accumulate(&mut self, weight: f64, other: &DealerOutcomes) {
        for (acc, p) in self.0.iter_mut().zip(other.0.iter()) {
            *acc += weight * p;
        }
    }

    pub fn bust(&self) -> f64 {
        self.0[BUST]
    }

    pub fn blackjack(&self) -> f64 {
        self.0[BLACKJACK]
    }

    /// Probability the dealer finishes on `total` (17..=21) without a natural.
    pub fn total(&self, total: u8) -> f64 {
        match total {
            17..=21 => self.0[(total - 16) as usize],
            _ => 0.0,
        }
    }

    pub fn mass(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Expected profit of `player` against this distribution. Agrees with
    /// `SubHand::profit` outcome by outcome.
    pub fn settle(&self, player: &SubHand, payout: PayoutRatio) -> f64 {
        let wager = player.wager() as f64;
        if player.is_bust() {
            return -wager * self.mass();
        }
        if player.is_blackjack() {
            let no_natural: f64 = self.0[..BLACKJACK].iter().sum();
            return wager * payout.as_f64() * no_natural;
        }
        let total = player.effective_total();
        let mut ev = wager * (self.bust() - self.blackjack());
        for dealer in 17u8..=21 {
            let p = self.total(dealer);
            if total > dealer {
                ev += wager * p;
            } else if total < dealer {
                ev -= wager * p;
            }
        }
        ev
    }
}
