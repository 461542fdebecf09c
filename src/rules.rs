use serde::{Deserialize, Serialize};

use crate::shoe::DrawModel;
use crate::Error;

/// Expected value of surrendering: half the wager is lost.
pub const SURRENDER_EV: f64 = -0.5;

/// Blackjack payout multiplier as a ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutRatio {
    pub numerator: u16,
    pub denominator: u16,
}

impl PayoutRatio {
    pub const THREE_TO_TWO: Self = Self {
        numerator: 3,
        denominator: 2,
    };
    pub const SIX_TO_FIVE: Self = Self {
        numerator: 6,
        denominator: 5,
    };
    pub const ONE_TO_ONE: Self = Self {
        numerator: 1,
        denominator: 1,
    };

    pub fn new(numerator: u16, denominator: u16) -> Result<Self, Error> {
        if denominator == 0 {
            return Err(Error::InvalidRules(
                "payout denominator cannot be zero".to_string(),
            ));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Profit per unit wager on a player blackjack.
    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

/// What `calculate_next_move` reports for a hand that can no longer act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletedHand {
    /// Report the blackjack payout without checking the dealer for a natural.
    BlackjackPayout,
    /// Settle every subhand against the dealer's outcome distribution.
    Settle,
}

/// House rules the solver plays under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HouseRules {
    /// Blackjack payout multiplier (commonly 3:2 or 6:5)
    pub blackjack_payout: PayoutRatio,

    /// Allow doubling after split
    pub double_after_split: bool,

    /// Allow surrender
    pub allow_surrender: bool,

    /// Dealer hits on soft 17
    pub dealer_hits_soft_17: bool,

    /// Draw probabilities follow the live shoe composition.
    /// Off: the shoe's original proportions are used throughout.
    pub track_depletion: bool,

    pub completed_hand: CompletedHand,
}

impl Default for HouseRules {
    fn default() -> Self {
        // 6:5 shoe game, H17 with surrender
        Self {
            blackjack_payout: PayoutRatio::SIX_TO_FIVE,
            double_after_split: false,
            allow_surrender: true,
            dealer_hits_soft_17: true,
            track_depletion: true,
            completed_hand: CompletedHand::BlackjackPayout,
        }
    }
}

impl HouseRules {
    /// 3:2 payout, dealer stands on soft 17, DAS and surrender
    pub fn classic() -> Self {
        Self {
            blackjack_payout: PayoutRatio::THREE_TO_TWO,
            double_after_split: true,
            allow_surrender: true,
            dealer_hits_soft_17: false,
            ..Self::default()
        }
    }

    /// European rules (no surrender, no doubling after split)
    pub fn european() -> Self {
        Self {
            blackjack_payout: PayoutRatio::THREE_TO_TWO,
            double_after_split: false,
            allow_surrender: false,
            dealer_hits_soft_17: false,
            ..Self::default()
        }
    }

    /// Default rules with composition-independent probabilities
    pub fn basic_strategy() -> Self {
        Self {
            track_depletion: false,
            ..Self::default()
        }
    }

    pub fn draw_model(&self) -> DrawModel {
        if self.track_depletion {
            DrawModel::Depleting
        } else {
            DrawModel::Static
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        PayoutRatio::new(
            self.blackjack_payout.numerator,
            self.blackjack_payout.denominator,
        )?;
        Ok(())
    }

    /// Parse a rule set from JSON. Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let rules: Self = serde_json::from_str(json)?;
        rules.validate()?;
        Ok(rules)
    }
}
