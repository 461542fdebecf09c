use serde::{Deserialize, Serialize};

use crate::{Error, Rank};

/// Bits per rank in a shoe fingerprint.
const FINGERPRINT_BITS: u32 = 12;
const FINGERPRINT_MASK: u32 = (1 << FINGERPRINT_BITS) - 1;

/// Tolerance for a draw distribution summing to 1.
const DISTRIBUTION_TOLERANCE: f64 = 1e-9;

/// How draw probabilities are derived from the shoe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawModel {
    /// Live composition: every removed card shifts the odds.
    Depleting,
    /// Original composition, regardless of what has been dealt.
    Static,
}

/// Card counts by rank index (Ace=0 .. Ten=9).
/// Single deck: [4,4,4,4,4,4,4,4,4,16].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shoe {
    remaining: [u32; 10],
    remaining_total: u32,
    full: [u32; 10],
    full_total: u32,
    model: DrawModel,
}

impl Shoe {
    pub fn new(decks: u32) -> Self {
        let mut counts = [4 * decks; 10];
        counts[9] = 16 * decks;
        Self::from_counts(counts)
    }

    /// A shoe holding exactly `counts` (indexed Ace..Ten). The composition
    /// given here is what static draws and fingerprints measure against.
    pub fn from_counts(counts: [u32; 10]) -> Self {
        let total = counts.iter().sum();
        Self {
            remaining: counts,
            remaining_total: total,
            full: counts,
            full_total: total,
            model: DrawModel::Depleting,
        }
    }

    pub fn with_model(mut self, model: DrawModel) -> Self {
        self.model = model;
        self
    }

    pub fn set_model(&mut self, model: DrawModel) {
        self.model = model;
    }

    pub fn model(&self) -> DrawModel {
        self.model
    }

    pub fn remaining(&self, rank: Rank) -> u32 {
        rank.index().map_or(self.remaining_total, |i| self.remaining[i])
    }

    pub fn total(&self) -> u32 {
        self.remaining_total
    }

    /// Probability that the next card is `rank`.
    pub fn sample(&self, rank: Rank) -> Result<f64, Error> {
        let i = Self::slot(rank)?;
        match self.model {
            DrawModel::Depleting => {
                if self.remaining_total == 0 {
                    return Err(Error::ShoeExhausted(Rank::Any));
                }
                Ok((self.remaining[i] as f64 / self.remaining_total as f64).max(0.0))
            }
            DrawModel::Static => {
                if self.full_total == 0 {
                    return Err(Error::ShoeExhausted(Rank::Any));
                }
                Ok(self.full[i] as f64 / self.full_total as f64)
            }
        }
    }

    /// Draw probabilities for all ranks, in `Rank::ALL` order.
    pub fn distribution(&self) -> Result<[f64; 10], Error> {
        let mut probs = [0.0; 10];
        for (p, rank) in probs.iter_mut().zip(Rank::ALL) {
            *p = self.sample(rank)?;
        }
        let sum: f64 = probs.iter().sum();
        if (sum - 1.0).abs() > DISTRIBUTION_TOLERANCE {
            return Err(Error::ProbabilityUnderflow(sum));
        }
        Ok(probs)
    }

    pub fn remove(&mut self, rank: Rank) -> Result<(), Error> {
        let i = Self::slot(rank)?;
        if self.remaining[i] == 0 {
            return Err(Error::ShoeExhausted(rank));
        }
        self.remaining[i] -= 1;
        self.remaining_total -= 1;
        Ok(())
    }

    pub fn add(&mut self, rank: Rank) -> Result<(), Error> {
        let i = Self::slot(rank)?;
        if self.remaining[i] >= self.full[i] {
            return Err(Error::InvalidAction(format!(
                "cannot return a {rank} the shoe never held"
            )));
        }
        self.remaining[i] += 1;
        self.remaining_total += 1;
        Ok(())
    }

    /// Packs how many cards of each rank have left the shoe into 12-bit
    /// fields. Two shoes built from the same composition share a fingerprint
    /// exactly when their remaining counts agree (up to 4095 dealt per rank).
    pub fn fingerprint(&self) -> u128 {
        self.full
            .iter()
            .zip(self.remaining.iter())
            .enumerate()
            .fold(0u128, |acc, (i, (&full, &left))| {
                let dealt = (full - left) & FINGERPRINT_MASK;
                acc | (dealt as u128) << (i as u32 * FINGERPRINT_BITS)
            })
    }

    fn slot(rank: Rank) -> Result<usize, Error> {
        rank.index()
            .ok_or_else(|| Error::InvalidRank("the wildcard is not a card in the shoe".to_string()))
    }
}

/// Whether a shoe fingerprinted `later` can be reached from one fingerprinted
/// `earlier` by dealing more cards: no rank has fewer dealt.
pub(crate) fn fingerprint_follows(later: u128, earlier: u128) -> bool {
    let mask = FINGERPRINT_MASK as u128;
    (0..10).all(|i| {
        let shift = i * FINGERPRINT_BITS;
        ((later >> shift) & mask) >= ((earlier >> shift) & mask)
    })
}
