use std::collections::HashMap;

use super::dealer::DealerOutcomes;
use crate::shoe::fingerprint_follows;
use crate::{Decision, Rank, SubHand};

/// Everything about a finished player hand that settlement looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Standing {
    Bust,
    Blackjack,
    Total(u8),
}

impl Standing {
    pub(crate) fn of(player: &SubHand) -> Self {
        if player.is_bust() {
            Standing::Bust
        } else if player.is_blackjack() {
            Standing::Blackjack
        } else {
            Standing::Total(player.effective_total())
        }
    }
}

/// Memo key for the expected profit of a finished player hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ProfitKey {
    shoe: u128,
    wager: u32,
    next: Rank,
    dealer_total: u8,
    standing: Standing,
}

impl ProfitKey {
    pub(crate) fn new(shoe: u128, player: &SubHand, next: Rank, dealer: &SubHand) -> Self {
        Self {
            shoe,
            wager: player.wager(),
            next,
            dealer_total: dealer.effective_total(),
            standing: Standing::of(player),
        }
    }
}

/// Memo key for the best play of a subhand that can still draw. Card
/// order does not matter; the raw total, the presence of an ace and whether
/// the hand still has two cards decide everything that follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SearchKey {
    shoe: u128,
    total: u8,
    has_ace: bool,
    two_cards: bool,
    wager: u32,
    next: Rank,
    is_final: bool,
}

impl SearchKey {
    pub(crate) fn new(shoe: u128, player: &SubHand, next: Rank, is_final: bool) -> Self {
        Self {
            shoe,
            total: player.raw_total(),
            has_ace: player.cards().contains(&Rank::Ace),
            two_cards: player.is_fresh(),
            wager: player.wager(),
            next,
            is_final,
        }
    }
}

/// Memo key for the dealer's outcome distribution from a given position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct DealerKey {
    shoe: u128,
    total: u8,
    has_ace: bool,
    two_cards: bool,
    exposed: bool,
    next: Rank,
}

impl DealerKey {
    pub(crate) fn new(shoe: u128, dealer: &SubHand, next: Rank) -> Self {
        Self {
            shoe,
            total: dealer.raw_total(),
            has_ace: dealer.cards().contains(&Rank::Ace),
            two_cards: dealer.is_fresh(),
            exposed: dealer.is_exposed(),
            next,
        }
    }
}

/// Memoized values of one game. Presence is the map entry itself, so a
/// computed EV of exactly 0 is as reusable as any other.
#[derive(Debug, Default)]
pub(crate) struct MemoCache {
    profits: HashMap<ProfitKey, f64>,
    searches: HashMap<SearchKey, Decision>,
    dealer: HashMap<DealerKey, DealerOutcomes>,
    hits: u64,
    misses: u64,
}

impl MemoCache {
    pub(crate) fn profit(&mut self, key: &ProfitKey) -> Option<f64> {
        let found = self.profits.get(key).copied();
        self.count(found.is_some());
        found
    }

    pub(crate) fn search(&mut self, key: &SearchKey) -> Option<Decision> {
        let found = self.searches.get(key).copied();
        self.count(found.is_some());
        found
    }

    pub(crate) fn insert_search(&mut self, key: SearchKey, decision: Decision) {
        self.searches.insert(key, decision);
    }

    fn count(&mut self, hit: bool) {
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
    }

    pub(crate) fn insert_profit(&mut self, key: ProfitKey, ev: f64) {
        self.profits.insert(key, ev);
    }

    pub(crate) fn dealer(&self, key: &DealerKey) -> Option<DealerOutcomes> {
        self.dealer.get(key).copied()
    }

    pub(crate) fn insert_dealer(&mut self, key: DealerKey, outcomes: DealerOutcomes) {
        self.dealer.insert(key, outcomes);
    }

    pub(crate) fn hits(&self) -> u64 {
        self.hits
    }

    pub(crate) fn misses(&self) -> u64 {
        self.misses
    }

    pub(crate) fn len(&self) -> usize {
        self.profits.len() + self.searches.len() + self.dealer.len()
    }

    pub(crate) fn reset_counters(&mut self) {
        self.hits = 0;
        self.misses = 0;
    }

    /// Drops entries for shoes that can no longer come up once `shoe` is the
    /// live fingerprint. Search only deals, so those are the keys with fewer
    /// cards of some rank dealt.
    pub(crate) fn retain_reachable(&mut self, shoe: u128) {
        let reachable = |key: u128| fingerprint_follows(key, shoe);
        self.profits.retain(|key, _| reachable(key.shoe));
        self.searches.retain(|key, _| reachable(key.shoe));
        self.dealer.retain(|key, _| reachable(key.shoe));
    }

    pub(crate) fn clear(&mut self) {
        self.profits.clear();
        self.searches.clear();
        self.dealer.clear();
        self.reset_counters();
    }
}
