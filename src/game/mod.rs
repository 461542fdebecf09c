mod cache;
mod dealer;

pub use dealer::DealerOutcomes;

use cache::{DealerKey, MemoCache, ProfitKey, SearchKey};
use crate::{
    ActionValues, CompletedHand, Decision, Error, Hand, HandState, HouseRules, Move, Rank, Shoe,
    SubHand, SURRENDER_EV,
};

/// Counters for the latest query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Profit and subhand-search lookups answered from the memo.
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Weighted (first card, second card) combinations walked for split.
    pub split_branches: u64,
    /// Memo entries held by the game, across queries.
    pub cached_values: usize,
}

/// Ranks the next card can be, with their weights.
#[derive(Debug, Clone, Copy)]
struct Draws {
    ranks: [(Rank, f64); 10],
    len: usize,
}

impl Draws {
    fn known(rank: Rank) -> Self {
        let mut ranks = [(Rank::Any, 0.0); 10];
        ranks[0] = (rank, 1.0);
        Self { ranks, len: 1 }
    }

    fn from_distribution(probs: [f64; 10]) -> Self {
        let mut draws = Self {
            ranks: [(Rank::Any, 0.0); 10],
            len: 0,
        };
        for (rank, p) in Rank::ALL.into_iter().zip(probs) {
            if p > 0.0 {
                draws.ranks[draws.len] = (rank, p);
                draws.len += 1;
            }
        }
        draws
    }

    fn iter(&self) -> impl Iterator<Item = (Rank, f64)> + '_ {
        self.ranks[..self.len].iter().copied()
    }
}

/// Exact expected-value oracle for one player hand against one dealer upcard.
///
/// Search runs depth-first over the game's own shoe, dealer and hand: every
/// draw is applied, evaluated and undone in the same frame, so the state a
/// query starts from is the state it leaves behind.
#[derive(Debug)]
pub struct Game {
    shoe: Shoe,
    dealer: SubHand,
    hand: Hand,
    rules: HouseRules,
    cache: MemoCache,
    split_branches: u64,
}

impl Game {
    /// The shoe should already exclude the dealt cards; the caller decides
    /// which cards have left it.
    pub fn new(
        mut shoe: Shoe,
        hand: Hand,
        dealer: SubHand,
        rules: HouseRules,
    ) -> Result<Self, Error> {
        rules.validate()?;
        if dealer.is_exposed() || !dealer.is_fresh() || dealer.card(1).is_any() {
            return Err(Error::InvalidAction(format!(
                "dealer must show one upcard with the hole card hidden, got {dealer}"
            )));
        }
        shoe.set_model(rules.draw_model());
        log::debug!(
            "New game: player {} vs dealer {}, {} cards in shoe ({:?})",
            hand,
            dealer,
            shoe.total(),
            shoe.model()
        );
        Ok(Self {
            shoe,
            dealer,
            hand,
            rules,
            cache: MemoCache::default(),
            split_branches: 0,
        })
    }

    pub fn shoe(&self) -> &Shoe {
        &self.shoe
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub fn dealer(&self) -> &SubHand {
        &self.dealer
    }

    pub fn rules(&self) -> &HouseRules {
        &self.rules
    }

    pub fn stats(&self) -> SearchStats {
        SearchStats {
            cache_hits: self.cache.hits(),
            cache_misses: self.cache.misses(),
            split_branches: self.split_branches,
            cached_values: self.cache.len(),
        }
    }

    /// Memo entries live for the whole game. In depleting mode a real draw
    /// drops the ones keyed to earlier shoes; in static mode nothing goes
    /// stale and entries are only freed here.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.split_branches = 0;
    }

    // ── Real actions ──

    pub fn stand(&mut self) -> Result<(), Error> {
        self.hand.stand()
    }

    pub fn hit(&mut self, rank: Rank) -> Result<(), Error> {
        self.hand.check(Move::Hit)?;
        self.deal(&[rank], |hand| hand.hit(rank))
    }

    pub fn double_down(&mut self, rank: Rank) -> Result<(), Error> {
        self.hand.check(Move::Double)?;
        if self.hand.len() > 1 && !self.rules.double_after_split {
            return Err(Error::InvalidAction(
                "double after split is not allowed".to_string(),
            ));
        }
        self.deal(&[rank], |hand| hand.double_down(rank))
    }

    pub fn split(&mut self, first: Rank, second: Rank) -> Result<(), Error> {
        self.hand.check(Move::Split)?;
        self.deal(&[first, second], |hand| hand.split(first, second))
    }

    /// Takes `cards` out of the shoe and applies `action`. On failure the
    /// shoe is left as it was. On success, memo entries for shoes the search
    /// can no longer reach are dropped.
    fn deal(
        &mut self,
        cards: &[Rank],
        action: impl FnOnce(&mut Hand) -> Result<(), Error>,
    ) -> Result<(), Error> {
        for (i, &rank) in cards.iter().enumerate() {
            if let Err(err) = self.shoe.remove(rank) {
                for &dealt in &cards[..i] {
                    self.shoe.add(dealt)?;
                }
                return Err(err);
            }
        }
        if let Err(err) = action(&mut self.hand) {
            for &dealt in cards {
                self.shoe.add(dealt)?;
            }
            return Err(err);
        }
        if self.rules.track_depletion {
            let held = self.cache.len();
            self.cache.retain_reachable(self.shoe.fingerprint());
            log::debug!(
                "Dealt {:?}: dropped {} of {} memo entries",
                cards,
                held - self.cache.len(),
                held
            );
        }
        Ok(())
    }

    // ── Decisions ──

    /// Best move for the active subhand. `next` is the next card when it is
    /// known, or `Rank::Any`.
    pub fn calculate_next_move(&mut self, next: Rank) -> Result<Decision, Error> {
        if self.hand.is_complete() {
            self.reset_counters();
            let ev = match self.rules.completed_hand {
                CompletedHand::BlackjackPayout => self.rules.blackjack_payout.as_f64(),
                CompletedHand::Settle => self.settle_completed(next)?,
            };
            return Ok(Decision::new(ev, next, Move::Stand));
        }
        let values = self.evaluate(next)?;
        let (action, ev) = values.best();
        log::debug!("{} vs {}: {} ({:+.6})", self.hand, self.dealer, action, ev);
        Ok(Decision::new(ev, next, action))
    }

    /// Expected value of every action open to the active subhand.
    pub fn evaluate(&mut self, next: Rank) -> Result<ActionValues, Error> {
        let state = self.hand.state();
        if state == HandState::Complete {
            return Err(Error::InvalidAction(
                "the hand is complete; nothing to evaluate".to_string(),
            ));
        }
        self.reset_counters();

        let active = self.hand.active();
        let is_final = active + 1 == self.hand.len();
        let can_split = state == HandState::Doubles;
        let can_double = matches!(state, HandState::Fresh | HandState::Doubles)
            && (self.hand.len() == 1 || self.rules.double_after_split);

        let mut split = 0.0;
        let mut double = 0.0;
        let mut hit = 0.0;
        let draws = self.draws(next)?;
        for (rank, p) in draws.iter() {
            self.with_drawn(rank, |game| {
                if can_split {
                    split += p * game.split_value(rank)?;
                }
                if can_double {
                    game.hand.double_down(rank)?;
                    let doubled = *game.hand.sub_hand(active);
                    let ev = game.profit(&doubled, Rank::Any);
                    game.hand.back_double_down();
                    double += p * ev?;
                }
                game.hand.hit(rank)?;
                let mut played = *game.hand.sub_hand(active);
                let ev = game.search_sub_hand(&mut played, Rank::Any, is_final);
                game.hand.back_hit();
                hit += p * ev?.ev;
                Ok(())
            })?;
        }

        let player = *self.hand.sub_hand(active);
        let stand = self.profit(&player, if is_final { next } else { Rank::Any })?;

        let values = ActionValues {
            stand,
            hit,
            double: can_double.then_some(double),
            split: can_split.then_some(split),
            surrender: self.rules.allow_surrender.then_some(SURRENDER_EV),
        };
        log::debug!(
            "{} vs {} next {}: stand {:+.6} hit {:+.6} double {:?} split {:?}",
            self.hand,
            self.dealer,
            next,
            values.stand,
            values.hit,
            values.double,
            values.split
        );
        log::trace!("{:?}", self.stats());
        Ok(values)
    }

    /// Optimal play of a single subhand from here on, without split.
    /// `is_final` says whether it is the last subhand to act, the only one
    /// whose stand passes a known next card on to the dealer.
    pub fn search_sub_hand(
        &mut self,
        player: &mut SubHand,
        next: Rank,
        is_final: bool,
    ) -> Result<Decision, Error> {
        let key = SearchKey::new(self.shoe_key(), player, next, is_final);
        if let Some(decision) = self.cache.search(&key) {
            return Ok(decision);
        }
        let decision = self.play_sub_hand(player, next, is_final)?;
        self.cache.insert_search(key, decision);
        Ok(decision)
    }

    fn play_sub_hand(
        &mut self,
        player: &mut SubHand,
        next: Rank,
        is_final: bool,
    ) -> Result<Decision, Error> {
        let stand = self.profit(player, if is_final { next } else { Rank::Any })?;
        if player.effective_total() >= 21 {
            return Ok(Decision::new(stand, next, Move::Stand));
        }

        let draws = self.draws(next)?;
        let mut double = None;
        if self.rules.double_after_split && player.is_fresh() {
            let mut ev = 0.0;
            for (rank, p) in draws.iter() {
                ev += p * self.with_drawn(rank, |game| {
                    player.double_down(rank)?;
                    let profit = game.profit(&*player, Rank::Any);
                    player.back_double_down();
                    profit
                })?;
            }
            double = Some(ev);
        }

        let mut hit = 0.0;
        for (rank, p) in draws.iter() {
            hit += p * self.with_drawn(rank, |game| {
                player.hit(rank)?;
                let ev = if player.is_bust() {
                    game.profit(&*player, Rank::Any)
                } else {
                    game.search_sub_hand(&mut *player, Rank::Any, is_final)
                        .map(|decision| decision.ev)
                };
                player.back_hit();
                ev
            })?;
        }

        Ok(match double {
            Some(double) if double > stand && double > hit => {
                Decision::new(double, Rank::Any, Move::Double)
            }
            _ if stand > hit => Decision::new(stand, next, Move::Stand),
            _ => Decision::new(hit, Rank::Any, Move::Hit),
        })
    }

    /// Value of splitting with `first` completing the first subhand, over
    /// every card that can complete the second.
    fn split_value(&mut self, first: Rank) -> Result<f64, Error> {
        let mut ev = 0.0;
        let draws = self.draws(Rank::Any)?;
        for (second, q) in draws.iter() {
            ev += q * self.with_drawn(second, |game| {
                game.hand.split(first, second)?;
                let mut left = *game.hand.sub_hand(0);
                let mut right = *game.hand.sub_hand(1);
                let value = game.play_split(&mut left, &mut right);
                game.hand.back_split();
                game.split_branches += 1;
                value
            })?;
        }
        Ok(ev)
    }

    fn play_split(&mut self, left: &mut SubHand, right: &mut SubHand) -> Result<f64, Error> {
        let left = self.search_sub_hand(left, Rank::Any, false)?.ev;
        let right = self.search_sub_hand(right, Rank::Any, false)?.ev;
        Ok(left + right)
    }

    fn settle_completed(&mut self, next: Rank) -> Result<f64, Error> {
        let hand = self.hand;
        let last = hand.len() - 1;
        let mut ev = 0.0;
        for (i, sub_hand) in hand.sub_hands().iter().enumerate() {
            ev += self.profit(sub_hand, if i == last { next } else { Rank::Any })?;
        }
        Ok(ev)
    }

    // ── Dealer resolution ──

    /// Memoized expected profit of a finished player subhand.
    pub fn profit(&mut self, player: &SubHand, next: Rank) -> Result<f64, Error> {
        let key = ProfitKey::new(self.shoe_key(), player, next, &self.dealer);
        if let Some(ev) = self.cache.profit(&key) {
            return Ok(ev);
        }
        let ev = self.resolve_dealer(player, next)?;
        self.cache.insert_profit(key, ev);
        Ok(ev)
    }

    /// Plays out the dealer against a finished player subhand and returns
    /// the player's expected profit.
    pub fn resolve_dealer(&mut self, player: &SubHand, next: Rank) -> Result<f64, Error> {
        let payout = self.rules.blackjack_payout;
        if player.is_bust() {
            return Ok(player.profit(&self.dealer, payout));
        }
        let outcomes = if next.is_any() {
            self.dealer_outcomes(Rank::Any)?
        } else {
            self.with_drawn(next, |game| game.dealer_outcomes(next))?
        };
        Ok(outcomes.settle(player, payout))
    }

    /// Final-outcome distribution of the dealer from its current cards.
    /// A known `next` is the dealer's first hit and must already be out of
    /// the shoe.
    fn dealer_outcomes(&mut self, next: Rank) -> Result<DealerOutcomes, Error> {
        let key = DealerKey::new(self.shoe_key(), &self.dealer, next);
        if let Some(outcomes) = self.cache.dealer(&key) {
            return Ok(outcomes);
        }

        let outcomes = if !self.dealer.is_exposed() {
            let mut outcomes = DealerOutcomes::default();
            let draws = self.draws(Rank::Any)?;
            for (hole, p) in draws.iter() {
                let branch = self.with_drawn(hole, |game| {
                    game.dealer.expose(hole)?;
                    let branch = game.dealer_outcomes(next);
                    game.dealer.back_expose();
                    branch
                })?;
                outcomes.accumulate(p, &branch);
            }
            outcomes
        } else if !self.dealer_must_hit() {
            DealerOutcomes::settled(&self.dealer)
        } else if !next.is_any() {
            self.dealer.hit(next)?;
            let outcomes = self.dealer_outcomes(Rank::Any);
            self.dealer.back_hit();
            outcomes?
        } else {
            let mut outcomes = DealerOutcomes::default();
            let draws = self.draws(Rank::Any)?;
            for (rank, p) in draws.iter() {
                let branch = self.with_drawn(rank, |game| {
                    game.dealer.hit(rank)?;
                    let branch = game.dealer_outcomes(Rank::Any);
                    game.dealer.back_hit();
                    branch
                })?;
                outcomes.accumulate(p, &branch);
            }
            outcomes
        };

        self.cache.insert_dealer(key, outcomes);
        Ok(outcomes)
    }

    fn dealer_must_hit(&self) -> bool {
        let total = self.dealer.effective_total();
        total < 17 || (total == 17 && self.dealer.is_soft() && self.rules.dealer_hits_soft_17)
    }

    // ── Search helpers ──

    fn draws(&self, next: Rank) -> Result<Draws, Error> {
        if next.is_any() {
            Ok(Draws::from_distribution(self.shoe.distribution()?))
        } else {
            Ok(Draws::known(next))
        }
    }

    /// Runs `f` with `rank` out of the shoe and puts it back afterwards,
    /// whether or not `f` succeeded. Static probabilities never look at the
    /// remaining counts, so the shoe is left alone then.
    fn with_drawn<T>(
        &mut self,
        rank: Rank,
        f: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        if !self.rules.track_depletion {
            return f(self);
        }
        self.shoe.remove(rank)?;
        let result = f(self);
        self.shoe.add(rank)?;
        result
    }

    fn shoe_key(&self) -> u128 {
        if self.rules.track_depletion {
            self.shoe.fingerprint()
        } else {
            0
        }
    }

    fn reset_counters(&mut self) {
        self.cache.reset_counters();
        self.split_branches = 0;
    }
}
