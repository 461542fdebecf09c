use std::fmt;

use crate::{Error, PayoutRatio, Rank};

/// Card slots per hand. Drawing stops at an effective 21, so no legal hand
/// goes past twenty cards (ten aces, a two, eight more aces and a last card).
pub const MAX_CARDS: usize = 24;

/// One blackjack hand with reversible mutations.
///
/// The first slot holds the wildcard while a card is still hidden (the
/// dealer's hole card). Totals are kept raw, aces counting 1; the soft
/// adjustment is applied on read.
#[derive(Debug, Clone, Copy)]
pub struct SubHand {
    cards: [Rank; MAX_CARDS],
    len: usize,
    total: u8,
    aces: u8,
    wager: u32,
}

impl SubHand {
    /// A two-card hand. A wildcard second card is stored first, so
    /// `SubHand::new(up, Rank::Any)` is a dealer showing `up`.
    pub fn new(first: Rank, second: Rank) -> Self {
        let (first, second) = if second.is_any() {
            (second, first)
        } else {
            (first, second)
        };
        let mut cards = [Rank::Any; MAX_CARDS];
        cards[0] = first;
        cards[1] = second;
        Self {
            cards,
            len: 2,
            total: first.pip() + second.pip(),
            aces: Self::ace_count(first) + Self::ace_count(second),
            wager: 1,
        }
    }

    /// Dealer hand: `upcard` showing, hole card hidden.
    pub fn dealer(upcard: Rank) -> Self {
        Self::new(upcard, Rank::Any)
    }

    fn ace_count(rank: Rank) -> u8 {
        u8::from(rank == Rank::Ace)
    }

    fn require_card(rank: Rank) -> Result<(), Error> {
        if rank.is_any() {
            return Err(Error::InvalidRank(
                "a dealt card cannot be the wildcard".to_string(),
            ));
        }
        Ok(())
    }

    pub fn cards(&self) -> &[Rank] {
        &self.cards[..self.len]
    }

    /// # Panics
    ///
    /// Panics if `index >= self.len()`, like slice indexing.
    pub fn card(&self, index: usize) -> Rank {
        self.cards()[index]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn wager(&self) -> u32 {
        self.wager
    }

    /// Raw pip total, aces counted as 1.
    pub fn raw_total(&self) -> u8 {
        self.total
    }

    pub fn effective_total(&self) -> u8 {
        if self.is_soft() {
            self.total + 10
        } else {
            self.total
        }
    }

    pub fn expose(&mut self, rank: Rank) -> Result<(), Error> {
        Self::require_card(rank)?;
        if self.is_exposed() {
            return Err(Error::InvalidAction(
                "hand has no hidden card to expose".to_string(),
            ));
        }
        self.cards[0] = rank;
        self.total += rank.pip();
        self.aces += Self::ace_count(rank);
        Ok(())
    }

    pub fn back_expose(&mut self) {
        let hidden = self.cards[0];
        debug_assert!(!hidden.is_any(), "back_expose without expose");
        self.total -= hidden.pip();
        self.aces -= Self::ace_count(hidden);
        self.cards[0] = Rank::Any;
    }

    pub fn hit(&mut self, rank: Rank) -> Result<(), Error> {
        Self::require_card(rank)?;
        if self.len == MAX_CARDS {
            return Err(Error::InvalidAction(format!(
                "hand already holds {MAX_CARDS} cards"
            )));
        }
        self.cards[self.len] = rank;
        self.len += 1;
        self.total += rank.pip();
        self.aces += Self::ace_count(rank);
        Ok(())
    }

    /// Takes back the last hit. A two-card hand has nothing to take back and
    /// is left as it is.
    pub fn back_hit(&mut self) {
        if self.len <= 2 {
            return;
        }
        self.len -= 1;
        let rank = self.cards[self.len];
        self.cards[self.len] = Rank::Any;
        self.total -= rank.pip();
        self.aces -= Self::ace_count(rank);
    }

    pub fn double_down(&mut self, rank: Rank) -> Result<(), Error> {
        if !self.is_fresh() || self.wager != 1 {
            return Err(Error::InvalidAction(
                "double down needs a fresh two-card hand".to_string(),
            ));
        }
        self.hit(rank)?;
        self.wager *= 2;
        Ok(())
    }

    /// Takes back a double down. A hand that was not doubled is left as it is.
    pub fn back_double_down(&mut self) {
        if self.wager < 2 || self.len <= 2 {
            return;
        }
        self.back_hit();
        self.wager /= 2;
    }

    /// Splits a pair into two hands, each keeping one pair card and
    /// completed with `first` / `second`.
    pub fn split(&self, first: Rank, second: Rank) -> Result<[SubHand; 2], Error> {
        Self::require_card(first)?;
        Self::require_card(second)?;
        if !self.is_fresh() || !self.is_doubles() || !self.is_exposed() {
            return Err(Error::InvalidAction("only a pair can be split".to_string()));
        }
        Ok([
            SubHand::new(self.cards[0], first),
            SubHand::new(self.cards[1], second),
        ])
    }

    /// Rebuilds the pair that `split` produced `first` and `second` from.
    pub fn back_split(&mut self, first: &SubHand, second: &SubHand) {
        *self = SubHand::new(first.cards[0], second.cards[0]);
    }

    pub fn is_fresh(&self) -> bool {
        self.len == 2
    }

    pub fn is_exposed(&self) -> bool {
        !self.cards[0].is_any()
    }

    pub fn is_doubles(&self) -> bool {
        self.cards[0] == self.cards[1]
    }

    /// An ace is currently counted as 11.
    pub fn is_soft(&self) -> bool {
        self.aces > 0 && self.total <= 11
    }

    pub fn is_bust(&self) -> bool {
        self.total > 21
    }

    pub fn is_blackjack(&self) -> bool {
        self.len == 2 && self.effective_total() == 21
    }

    /// Settles this hand against a finished dealer hand, in wager units.
    pub fn profit(&self, dealer: &SubHand, payout: PayoutRatio) -> f64 {
        let wager = self.wager as f64;
        let player_bj = self.is_blackjack();
        let dealer_bj = dealer.is_blackjack();
        if player_bj && dealer_bj {
            return 0.0;
        }
        if player_bj {
            return wager * payout.as_f64();
        }
        if dealer_bj || self.is_bust() {
            return -wager;
        }
        if dealer.is_bust() {
            return wager;
        }
        match self.effective_total().cmp(&dealer.effective_total()) {
            std::cmp::Ordering::Greater => wager,
            std::cmp::Ordering::Equal => 0.0,
            std::cmp::Ordering::Less => -wager,
        }
    }
}

impl Default for SubHand {
    fn default() -> Self {
        Self::new(Rank::Any, Rank::Any)
    }
}

/// Coarse equality for collapsing memo keys: same wager and either the same
/// two-card total or both bust. Not card-for-card identity.
impl PartialEq for SubHand {
    fn eq(&self, other: &Self) -> bool {
        self.wager == other.wager
            && ((self.total == other.total && self.is_fresh() && other.is_fresh())
                || (self.is_bust() && other.is_bust()))
    }
}

impl fmt::Display for SubHand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, card) in self.cards().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{card}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn same_state(a: &SubHand, b: &SubHand) -> bool {
        a.cards() == b.cards()
            && a.raw_total() == b.raw_total()
            && a.is_soft() == b.is_soft()
            && a.wager() == b.wager()
    }

    #[test]
    fn test_new_hand_totals() {
        let hand = SubHand::new(Rank::Ten, Rank::Seven);
        assert_eq!(hand.effective_total(), 17);
        assert!(!hand.is_soft());
        assert_eq!(hand.wager(), 1);
    }

    #[test]
    fn test_soft_ace() {
        let hand = SubHand::new(Rank::Ace, Rank::Six);
        assert_eq!(hand.raw_total(), 7);
        assert_eq!(hand.effective_total(), 17);
        assert!(hand.is_soft());
    }

    #[test]
    fn test_hard_ace() {
        let mut hand = SubHand::new(Rank::Ace, Rank::Six);
        hand.hit(Rank::Nine).unwrap();
        assert_eq!(hand.effective_total(), 16);
        assert!(!hand.is_soft());
    }

    #[test]
    fn test_two_aces() {
        let mut hand = SubHand::new(Rank::Ace, Rank::Ace);
        assert_eq!(hand.effective_total(), 12);
        hand.hit(Rank::Nine).unwrap();
        assert_eq!(hand.effective_total(), 21);
        assert!(!hand.is_blackjack());
    }

    #[test]
    fn test_blackjack() {
        assert!(SubHand::new(Rank::Ace, Rank::Ten).is_blackjack());
        assert!(SubHand::new(Rank::Ten, Rank::Ace).is_blackjack());
        assert!(!SubHand::new(Rank::Ten, Rank::Nine).is_blackjack());
    }

    #[test]
    fn test_dealer_hides_first_card() {
        let dealer = SubHand::dealer(Rank::Six);
        assert!(!dealer.is_exposed());
        assert_eq!(dealer.cards(), &[Rank::Any, Rank::Six]);
        assert_eq!(dealer.effective_total(), 6);
        assert_eq!(SubHand::new(Rank::Six, Rank::Any).cards(), dealer.cards());
    }

    #[test]
    fn test_expose_round_trip() {
        let mut dealer = SubHand::dealer(Rank::Six);
        let before = dealer;
        dealer.expose(Rank::Ace).unwrap();
        assert!(dealer.is_exposed());
        assert_eq!(dealer.effective_total(), 17);
        assert!(dealer.is_soft());
        dealer.back_expose();
        assert!(same_state(&dealer, &before));
        assert!(!dealer.is_exposed());
    }

    #[test]
    fn test_expose_twice_rejected() {
        let mut dealer = SubHand::dealer(Rank::Six);
        dealer.expose(Rank::Two).unwrap();
        assert!(matches!(dealer.expose(Rank::Two), Err(Error::InvalidAction(_))));
    }

    #[test]
    fn test_hit_round_trip_every_rank() {
        let base = SubHand::new(Rank::Ace, Rank::Five);
        for rank in Rank::ALL {
            let mut hand = base;
            hand.hit(rank).unwrap();
            assert_eq!(hand.len(), 3);
            hand.back_hit();
            assert!(same_state(&hand, &base), "rank {rank}");
        }
    }

    #[test]
    fn test_hit_round_trip_restores_soft() {
        let mut hand = SubHand::new(Rank::Ace, Rank::Five);
        hand.hit(Rank::Ace).unwrap();
        hand.hit(Rank::Ten).unwrap();
        assert!(!hand.is_soft());
        hand.back_hit();
        assert!(hand.is_soft());
        assert_eq!(hand.effective_total(), 17);
        hand.back_hit();
        assert_eq!(hand.effective_total(), 16);
    }

    #[test]
    fn test_hit_wildcard_rejected() {
        let mut hand = SubHand::new(Rank::Two, Rank::Three);
        assert!(matches!(hand.hit(Rank::Any), Err(Error::InvalidRank(_))));
        assert_eq!(hand.len(), 2);
    }

    #[test]
    fn test_double_down_round_trip() {
        let base = SubHand::new(Rank::Five, Rank::Six);
        let mut hand = base;
        hand.double_down(Rank::Ten).unwrap();
        assert_eq!(hand.wager(), 2);
        assert_eq!(hand.effective_total(), 21);
        hand.back_double_down();
        assert!(same_state(&hand, &base));
    }

    #[test]
    fn test_double_down_needs_fresh_hand() {
        let mut hand = SubHand::new(Rank::Two, Rank::Three);
        hand.hit(Rank::Four).unwrap();
        assert!(matches!(
            hand.double_down(Rank::Five),
            Err(Error::InvalidAction(_))
        ));
        assert_eq!(hand.wager(), 1);
        assert_eq!(hand.len(), 3);
    }

    #[test]
    fn test_split_and_back_split() {
        let pair = SubHand::new(Rank::Ace, Rank::Ace);
        let [first, second] = pair.split(Rank::Ten, Rank::Four).unwrap();
        assert_eq!(first.cards(), &[Rank::Ace, Rank::Ten]);
        assert_eq!(second.cards(), &[Rank::Ace, Rank::Four]);
        assert_eq!(second.effective_total(), 15);
        assert!(second.is_soft());

        let mut rebuilt = first;
        rebuilt.back_split(&first, &second);
        assert!(same_state(&rebuilt, &pair));
        assert_eq!(rebuilt.effective_total(), 12);
    }

    #[test]
    fn test_longest_legal_hand_fits() {
        let mut hand = SubHand::new(Rank::Ace, Rank::Ace);
        for _ in 0..8 {
            hand.hit(Rank::Ace).unwrap();
        }
        assert_eq!(hand.effective_total(), 20);
        hand.hit(Rank::Two).unwrap();
        for _ in 0..8 {
            assert!(hand.effective_total() < 21);
            hand.hit(Rank::Ace).unwrap();
        }
        assert_eq!(hand.effective_total(), 20);
        hand.hit(Rank::Ten).unwrap();
        assert!(hand.is_bust());
        assert_eq!(hand.len(), 20);
        assert!(hand.len() <= MAX_CARDS);
    }

    #[test]
    fn test_back_hit_on_two_cards_is_a_no_op() {
        let base = SubHand::new(Rank::Ten, Rank::Six);
        let mut hand = base;
        hand.back_hit();
        assert!(same_state(&hand, &base));
        assert_eq!(hand.len(), 2);
    }

    #[test]
    fn test_back_double_down_without_double_is_a_no_op() {
        let mut hand = SubHand::new(Rank::Two, Rank::Three);
        hand.hit(Rank::Four).unwrap();
        let before = hand;
        hand.back_double_down();
        assert!(same_state(&hand, &before));
        assert_eq!(hand.len(), 3);
    }

    #[test]
    #[should_panic]
    fn test_card_out_of_range_panics() {
        SubHand::new(Rank::Ten, Rank::Six).card(2);
    }

    #[test]
    fn test_split_rejects_non_pair() {
        let hand = SubHand::new(Rank::Eight, Rank::Nine);
        assert!(matches!(
            hand.split(Rank::Two, Rank::Three),
            Err(Error::InvalidAction(_))
        ));
    }

    #[test]
    fn test_profit_blackjack_pays_ratio() {
        let mut dealer = SubHand::dealer(Rank::Ten);
        dealer.expose(Rank::Nine).unwrap();
        let player = SubHand::new(Rank::Ace, Rank::Ten);
        assert!((player.profit(&dealer, PayoutRatio::SIX_TO_FIVE) - 1.2).abs() < 1e-12);
        assert!((player.profit(&dealer, PayoutRatio::THREE_TO_TWO) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_profit_both_blackjack_push() {
        let mut dealer = SubHand::dealer(Rank::Ten);
        dealer.expose(Rank::Ace).unwrap();
        let player = SubHand::new(Rank::Ace, Rank::Ten);
        assert_eq!(player.profit(&dealer, PayoutRatio::THREE_TO_TWO), 0.0);
    }

    #[test]
    fn test_profit_dealer_blackjack_beats_21() {
        let mut dealer = SubHand::dealer(Rank::Ace);
        dealer.expose(Rank::Ten).unwrap();
        let mut player = SubHand::new(Rank::Seven, Rank::Four);
        player.hit(Rank::Ten).unwrap();
        assert_eq!(player.profit(&dealer, PayoutRatio::THREE_TO_TWO), -1.0);
    }

    #[test]
    fn test_profit_player_bust_loses_even_if_dealer_busts() {
        let mut dealer = SubHand::dealer(Rank::Ten);
        dealer.expose(Rank::Six).unwrap();
        dealer.hit(Rank::Ten).unwrap();
        assert!(dealer.is_bust());
        let mut player = SubHand::new(Rank::Ten, Rank::Six);
        player.double_down(Rank::Nine).unwrap();
        assert_eq!(player.profit(&dealer, PayoutRatio::THREE_TO_TWO), -2.0);
    }

    #[test]
    fn test_profit_compare_totals() {
        let mut dealer = SubHand::dealer(Rank::Ten);
        dealer.expose(Rank::Eight).unwrap();
        let payout = PayoutRatio::THREE_TO_TWO;
        assert_eq!(SubHand::new(Rank::Ten, Rank::Nine).profit(&dealer, payout), 1.0);
        assert_eq!(SubHand::new(Rank::Ten, Rank::Eight).profit(&dealer, payout), 0.0);
        assert_eq!(SubHand::new(Rank::Ten, Rank::Seven).profit(&dealer, payout), -1.0);
    }

    #[test]
    fn test_coarse_equality() {
        let a = SubHand::new(Rank::Nine, Rank::Seven);
        let b = SubHand::new(Rank::Ten, Rank::Six);
        assert_eq!(a, b);

        let mut c = SubHand::new(Rank::Ten, Rank::Two);
        c.hit(Rank::Four).unwrap();
        assert_ne!(a, c);

        let mut bust_a = SubHand::new(Rank::Ten, Rank::Six);
        bust_a.hit(Rank::Ten).unwrap();
        let mut bust_b = SubHand::new(Rank::Ten, Rank::Two);
        bust_b.hit(Rank::Ten).unwrap();
        assert_eq!(bust_a, bust_b);

        let mut doubled = SubHand::new(Rank::Ten, Rank::Six);
        doubled.double_down(Rank::Ten).unwrap();
        assert_ne!(doubled, bust_a);
    }

    #[test]
    fn test_display() {
        let mut hand = SubHand::new(Rank::Ace, Rank::Five);
        hand.hit(Rank::Ten).unwrap();
        assert_eq!(hand.to_string(), "(A, 5, 10)");
        assert_eq!(SubHand::dealer(Rank::Nine).to_string(), "(?, 9)");
    }
}
