mod decision;
mod error;
mod game;
mod hand;
mod rank;
mod rules;
mod shoe;
mod sub_hand;

pub use decision::{ActionValues, Decision, Move};
pub use error::Error;
pub use game::{DealerOutcomes, Game, SearchStats};
pub use hand::{Hand, HandState, COMPLETE};
pub use rank::Rank;
pub use rules::{CompletedHand, HouseRules, PayoutRatio, SURRENDER_EV};
pub use shoe::{DrawModel, Shoe};
pub use sub_hand::{SubHand, MAX_CARDS};
