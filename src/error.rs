use thiserror::Error;

use crate::Rank;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid action: {0}")]
    InvalidAction(String),
    #[error("Shoe exhausted: no {0} left to draw")]
    ShoeExhausted(Rank),
    #[error("Probability underflow: draw distribution sums to {0}")]
    ProbabilityUnderflow(f64),
    #[error("Invalid rank: {0}")]
    InvalidRank(String),
    #[error("Invalid rules: {0}")]
    InvalidRules(String),
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}
