//! Payoff model for one round of the dilemma.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::strategy::Move;

/// The four payoffs, keyed by (own move, opponent move).
///
/// Must satisfy the classic ordering `temptation > reward > punishment >
/// sucker` and `2 * reward > temptation + sucker`; `new` rejects anything
/// else, so a constructed matrix is always a genuine dilemma.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoffMatrix {
    /// Defect against a cooperator.
    pub temptation: i64,
    /// Mutual cooperation.
    pub reward: i64,
    /// Mutual defection.
    pub punishment: i64,
    /// Cooperate against a defector.
    pub sucker: i64,
}

impl PayoffMatrix {
    /// Validate and construct a payoff matrix.
    pub fn new(
        temptation: i64,
        reward: i64,
        punishment: i64,
        sucker: i64,
    ) -> Result<Self, EngineError> {
        if !(temptation > reward && reward > punishment && punishment > sucker) {
            return Err(EngineError::InvalidPayoffConfig(format!(
                "require temptation > reward > punishment > sucker, got {temptation} / {reward} / {punishment} / {sucker}"
            )));
        }
        if 2 * reward <= temptation + sucker {
            return Err(EngineError::InvalidPayoffConfig(format!(
                "require 2 * reward > temptation + sucker, got 2 * {reward} <= {temptation} + {sucker}"
            )));
        }
        Ok(Self {
            temptation,
            reward,
            punishment,
            sucker,
        })
    }

    /// Score one pair of simultaneous moves as (score_a, score_b).
    pub fn score(&self, a: Move, b: Move) -> (i64, i64) {
        match (a, b) {
            (Move::Cooperate, Move::Cooperate) => (self.reward, self.reward),
            (Move::Cooperate, Move::Defect) => (self.sucker, self.temptation),
            (Move::Defect, Move::Cooperate) => (self.temptation, self.sucker),
            (Move::Defect, Move::Defect) => (self.punishment, self.punishment),
        }
    }
}

impl Default for PayoffMatrix {
    /// The classic 5 / 3 / 1 / 0 matrix.
    fn default() -> Self {
        Self {
            temptation: 5,
            reward: 3,
            punishment: 1,
            sucker: 0,
        }
    }
}
