//! Match execution engine.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::payoff::PayoffMatrix;
use crate::random::MatchRng;
use crate::strategy::{Move, Strategy};

/// Configuration for one repeated game.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Number of rounds, at least 1.
    pub rounds: u32,
    /// Chance a chosen move is flipped before being played, in [0, 1].
    pub noise: f64,
    /// Chance an about-to-be-played Defect is downgraded to Cooperate,
    /// in [0, 1]. Applied after noise.
    pub forgiveness: f64,
    pub payoffs: PayoffMatrix,
}

impl Default for MatchConfig {
    /// 100 undisturbed rounds on the classic matrix.
    fn default() -> Self {
        Self {
            rounds: 100,
            noise: 0.0,
            forgiveness: 0.0,
            payoffs: PayoffMatrix::default(),
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.rounds < 1 {
            return Err(EngineError::InvalidMatchConfig(
                "round count must be >= 1".into(),
            ));
        }
        for (label, value) in [("noise", self.noise), ("forgiveness", self.forgiveness)] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(EngineError::InvalidMatchConfig(format!(
                    "{label} probability {value} outside [0, 1]"
                )));
            }
        }
        // The payoff ordering is enforced at PayoffMatrix construction,
        // but a matrix built via deserialization re-enters here.
        PayoffMatrix::new(
            self.payoffs.temptation,
            self.payoffs.reward,
            self.payoffs.punishment,
            self.payoffs.sucker,
        )?;
        Ok(())
    }
}

/// Result of a single round, post-perturbation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub round: u32,
    pub move_a: Move,
    pub move_b: Move,
    pub score_a: i64,
    pub score_b: i64,
    pub cumulative_a: i64,
    pub cumulative_b: i64,
}

/// Complete record of one finished match.
///
/// Moves are the ones actually played; a noisy flip or a forgiven defection
/// appears here as played, because that is what the opponent reacted to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub name_a: String,
    pub name_b: String,
    pub rounds: Vec<RoundOutcome>,
    pub total_a: i64,
    pub total_b: i64,
}

impl MatchRecord {
    /// Name of the strictly-higher-scoring side, `None` on a draw.
    pub fn winner(&self) -> Option<&str> {
        match self.total_a.cmp(&self.total_b) {
            std::cmp::Ordering::Greater => Some(&self.name_a),
            std::cmp::Ordering::Less => Some(&self.name_b),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Apply noise then forgiveness to an intended move.
fn perturb(intended: Move, config: &MatchConfig, rng: &mut MatchRng) -> Move {
    let mut played = intended;
    if rng.chance(config.noise) {
        played = played.flipped();
    }
    if played == Move::Defect && rng.chance(config.forgiveness) {
        played = Move::Cooperate;
    }
    played
}

struct MatchState {
    history_a: Vec<Move>,
    history_b: Vec<Move>,
    rounds: Vec<RoundOutcome>,
    total_a: i64,
    total_b: i64,
    rng_a: MatchRng,
    rng_b: MatchRng,
}

impl MatchState {
    fn new(seed: u64, match_index: u64, capacity: u32) -> Self {
        let base = MatchRng::new(seed, match_index);
        Self {
            history_a: Vec::with_capacity(capacity as usize),
            history_b: Vec::with_capacity(capacity as usize),
            rounds: Vec::with_capacity(capacity as usize),
            total_a: 0,
            total_b: 0,
            rng_a: base.player_stream(0),
            rng_b: base.player_stream(1),
        }
    }

    fn play_round(&mut self, a: &Strategy, b: &Strategy, config: &MatchConfig, round: u32) {
        // Simultaneous decisions: each side sees only completed rounds.
        let intent_a = a.decide(&self.history_b, &self.history_a, round, &mut self.rng_a);
        let intent_b = b.decide(&self.history_a, &self.history_b, round, &mut self.rng_b);

        let move_a = perturb(intent_a, config, &mut self.rng_a);
        let move_b = perturb(intent_b, config, &mut self.rng_b);

        let (score_a, score_b) = config.payoffs.score(move_a, move_b);
        self.total_a += score_a;
        self.total_b += score_b;

        self.rounds.push(RoundOutcome {
            round,
            move_a,
            move_b,
            score_a,
            score_b,
            cumulative_a: self.total_a,
            cumulative_b: self.total_b,
        });
        self.history_a.push(move_a);
        self.history_b.push(move_b);
    }

    fn into_record(self, a: &Strategy, b: &Strategy) -> MatchRecord {
        MatchRecord {
            name_a: a.name().to_string(),
            name_b: b.name().to_string(),
            rounds: self.rounds,
            total_a: self.total_a,
            total_b: self.total_b,
        }
    }
}

fn validate_participants(a: &Strategy, b: &Strategy) -> Result<(), EngineError> {
    if a.name().is_empty() || b.name().is_empty() {
        return Err(EngineError::InvalidMatchConfig(
            "strategy name must not be empty".into(),
        ));
    }
    Ok(())
}

/// Run a complete match between two strategies.
///
/// Deterministic given `(seed, match_index)`: each match derives a private
/// generator, with one stream per player. Validation failures are raised
/// before round 1; a partial record is never returned.
pub fn run_match(
    a: &Strategy,
    b: &Strategy,
    config: &MatchConfig,
    seed: u64,
    match_index: u64,
) -> Result<MatchRecord, EngineError> {
    config.validate()?;
    validate_participants(a, b)?;

    trace!(
        "match {match_index}: {} vs {} over {} rounds",
        a.name(),
        b.name(),
        config.rounds
    );

    let mut state = MatchState::new(seed, match_index, config.rounds);
    for round in 0..config.rounds {
        state.play_round(a, b, config, round);
    }
    Ok(state.into_record(a, b))
}

/// Run a match and, if it ends level, keep playing one extra round at a
/// time until the cumulative scores differ or `max_extra_rounds` is spent.
/// Used by bracket schedulers; the returned record contains every round
/// actually played.
pub(crate) fn run_match_sudden_death(
    a: &Strategy,
    b: &Strategy,
    config: &MatchConfig,
    seed: u64,
    match_index: u64,
    max_extra_rounds: u32,
) -> Result<MatchRecord, EngineError> {
    config.validate()?;
    validate_participants(a, b)?;

    let mut state = MatchState::new(seed, match_index, config.rounds);
    for round in 0..config.rounds {
        state.play_round(a, b, config, round);
    }

    let mut extra = 0;
    while state.total_a == state.total_b && extra < max_extra_rounds {
        state.play_round(a, b, config, config.rounds + extra);
        extra += 1;
    }
    if extra > 0 {
        trace!(
            "match {match_index}: tie extended by {extra} sudden-death round(s), now {}-{}",
            state.total_a,
            state.total_b
        );
    }
    Ok(state.into_record(a, b))
}
