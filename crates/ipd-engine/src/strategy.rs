//! Strategy definitions and execution.

use serde::{Deserialize, Serialize};

use crate::random::MatchRng;
use crate::rules::RuleSet;

/// A move in one round of the dilemma.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Move {
    Cooperate,
    Defect,
}

impl Move {
    /// The opposite move.
    pub fn flipped(self) -> Move {
        match self {
            Move::Cooperate => Move::Defect,
            Move::Defect => Move::Cooperate,
        }
    }

    /// Single-letter form used in compact history strings.
    pub fn letter(self) -> char {
        match self {
            Move::Cooperate => 'C',
            Move::Defect => 'D',
        }
    }
}

/// Chance that Generous Tit for Tat cooperates where plain Tit for Tat
/// would retaliate.
const GENEROUS_TFT_FORGIVENESS: f64 = 0.10;

/// Closed set of decision behaviors.
///
/// Every variant is a pure function of the visible history (plus the
/// caller-supplied rng for the stochastic ones), so replays with identical
/// inputs are reproducible.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StrategyKind {
    /// Always chooses to cooperate.
    AlwaysCooperate,
    /// Always chooses to defect.
    AlwaysDefect,
    /// Copy opponent's last move. Start with cooperate.
    TitForTat,
    /// Cooperate until the opponent defects once, then always defect.
    GrimTrigger,
    /// Fair coin flip each round.
    Random,
    /// Defect only after two consecutive opponent defections.
    TitForTwoTats,
    /// Tit for Tat, but start with defect.
    SuspiciousTitForTat,
    /// Tit for Tat with a 10% chance to cooperate where it would retaliate.
    GenerousTitForTat,
    /// Win-stay, lose-switch.
    Pavlov,
    /// Open with D, C, C; punish any defection seen during the probe.
    Prober,
    /// Play the opponent's most frequent past move, cooperate on ties.
    Majority,
    /// Retaliate with escalating defection streaks, then relent.
    Gradual,
    /// User-defined decision table.
    Custom(RuleSet),
}

/// A named participant: identity plus decision behavior.
///
/// Strategies are stateless across matches. A match may read the full move
/// history of the current match but never mutates the strategy itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    name: String,
    kind: StrategyKind,
}

impl Strategy {
    /// A built-in strategy under its canonical display name.
    pub fn builtin(kind: StrategyKind) -> Self {
        let name = match &kind {
            StrategyKind::AlwaysCooperate => "Always Cooperate",
            StrategyKind::AlwaysDefect => "Always Defect",
            StrategyKind::TitForTat => "Tit for Tat",
            StrategyKind::GrimTrigger => "Grim Trigger",
            StrategyKind::Random => "Random",
            StrategyKind::TitForTwoTats => "Tit for Two Tats",
            StrategyKind::SuspiciousTitForTat => "Suspicious Tit for Tat",
            StrategyKind::GenerousTitForTat => "Generous Tit for Tat",
            StrategyKind::Pavlov => "Pavlov",
            StrategyKind::Prober => "Prober",
            StrategyKind::Majority => "Majority",
            StrategyKind::Gradual => "Gradual",
            StrategyKind::Custom(_) => "Custom",
        };
        Self {
            name: name.to_string(),
            kind,
        }
    }

    /// A built-in behavior under a caller-chosen name (e.g. to field two
    /// differently-named copies of one behavior in the same tournament).
    pub fn named(name: impl Into<String>, kind: StrategyKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// A custom rule-based strategy. Definitions arriving from an authoring
    /// surface should go through [`crate::validate_strategy`] instead.
    pub fn custom(name: impl Into<String>, rules: RuleSet) -> Self {
        Self {
            name: name.into(),
            kind: StrategyKind::Custom(rules),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &StrategyKind {
        &self.kind
    }

    /// Human-readable description of the behavior.
    pub fn description(&self) -> String {
        match &self.kind {
            StrategyKind::AlwaysCooperate => "Always chooses to cooperate.".into(),
            StrategyKind::AlwaysDefect => "Always chooses to defect.".into(),
            StrategyKind::TitForTat => {
                "Starts by cooperating, then mirrors the opponent's last move.".into()
            }
            StrategyKind::GrimTrigger => {
                "Cooperates until betrayed once, then defects forever.".into()
            }
            StrategyKind::Random => "Cooperates or defects on a fair coin flip.".into(),
            StrategyKind::TitForTwoTats => {
                "Retaliates only after two consecutive defections.".into()
            }
            StrategyKind::SuspiciousTitForTat => {
                "Starts by defecting, then mirrors the opponent's last move.".into()
            }
            StrategyKind::GenerousTitForTat => {
                "Like Tit for Tat, with a 10% chance to forgive a defection.".into()
            }
            StrategyKind::Pavlov => {
                "Repeats its move after a good outcome, switches after a bad one.".into()
            }
            StrategyKind::Prober => {
                "Opens D, C, C. If the opponent cooperated through the probe, plays \
                 Tit for Tat; otherwise always defects."
                    .into()
            }
            StrategyKind::Majority => {
                "Plays the opponent's most frequent past move, cooperating on ties.".into()
            }
            StrategyKind::Gradual => {
                "Answers the Nth defection with a streak of N defections, then relents.".into()
            }
            StrategyKind::Custom(rules) => {
                format!("Custom decision table with {} rule(s).", rules.len())
            }
        }
    }

    /// Decide the next move.
    ///
    /// Histories contain only completed rounds; the opponent's same-round
    /// move is never visible. `rng` is this player's private match stream.
    pub fn decide(
        &self,
        opponent_history: &[Move],
        my_history: &[Move],
        round: u32,
        rng: &mut MatchRng,
    ) -> Move {
        match &self.kind {
            StrategyKind::AlwaysCooperate => Move::Cooperate,
            StrategyKind::AlwaysDefect => Move::Defect,
            StrategyKind::TitForTat => tit_for_tat(opponent_history),
            StrategyKind::GrimTrigger => grim_trigger(opponent_history),
            StrategyKind::Random => {
                if rng.coin_flip() {
                    Move::Cooperate
                } else {
                    Move::Defect
                }
            }
            StrategyKind::TitForTwoTats => tit_for_two_tats(opponent_history),
            StrategyKind::SuspiciousTitForTat => match opponent_history.last() {
                None => Move::Defect,
                Some(&last) => last,
            },
            StrategyKind::GenerousTitForTat => generous_tit_for_tat(opponent_history, rng),
            StrategyKind::Pavlov => pavlov(opponent_history, my_history),
            StrategyKind::Prober => prober(opponent_history, round),
            StrategyKind::Majority => majority(opponent_history),
            StrategyKind::Gradual => gradual(opponent_history, my_history),
            StrategyKind::Custom(rules) => rules.evaluate(opponent_history, round),
        }
    }
}

/// Copy the opponent's last move, cooperating when there is no history.
fn tit_for_tat(opponent_history: &[Move]) -> Move {
    match opponent_history.last() {
        None => Move::Cooperate,
        Some(&last) => last,
    }
}

fn grim_trigger(opponent_history: &[Move]) -> Move {
    if opponent_history.contains(&Move::Defect) {
        Move::Defect
    } else {
        Move::Cooperate
    }
}

fn tit_for_two_tats(opponent_history: &[Move]) -> Move {
    match opponent_history {
        [.., Move::Defect, Move::Defect] => Move::Defect,
        _ => Move::Cooperate,
    }
}

fn generous_tit_for_tat(opponent_history: &[Move], rng: &mut MatchRng) -> Move {
    match opponent_history.last() {
        None | Some(Move::Cooperate) => Move::Cooperate,
        Some(Move::Defect) => {
            if rng.chance(GENEROUS_TFT_FORGIVENESS) {
                Move::Cooperate
            } else {
                Move::Defect
            }
        }
    }
}

/// Win-stay, lose-switch.
///
/// Under the dilemma ordering a payoff of at least `reward` happens exactly
/// when the opponent cooperated, so win-stay reduces to: repeat after
/// opponent cooperation, switch after opponent defection. That keeps the
/// decision independent of the configured payoff values.
fn pavlov(opponent_history: &[Move], my_history: &[Move]) -> Move {
    match (my_history.last(), opponent_history.last()) {
        (Some(&mine), Some(Move::Cooperate)) => mine,
        (Some(&mine), Some(Move::Defect)) => mine.flipped(),
        _ => Move::Cooperate,
    }
}

fn prober(opponent_history: &[Move], round: u32) -> Move {
    match round {
        0 => Move::Defect,
        1 | 2 => Move::Cooperate,
        _ => {
            // Rounds 1 and 2 are the probe: both responses cooperative
            // means the opponent is safe to reciprocate with.
            if opponent_history.len() >= 3
                && opponent_history[1] == Move::Cooperate
                && opponent_history[2] == Move::Cooperate
            {
                tit_for_tat(opponent_history)
            } else {
                Move::Defect
            }
        }
    }
}

fn majority(opponent_history: &[Move]) -> Move {
    let cooperations = opponent_history
        .iter()
        .filter(|m| **m == Move::Cooperate)
        .count();
    let defections = opponent_history.len() - cooperations;
    if defections > cooperations {
        Move::Defect
    } else {
        Move::Cooperate
    }
}

/// After N opponent defections the player owes N(N+1)/2 total defections.
fn gradual(opponent_history: &[Move], my_history: &[Move]) -> Move {
    let their_defections = opponent_history
        .iter()
        .filter(|m| **m == Move::Defect)
        .count();
    let my_defections = my_history.iter().filter(|m| **m == Move::Defect).count();
    if my_defections < their_defections * (their_defections + 1) / 2 {
        Move::Defect
    } else {
        Move::Cooperate
    }
}
