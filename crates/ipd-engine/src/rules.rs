//! Custom rule-based strategies.
//!
//! A custom strategy is a small decision table: an ordered list of rules,
//! each a condition paired with a move, evaluated first-match-wins, with a
//! mandatory default. Raw definitions (as authored in JSON) are validated
//! and compiled into the closed [`RuleCondition`] enum before any match
//! runs; nothing is interpreted mid-match.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::strategy::{Move, Strategy};

/// Condition field names accepted in raw definitions.
const FIELD_OPPONENT_LAST_MOVE: &str = "opponent_last_move";
const FIELD_COOPERATION_RATE_BELOW: &str = "cooperation_rate_below";
const FIELD_ROUND_ABOVE: &str = "round_above";

/// Compiled rule condition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RuleCondition {
    /// Opponent's previous move equals the given move. Never matches on
    /// round 0 (no history yet).
    OpponentLastMove(Move),
    /// Opponent's cooperation rate so far is strictly below the threshold.
    /// The rate is cooperations / rounds played, defined as 0.0 before any
    /// round has been played.
    CooperationRateBelow(f64),
    /// Current round index is strictly above the given value.
    RoundAbove(u32),
}

impl RuleCondition {
    fn matches(&self, opponent_history: &[Move], round: u32) -> bool {
        match self {
            RuleCondition::OpponentLastMove(expected) => {
                opponent_history.last() == Some(expected)
            }
            RuleCondition::CooperationRateBelow(threshold) => {
                cooperation_rate(opponent_history) < *threshold
            }
            RuleCondition::RoundAbove(value) => round > *value,
        }
    }
}

/// One compiled rule: condition plus resulting move.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub condition: RuleCondition,
    pub response: Move,
}

/// Validated, ordered decision table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    rules: Vec<Rule>,
    default: Move,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>, default: Move) -> Self {
        Self { rules, default }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate the table: first matching rule wins, default otherwise.
    pub fn evaluate(&self, opponent_history: &[Move], round: u32) -> Move {
        for rule in &self.rules {
            if rule.condition.matches(opponent_history, round) {
                return rule.response;
            }
        }
        self.default
    }
}

/// Opponent cooperation rate over the rounds played so far, 0.0 when no
/// rounds have been played.
fn cooperation_rate(history: &[Move]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    let cooperations = history.iter().filter(|m| **m == Move::Cooperate).count();
    cooperations as f64 / history.len() as f64
}

// ── Raw definitions ──────────────────────────────────────────────────

/// Raw strategy definition as produced by an authoring surface.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StrategyDef {
    pub name: String,
    #[serde(default)]
    pub rules: Vec<RuleDef>,
    /// Move played when no rule matches.
    pub default: String,
}

/// Raw rule: a condition field name, its operand, and the resulting move.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleDef {
    /// One of `opponent_last_move`, `cooperation_rate_below`, `round_above`.
    pub when: String,
    /// Operand for `opponent_last_move`.
    #[serde(default)]
    pub equals: Option<String>,
    /// Operand for `cooperation_rate_below`, in [0, 1].
    #[serde(default)]
    pub threshold: Option<f64>,
    /// Operand for `round_above`.
    #[serde(default)]
    pub round: Option<u32>,
    /// Move played when the condition matches.
    pub then: String,
}

impl StrategyDef {
    /// Parse a raw definition from its JSON form.
    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        serde_json::from_str(text)
            .map_err(|e| EngineError::InvalidStrategyDefinition(e.to_string()))
    }
}

/// Validate a raw definition and compile it into a ready-to-play
/// [`Strategy`]. Malformed definitions are rejected here, never mid-match.
pub fn validate_strategy(def: &StrategyDef) -> Result<Strategy, EngineError> {
    if def.name.trim().is_empty() {
        return Err(EngineError::InvalidStrategyDefinition(
            "strategy name must not be empty".into(),
        ));
    }

    let default = parse_move(&def.default)?;
    let mut rules = Vec::with_capacity(def.rules.len());
    for (index, rule) in def.rules.iter().enumerate() {
        let condition = compile_condition(index, rule)?;
        let response = parse_move(&rule.then)?;
        rules.push(Rule {
            condition,
            response,
        });
    }

    Ok(Strategy::custom(
        def.name.trim().to_string(),
        RuleSet::new(rules, default),
    ))
}

fn compile_condition(index: usize, rule: &RuleDef) -> Result<RuleCondition, EngineError> {
    match rule.when.as_str() {
        FIELD_OPPONENT_LAST_MOVE => {
            let operand = rule.equals.as_deref().ok_or_else(|| {
                EngineError::InvalidStrategyDefinition(format!(
                    "rule {index}: `{FIELD_OPPONENT_LAST_MOVE}` requires `equals`"
                ))
            })?;
            Ok(RuleCondition::OpponentLastMove(parse_move(operand)?))
        }
        FIELD_COOPERATION_RATE_BELOW => {
            let threshold = rule.threshold.ok_or_else(|| {
                EngineError::InvalidStrategyDefinition(format!(
                    "rule {index}: `{FIELD_COOPERATION_RATE_BELOW}` requires `threshold`"
                ))
            })?;
            if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
                return Err(EngineError::InvalidStrategyDefinition(format!(
                    "rule {index}: threshold {threshold} outside [0, 1]"
                )));
            }
            Ok(RuleCondition::CooperationRateBelow(threshold))
        }
        FIELD_ROUND_ABOVE => {
            let round = rule.round.ok_or_else(|| {
                EngineError::InvalidStrategyDefinition(format!(
                    "rule {index}: `{FIELD_ROUND_ABOVE}` requires `round`"
                ))
            })?;
            Ok(RuleCondition::RoundAbove(round))
        }
        other => Err(EngineError::InvalidStrategyDefinition(format!(
            "rule {index}: unknown condition field `{other}`"
        ))),
    }
}

fn parse_move(text: &str) -> Result<Move, EngineError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "c" | "cooperate" => Ok(Move::Cooperate),
        "d" | "defect" => Ok(Move::Defect),
        other => Err(EngineError::InvalidStrategyDefinition(format!(
            "unknown move `{other}`"
        ))),
    }
}
