//! Simulation and tournament engine for the Iterated Prisoner's Dilemma.
//!
//! The engine is a pure computation over its inputs: strategies decide,
//! the match runner applies noise and forgiveness and scores each round,
//! and the tournament schedulers (round robin, single elimination, group
//! stage + knockout) roll match records up into a ranked result. All
//! randomness derives from an explicit tournament seed, so every run is
//! reproducible.
//!
//! ```
//! use ipd_engine::{
//!     run_tournament, MatchConfig, Strategy, StrategyKind, TournamentConfig,
//!     TournamentFormat,
//! };
//!
//! let config = TournamentConfig::new(
//!     TournamentFormat::RoundRobin,
//!     vec![
//!         Strategy::builtin(StrategyKind::TitForTat),
//!         Strategy::builtin(StrategyKind::AlwaysDefect),
//!         Strategy::builtin(StrategyKind::GrimTrigger),
//!     ],
//!     MatchConfig::default(),
//!     42,
//! );
//! let result = run_tournament(&config).unwrap();
//! assert_eq!(result.standings.len(), 3);
//! ```

mod error;
mod game;
mod payoff;
mod random;
mod report;
mod rules;
mod strategy;
mod tournament;

pub use error::EngineError;
pub use game::{run_match, MatchConfig, MatchRecord, RoundOutcome};
pub use payoff::PayoffMatrix;
pub use random::MatchRng;
pub use report::{
    aggregate, match_rows, round_rows, standing_rows, MatchRow, RoundRow, StandingRow,
    StrategySummary,
};
pub use rules::{validate_strategy, Rule, RuleCondition, RuleDef, RuleSet, StrategyDef};
pub use strategy::{Move, Strategy, StrategyKind};
pub use tournament::{
    run_tournament, Standing, TieBreak, TournamentConfig, TournamentFormat, TournamentResult,
};
