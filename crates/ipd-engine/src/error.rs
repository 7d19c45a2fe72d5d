//! Error taxonomy for the engine.
//!
//! Every variant is a configuration/validation error detected before any
//! simulation work begins. Once a match or tournament has validated and
//! started, the engine performs no I/O and all internal operations are
//! total, so there is nothing left to fail.

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The payoff ordering invariant is violated.
    #[error("invalid payoff configuration: {0}")]
    InvalidPayoffConfig(String),

    /// A custom strategy definition is malformed.
    #[error("invalid strategy definition: {0}")]
    InvalidStrategyDefinition(String),

    /// A match configuration is out of range.
    #[error("invalid match configuration: {0}")]
    InvalidMatchConfig(String),

    /// A tournament configuration cannot produce a valid competition.
    #[error("invalid tournament configuration: {0}")]
    InvalidTournamentConfig(String),
}
