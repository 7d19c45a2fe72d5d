//! Tournament scheduling: round robin, single elimination, and group
//! stage plus knockout.
//!
//! All three formats share one contract: consume a [`TournamentConfig`],
//! resolve every head-to-head through the match runner, and roll the
//! results up into a [`TournamentResult`]. Match indices are assigned in
//! scheduling order, so each match owns a private generator derived from
//! the tournament seed and replays are exact.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::game::{run_match, run_match_sudden_death, MatchConfig, MatchRecord};
use crate::report::{aggregate, StrategySummary};
use crate::strategy::Strategy;

/// Competition topology.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TournamentFormat {
    /// Every unordered pair of participants plays exactly once.
    RoundRobin,
    /// Single-loss bracket. Input order is seeding order; when the field
    /// is not a power of two, the lowest seeds receive first-round byes.
    Elimination,
    /// Participants are dealt into groups; each group plays an internal
    /// round robin; the top finishers per group advance to a bracket
    /// seeded by group rank.
    GroupKnockout {
        groups: u32,
        advance_per_group: u32,
    },
}

/// How a level bracket match is decided.
///
/// Both policies are deterministic; neither silently favors a side
/// without it being written down here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TieBreak {
    /// Play one extra round at a time until the cumulative scores differ,
    /// up to the cap; if still level, the earlier bracket slot advances.
    SuddenDeath { max_extra_rounds: u32 },
    /// The earlier bracket slot advances immediately.
    LowerSeed,
}

impl Default for TieBreak {
    fn default() -> Self {
        TieBreak::SuddenDeath {
            max_extra_rounds: 10,
        }
    }
}

/// Full description of one tournament run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentConfig {
    pub format: TournamentFormat,
    pub participants: Vec<Strategy>,
    /// Applied uniformly to every match.
    pub match_config: MatchConfig,
    /// Root of all randomness in the tournament.
    pub seed: u64,
    #[serde(default)]
    pub tie_break: TieBreak,
}

impl TournamentConfig {
    pub fn new(
        format: TournamentFormat,
        participants: Vec<Strategy>,
        match_config: MatchConfig,
        seed: u64,
    ) -> Self {
        Self {
            format,
            participants,
            match_config,
            seed,
            tie_break: TieBreak::default(),
        }
    }
}

/// One row of the final ranking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub rank: u32,
    pub name: String,
    pub total_score: i64,
    pub matches_played: u32,
    pub wins: u32,
    pub win_rate: f64,
    pub average_score: f64,
}

/// Ranked standings plus every underlying match, for traceability.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentResult {
    pub standings: Vec<Standing>,
    pub matches: Vec<MatchRecord>,
}

impl TournamentResult {
    pub fn champion(&self) -> Option<&str> {
        self.standings.first().map(|s| s.name.as_str())
    }
}

/// Run a tournament to its terminal state.
///
/// Configuration problems surface as errors before any match is played;
/// once execution starts the computation runs to completion.
pub fn run_tournament(config: &TournamentConfig) -> Result<TournamentResult, EngineError> {
    validate(config)?;

    let mut sched = Scheduler {
        participants: &config.participants,
        match_config: &config.match_config,
        seed: config.seed,
        tie_break: config.tie_break,
        next_index: 0,
        records: Vec::new(),
    };

    let order = match config.format {
        TournamentFormat::RoundRobin => run_round_robin(&mut sched)?,
        TournamentFormat::Elimination => run_elimination(&mut sched)?,
        TournamentFormat::GroupKnockout {
            groups,
            advance_per_group,
        } => run_group_knockout(&mut sched, groups as usize, advance_per_group as usize)?,
    };

    let summaries = aggregate(&sched.records);
    let standings = build_standings(&order, &config.participants, &summaries);
    debug!(
        "tournament complete: {} matches, winner {}",
        sched.records.len(),
        standings.first().map(|s| s.name.as_str()).unwrap_or("-")
    );
    Ok(TournamentResult {
        standings,
        matches: sched.records,
    })
}

fn validate(config: &TournamentConfig) -> Result<(), EngineError> {
    let n = config.participants.len();
    if n < 2 {
        return Err(EngineError::InvalidTournamentConfig(format!(
            "at least 2 participants required, got {n}"
        )));
    }

    let mut names: Vec<&str> = config.participants.iter().map(|p| p.name()).collect();
    if names.iter().any(|name| name.is_empty()) {
        return Err(EngineError::InvalidTournamentConfig(
            "participant name must not be empty".into(),
        ));
    }
    names.sort_unstable();
    if let Some(dup) = names.windows(2).find(|w| w[0] == w[1]) {
        return Err(EngineError::InvalidTournamentConfig(format!(
            "duplicate participant name `{}`",
            dup[0]
        )));
    }

    config.match_config.validate()?;

    if let TournamentFormat::GroupKnockout {
        groups,
        advance_per_group,
    } = config.format
    {
        if groups == 0 {
            return Err(EngineError::InvalidTournamentConfig(
                "at least one group required".into(),
            ));
        }
        if n < groups as usize {
            return Err(EngineError::InvalidTournamentConfig(format!(
                "{n} participants cannot fill {groups} groups"
            )));
        }
        if advance_per_group == 0 {
            return Err(EngineError::InvalidTournamentConfig(
                "at least one qualifier per group required".into(),
            ));
        }
        if u64::from(groups) * u64::from(advance_per_group) < 2 {
            return Err(EngineError::InvalidTournamentConfig(
                "knockout stage needs at least 2 qualifiers in total".into(),
            ));
        }
    }
    Ok(())
}

/// Shared match-dispatch state: hands out match indices and collects
/// records.
struct Scheduler<'a> {
    participants: &'a [Strategy],
    match_config: &'a MatchConfig,
    seed: u64,
    tie_break: TieBreak,
    next_index: u64,
    records: Vec<MatchRecord>,
}

impl Scheduler<'_> {
    /// Play one match where a draw is an acceptable outcome.
    fn play(&mut self, a: usize, b: usize) -> Result<(), EngineError> {
        let record = run_match(
            &self.participants[a],
            &self.participants[b],
            self.match_config,
            self.seed,
            self.next_index,
        )?;
        self.next_index += 1;
        self.records.push(record);
        Ok(())
    }

    /// Play one bracket match and return (winner, loser).
    fn play_bracket(&mut self, a: usize, b: usize) -> Result<(usize, usize), EngineError> {
        let record = match self.tie_break {
            TieBreak::SuddenDeath { max_extra_rounds } => run_match_sudden_death(
                &self.participants[a],
                &self.participants[b],
                self.match_config,
                self.seed,
                self.next_index,
                max_extra_rounds,
            )?,
            TieBreak::LowerSeed => run_match(
                &self.participants[a],
                &self.participants[b],
                self.match_config,
                self.seed,
                self.next_index,
            )?,
        };
        self.next_index += 1;
        // An unbroken tie advances the earlier bracket slot.
        let a_advances = record.total_a >= record.total_b;
        self.records.push(record);
        Ok(if a_advances { (a, b) } else { (b, a) })
    }
}

fn run_round_robin(sched: &mut Scheduler) -> Result<Vec<usize>, EngineError> {
    let n = sched.participants.len();
    debug!("round robin: {n} participants, {} matches", n * (n - 1) / 2);
    for a in 0..n {
        for b in (a + 1)..n {
            sched.play(a, b)?;
        }
    }
    let summaries = aggregate(&sched.records);
    Ok(order_by_performance(
        (0..n).collect(),
        sched.participants,
        &summaries,
    ))
}

fn run_elimination(sched: &mut Scheduler) -> Result<Vec<usize>, EngineError> {
    let seeds: Vec<usize> = (0..sched.participants.len()).collect();
    let finish = run_bracket(sched, &seeds)?;
    let summaries = aggregate(&sched.records);
    Ok(order_bracket(finish, sched.participants, &summaries))
}

fn run_group_knockout(
    sched: &mut Scheduler,
    groups: usize,
    advance_per_group: usize,
) -> Result<Vec<usize>, EngineError> {
    let n = sched.participants.len();

    // Deterministic deal: participant i joins group i mod G.
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); groups];
    for i in 0..n {
        members[i % groups].push(i);
    }

    // Each group runs an internal round robin, ranked by the round-robin
    // rule over that group's matches only.
    let mut group_tables: Vec<Vec<usize>> = Vec::with_capacity(groups);
    for (gi, group) in members.iter().enumerate() {
        let first_record = sched.records.len();
        for x in 0..group.len() {
            for y in (x + 1)..group.len() {
                sched.play(group[x], group[y])?;
            }
        }
        let table = order_by_performance(
            group.clone(),
            sched.participants,
            &aggregate(&sched.records[first_record..]),
        );
        debug!(
            "group {}: winner {}",
            gi + 1,
            sched.participants[table[0]].name()
        );
        group_tables.push(table);
    }
    let group_stage_len = sched.records.len();

    // Bracket seeding by group rank: all group winners first, then all
    // runners-up, and so on; equal ranks ordered by group index.
    let mut seeds: Vec<usize> = Vec::new();
    for level in 0..advance_per_group {
        for table in &group_tables {
            if let Some(&p) = table.get(level) {
                seeds.push(p);
            }
        }
    }
    debug!("knockout stage: {} qualifiers", seeds.len());

    let finish = run_bracket(sched, &seeds)?;
    let summaries = aggregate(&sched.records);
    let mut order = order_bracket(finish, sched.participants, &summaries);

    // Everyone eliminated in the groups ranks below every qualifier,
    // ordered by group-stage performance.
    let group_summaries = aggregate(&sched.records[..group_stage_len]);
    let eliminated: Vec<usize> = (0..n).filter(|i| !seeds.contains(i)).collect();
    order.extend(order_by_performance(
        eliminated,
        sched.participants,
        &group_summaries,
    ));
    Ok(order)
}

/// Run a single-loss bracket over the given seeds, in seeding order.
///
/// Returns each entrant paired with the bracket round it survived until;
/// the champion carries the highest value.
fn run_bracket(sched: &mut Scheduler, seeds: &[usize]) -> Result<Vec<(usize, u32)>, EngineError> {
    let n = seeds.len();
    let bracket = n.next_power_of_two();
    let byes = bracket - n;
    let playing = n - byes;
    debug!("bracket: {n} entrants, {byes} bye(s) in round 1");

    let mut finish: Vec<(usize, u32)> = Vec::with_capacity(n);
    let mut round = 1u32;

    // Round 1: the top seeds pair adjacently; the tail of the seeding
    // order advances on byes so round 2 is a clean power-of-two field.
    let mut current: Vec<usize> = Vec::with_capacity(bracket / 2);
    for pair in seeds[..playing].chunks(2) {
        let (winner, loser) = sched.play_bracket(pair[0], pair[1])?;
        finish.push((loser, round));
        current.push(winner);
    }
    current.extend_from_slice(&seeds[playing..]);
    round += 1;

    while current.len() > 1 {
        let mut next = Vec::with_capacity(current.len() / 2);
        for pair in current.chunks(2) {
            let (winner, loser) = sched.play_bracket(pair[0], pair[1])?;
            finish.push((loser, round));
            next.push(winner);
        }
        current = next;
        round += 1;
    }

    finish.push((current[0], round));
    Ok(finish)
}

/// Round-robin ranking rule: total score, then win rate, then name.
fn order_by_performance(
    mut indices: Vec<usize>,
    participants: &[Strategy],
    summaries: &BTreeMap<String, StrategySummary>,
) -> Vec<usize> {
    let per: Vec<StrategySummary> = participants
        .iter()
        .map(|p| summaries.get(p.name()).cloned().unwrap_or_default())
        .collect();
    indices.sort_by(|&x, &y| {
        per[y]
            .total_score
            .cmp(&per[x].total_score)
            .then_with(|| per[y].win_rate().total_cmp(&per[x].win_rate()))
            .then_with(|| participants[x].name().cmp(participants[y].name()))
    });
    indices
}

/// Bracket ranking rule: elimination round reached, then the round-robin
/// rule among those who fell in the same round.
fn order_bracket(
    mut finish: Vec<(usize, u32)>,
    participants: &[Strategy],
    summaries: &BTreeMap<String, StrategySummary>,
) -> Vec<usize> {
    let per: Vec<StrategySummary> = participants
        .iter()
        .map(|p| summaries.get(p.name()).cloned().unwrap_or_default())
        .collect();
    finish.sort_by(|&(x, fx), &(y, fy)| {
        fy.cmp(&fx)
            .then_with(|| per[y].total_score.cmp(&per[x].total_score))
            .then_with(|| per[y].win_rate().total_cmp(&per[x].win_rate()))
            .then_with(|| participants[x].name().cmp(participants[y].name()))
    });
    finish.into_iter().map(|(i, _)| i).collect()
}

fn build_standings(
    order: &[usize],
    participants: &[Strategy],
    summaries: &BTreeMap<String, StrategySummary>,
) -> Vec<Standing> {
    order
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            let name = participants[p].name();
            let summary = summaries.get(name).cloned().unwrap_or_default();
            Standing {
                rank: (i + 1) as u32,
                name: name.to_string(),
                total_score: summary.total_score,
                matches_played: summary.matches_played,
                wins: summary.wins,
                win_rate: summary.win_rate(),
                average_score: summary.average_score(),
            }
        })
        .collect()
}
