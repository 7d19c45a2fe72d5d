//! Result aggregation and flat row representations for export consumers.
//!
//! Aggregation is a pure function over match records with no knowledge of
//! which scheduler produced them, so the same code serves all three
//! tournament formats and ad-hoc single-match summaries. The row types
//! exist for the external presentation/export layers: plain structs of
//! primitives, one per match, round, or ranked participant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::game::{MatchRecord, RoundOutcome};
use crate::strategy::Move;
use crate::tournament::TournamentResult;

/// Per-strategy totals over a set of matches.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategySummary {
    pub matches_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub total_score: i64,
}

impl StrategySummary {
    /// Fraction of matches won outright. 0.0 before any match.
    pub fn win_rate(&self) -> f64 {
        if self.matches_played == 0 {
            0.0
        } else {
            f64::from(self.wins) / f64::from(self.matches_played)
        }
    }

    /// Mean match score. 0.0 before any match.
    pub fn average_score(&self) -> f64 {
        if self.matches_played == 0 {
            0.0
        } else {
            self.total_score as f64 / f64::from(self.matches_played)
        }
    }

    fn record(&mut self, own: i64, opponent: i64) {
        self.matches_played += 1;
        self.total_score += own;
        match own.cmp(&opponent) {
            std::cmp::Ordering::Greater => self.wins += 1,
            std::cmp::Ordering::Less => self.losses += 1,
            std::cmp::Ordering::Equal => self.draws += 1,
        }
    }

    /// Fold another summary into this one. Aggregating the union of two
    /// disjoint record sets equals merging their separate aggregates.
    pub fn merge(&mut self, other: &StrategySummary) {
        self.matches_played += other.matches_played;
        self.wins += other.wins;
        self.losses += other.losses;
        self.draws += other.draws;
        self.total_score += other.total_score;
    }
}

/// Compute per-strategy summaries from a set of match records.
///
/// A win is a strictly higher match score. Keys are strategy names, in a
/// BTreeMap so iteration order is stable for reporting.
pub fn aggregate(records: &[MatchRecord]) -> BTreeMap<String, StrategySummary> {
    let mut summaries: BTreeMap<String, StrategySummary> = BTreeMap::new();
    for record in records {
        summaries
            .entry(record.name_a.clone())
            .or_default()
            .record(record.total_a, record.total_b);
        summaries
            .entry(record.name_b.clone())
            .or_default()
            .record(record.total_b, record.total_a);
    }
    summaries
}

// ── Row representations ──────────────────────────────────────────────

/// One row per match, with compact history strings ("CDCCD…").
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRow {
    pub name_a: String,
    pub name_b: String,
    pub rounds: u32,
    pub score_a: i64,
    pub score_b: i64,
    pub history_a: String,
    pub history_b: String,
}

/// One row per round of one match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRow {
    pub name_a: String,
    pub name_b: String,
    pub round: u32,
    pub move_a: char,
    pub move_b: char,
    pub score_a: i64,
    pub score_b: i64,
    pub cumulative_a: i64,
    pub cumulative_b: i64,
}

/// One row per ranked participant of a finished tournament.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandingRow {
    pub rank: u32,
    pub name: String,
    pub total_score: i64,
    pub matches_played: u32,
    pub wins: u32,
    pub win_rate: f64,
    pub average_score: f64,
}

fn history_string<'a>(moves: impl Iterator<Item = &'a Move>) -> String {
    moves.map(|m| m.letter()).collect()
}

/// Flatten match records into one row per match.
pub fn match_rows(records: &[MatchRecord]) -> Vec<MatchRow> {
    records
        .iter()
        .map(|record| MatchRow {
            name_a: record.name_a.clone(),
            name_b: record.name_b.clone(),
            rounds: record.rounds.len() as u32,
            score_a: record.total_a,
            score_b: record.total_b,
            history_a: history_string(record.rounds.iter().map(|r| &r.move_a)),
            history_b: history_string(record.rounds.iter().map(|r| &r.move_b)),
        })
        .collect()
}

/// Flatten one match record into one row per round.
pub fn round_rows(record: &MatchRecord) -> Vec<RoundRow> {
    record
        .rounds
        .iter()
        .map(|outcome: &RoundOutcome| RoundRow {
            name_a: record.name_a.clone(),
            name_b: record.name_b.clone(),
            round: outcome.round,
            move_a: outcome.move_a.letter(),
            move_b: outcome.move_b.letter(),
            score_a: outcome.score_a,
            score_b: outcome.score_b,
            cumulative_a: outcome.cumulative_a,
            cumulative_b: outcome.cumulative_b,
        })
        .collect()
}

/// Flatten a tournament's standings into rows.
pub fn standing_rows(result: &TournamentResult) -> Vec<StandingRow> {
    result
        .standings
        .iter()
        .map(|s| StandingRow {
            rank: s.rank,
            name: s.name.clone(),
            total_score: s.total_score,
            matches_played: s.matches_played,
            wins: s.wins,
            win_rate: s.win_rate,
            average_score: s.average_score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{run_match, MatchConfig};
    use crate::strategy::{Strategy, StrategyKind};
    use proptest::prelude::*;

    fn quiet(rounds: u32) -> MatchConfig {
        MatchConfig {
            rounds,
            ..MatchConfig::default()
        }
    }

    fn sample_records() -> Vec<MatchRecord> {
        let tft = Strategy::builtin(StrategyKind::TitForTat);
        let all_d = Strategy::builtin(StrategyKind::AlwaysDefect);
        let all_c = Strategy::builtin(StrategyKind::AlwaysCooperate);
        vec![
            run_match(&tft, &all_d, &quiet(10), 42, 0).unwrap(),
            run_match(&tft, &all_c, &quiet(10), 42, 1).unwrap(),
            run_match(&all_d, &all_c, &quiet(10), 42, 2).unwrap(),
        ]
    }

    #[test]
    fn test_aggregate_counts_and_totals() {
        let records = sample_records();
        let summaries = aggregate(&records);
        assert_eq!(summaries.len(), 3);

        // Always Defect beat both opponents.
        let all_d = &summaries["Always Defect"];
        assert_eq!(all_d.matches_played, 2);
        assert_eq!(all_d.wins, 2);
        assert_eq!(all_d.losses, 0);
        assert_eq!(all_d.win_rate(), 1.0);

        // TFT vs AllD: 0+9*1 = 9 against 5+9*1 = 14. TFT vs AllC: 30-30.
        let tft = &summaries["Tit for Tat"];
        assert_eq!(tft.total_score, 39);
        assert_eq!(tft.wins, 0);
        assert_eq!(tft.draws, 1);
        assert_eq!(tft.losses, 1);
        assert_eq!(tft.average_score(), 19.5);

        let all_c = &summaries["Always Cooperate"];
        assert_eq!(all_c.total_score, 30);
        assert_eq!(all_c.draws, 1);
        assert_eq!(all_c.losses, 1);
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate(&[]).is_empty());
        assert_eq!(StrategySummary::default().win_rate(), 0.0);
        assert_eq!(StrategySummary::default().average_score(), 0.0);
    }

    #[test]
    fn test_aggregate_is_associative_over_disjoint_sets() {
        let records = sample_records();
        let (left, right) = records.split_at(2);

        let whole = aggregate(&records);
        let mut combined = aggregate(left);
        for (name, summary) in aggregate(right) {
            combined.entry(name).or_default().merge(&summary);
        }
        assert_eq!(whole, combined);
    }

    #[test]
    fn test_match_rows_histories() {
        let tft = Strategy::builtin(StrategyKind::TitForTat);
        let all_d = Strategy::builtin(StrategyKind::AlwaysDefect);
        let record = run_match(&tft, &all_d, &quiet(5), 42, 0).unwrap();

        let rows = match_rows(&[record]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].history_a, "CDDDD");
        assert_eq!(rows[0].history_b, "DDDDD");
        assert_eq!(rows[0].rounds, 5);
        assert_eq!(rows[0].score_a, 4);
        assert_eq!(rows[0].score_b, 9);
    }

    #[test]
    fn test_round_rows_align_with_record() {
        let records = sample_records();
        let rows = round_rows(&records[0]);
        assert_eq!(rows.len(), records[0].rounds.len());
        for (row, outcome) in rows.iter().zip(records[0].rounds.iter()) {
            assert_eq!(row.round, outcome.round);
            assert_eq!(row.move_a, outcome.move_a.letter());
            assert_eq!(row.cumulative_b, outcome.cumulative_b);
        }
    }

    #[test]
    fn test_standing_rows_mirror_the_ranking() {
        use crate::tournament::{run_tournament, TournamentConfig, TournamentFormat};

        let config = TournamentConfig::new(
            TournamentFormat::RoundRobin,
            vec![
                Strategy::builtin(StrategyKind::TitForTat),
                Strategy::builtin(StrategyKind::AlwaysDefect),
                Strategy::builtin(StrategyKind::AlwaysCooperate),
            ],
            quiet(10),
            42,
        );
        let result = run_tournament(&config).unwrap();

        let rows = standing_rows(&result);
        assert_eq!(rows.len(), result.standings.len());
        for (row, standing) in rows.iter().zip(result.standings.iter()) {
            assert_eq!(row.rank, standing.rank);
            assert_eq!(row.name, standing.name);
            assert_eq!(row.total_score, standing.total_score);
            assert_eq!(row.win_rate, standing.win_rate);
        }
    }

    #[test]
    fn test_rows_serialize_to_plain_json() {
        let records = sample_records();
        let text = serde_json::to_string(&match_rows(&records)).unwrap();
        let parsed: Vec<MatchRow> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, match_rows(&records));
    }

    proptest! {
        /// Merging summaries in any split point gives the same totals as
        /// aggregating the whole set at once.
        #[test]
        fn prop_aggregate_split_invariance(split in 0usize..=3, seed in any::<u64>()) {
            let p = Strategy::builtin(StrategyKind::Random);
            let q = Strategy::named("Random 2", StrategyKind::Random);
            let r = Strategy::builtin(StrategyKind::Pavlov);
            let config = quiet(8);
            let records = vec![
                run_match(&p, &q, &config, seed, 0).unwrap(),
                run_match(&q, &r, &config, seed, 1).unwrap(),
                run_match(&p, &r, &config, seed, 2).unwrap(),
            ];
            let (left, right) = records.split_at(split);
            let mut combined = aggregate(left);
            for (name, summary) in aggregate(right) {
                combined.entry(name).or_default().merge(&summary);
            }
            prop_assert_eq!(combined, aggregate(&records));
        }
    }
}
