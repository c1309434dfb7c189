use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::PrStatus;

const DEFAULT_TABLE: &str = include_str!("../../Scoring.toml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBucket {
    pub min_lines: u32,
    pub points: u32,
}

/// Bucket table mapping a merged pull request's diff size to points.
///
/// The table is data, not code: the scoring curve can change without touching
/// the aggregation engine. A compiled-in copy of `Scoring.toml` is used when
/// no override file is configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    buckets: Vec<ScoreBucket>,
}

impl ScoringConfig {
    pub fn embedded() -> Self {
        toml::from_str(DEFAULT_TABLE).expect("embedded scoring table is valid")
    }

    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config: Self = match path {
            Some(path) => toml::from_str(&std::fs::read_to_string(path)?)?,
            None => Self::embedded(),
        };
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.buckets.is_empty() {
            anyhow::bail!("scoring table has no buckets");
        }
        for pair in self.buckets.windows(2) {
            if pair[1].min_lines <= pair[0].min_lines {
                anyhow::bail!(
                    "scoring buckets must be in ascending min_lines order ({} then {})",
                    pair[0].min_lines,
                    pair[1].min_lines
                );
            }
            if pair[1].points < pair[0].points {
                anyhow::bail!(
                    "scoring points must not decrease with diff size ({} then {})",
                    pair[0].points,
                    pair[1].points
                );
            }
        }
        Ok(())
    }

    /// Points for a pull request. Deterministic in its inputs: only merged
    /// pull requests score, and a zero-line diff scores 0 regardless of the
    /// table contents.
    pub fn score(&self, status: PrStatus, additions: u32, deletions: u32) -> u32 {
        if status != PrStatus::Merged {
            return 0;
        }
        let total_lines = additions as u64 + deletions as u64;
        if total_lines == 0 {
            return 0;
        }
        self.buckets
            .iter()
            .rev()
            .find(|bucket| total_lines >= bucket.min_lines as u64)
            .map(|bucket| bucket.points)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_table_is_valid() {
        ScoringConfig::load(None).unwrap();
    }

    #[test]
    fn only_merged_pull_requests_score() {
        let config = ScoringConfig::embedded();
        assert_eq!(config.score(PrStatus::Open, 500, 10), 0);
        assert_eq!(config.score(PrStatus::Closed, 500, 10), 0);
        assert!(config.score(PrStatus::Merged, 500, 10) > 0);
    }

    #[test]
    fn zero_line_diff_scores_zero() {
        let config = ScoringConfig::embedded();
        assert_eq!(config.score(PrStatus::Merged, 0, 0), 0);
    }

    #[test]
    fn buckets_follow_the_default_table() {
        let config = ScoringConfig::embedded();
        assert_eq!(config.score(PrStatus::Merged, 1, 0), 10);
        assert_eq!(config.score(PrStatus::Merged, 30, 19), 10);
        assert_eq!(config.score(PrStatus::Merged, 30, 20), 20);
        assert_eq!(config.score(PrStatus::Merged, 150, 50), 30);
        assert_eq!(config.score(PrStatus::Merged, 490, 10), 50);
        assert_eq!(config.score(PrStatus::Merged, 10_000, 10_000), 50);
    }

    #[test]
    fn score_is_monotonic_in_diff_size() {
        let config = ScoringConfig::embedded();
        let mut previous = 0;
        for lines in 0..1_000 {
            let points = config.score(PrStatus::Merged, lines, 0);
            assert!(points >= previous, "points dropped at {lines} lines");
            previous = points;
        }
    }

    #[test]
    fn unsorted_table_is_rejected() {
        let raw = r#"
            [[buckets]]
            min_lines = 100
            points = 20

            [[buckets]]
            min_lines = 10
            points = 10
        "#;
        let config: ScoringConfig = toml::from_str(raw).unwrap();
        assert!(config.check().is_err());
    }

    #[test]
    fn decreasing_points_are_rejected() {
        let raw = r#"
            [[buckets]]
            min_lines = 10
            points = 20

            [[buckets]]
            min_lines = 100
            points = 10
        "#;
        let config: ScoringConfig = toml::from_str(raw).unwrap();
        assert!(config.check().is_err());
    }

    #[test]
    fn empty_table_is_rejected() {
        let config: ScoringConfig = toml::from_str("buckets = []").unwrap();
        assert!(config.check().is_err());
    }
}
