use std::cmp::Ordering;

use chrono::NaiveDateTime;
use serde::Serialize;

/// Per-user aggregate of confirmed contributions, as produced by the record
/// store's grouped-sum query: validated, merged pull requests only.
#[derive(Debug, Clone, PartialEq)]
pub struct UserScore {
    pub user_id: i32,
    pub login: String,
    pub name: String,
    pub points: i64,
    pub merged_prs: i64,
    pub first_merged_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub place: u32,
    pub user_id: i32,
    pub login: String,
    pub name: String,
    pub points: i64,
    pub merged_prs: i64,
}

/// Orders the full contributor set and assigns strict places 1..N.
///
/// Sort: points descending, then earlier first merge, then ascending user id.
/// The tie-break chain is total, so repeated point values never share a
/// place and the output is identical for any input order.
pub fn build_leaderboard(mut rows: Vec<UserScore>) -> Vec<RankedEntry> {
    rows.sort_by(compare);
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| RankedEntry {
            place: index as u32 + 1,
            user_id: row.user_id,
            login: row.login,
            name: row.name,
            points: row.points,
            merged_prs: row.merged_prs,
        })
        .collect()
}

fn compare(a: &UserScore, b: &UserScore) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| match (a.first_merged_at, b.first_merged_at) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.user_id.cmp(&b.user_id))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDateTime};

    use super::*;

    fn at(timestamp: i64) -> Option<NaiveDateTime> {
        Some(DateTime::from_timestamp(timestamp, 0).unwrap().naive_utc())
    }

    fn score(
        user_id: i32,
        points: i64,
        merged_prs: i64,
        first_merged_at: Option<NaiveDateTime>,
    ) -> UserScore {
        UserScore {
            user_id,
            login: format!("user-{user_id}"),
            name: format!("User {user_id}"),
            points,
            merged_prs,
            first_merged_at,
        }
    }

    #[test]
    fn orders_by_points_descending() {
        let ranked = build_leaderboard(vec![
            score(1, 40, 2, at(100)),
            score(2, 90, 3, at(200)),
            score(3, 70, 1, at(300)),
        ]);
        let order: Vec<i32> = ranked.iter().map(|e| e.user_id).collect();
        assert_eq!(order, vec![2, 3, 1]);
        assert_eq!(ranked[0].place, 1);
        assert_eq!(ranked[2].place, 3);
    }

    #[test]
    fn earlier_first_merge_wins_a_points_tie() {
        // A has 100 points over 3 merged PRs, B has 100 over 2 but merged
        // first: B places above A.
        let a = score(1, 100, 3, at(5_000));
        let b = score(2, 100, 2, at(1_000));
        let ranked = build_leaderboard(vec![a, b]);
        assert_eq!(ranked[0].user_id, 2);
        assert_eq!(ranked[0].place, 1);
        assert_eq!(ranked[1].user_id, 1);
        assert_eq!(ranked[1].place, 2);
    }

    #[test]
    fn user_id_breaks_a_full_tie() {
        let ranked = build_leaderboard(vec![
            score(7, 50, 1, at(100)),
            score(3, 50, 1, at(100)),
        ]);
        assert_eq!(ranked[0].user_id, 3);
        assert_eq!(ranked[1].user_id, 7);
    }

    #[test]
    fn missing_first_merge_sorts_after_known_ones() {
        let ranked = build_leaderboard(vec![
            score(1, 50, 0, None),
            score(2, 50, 1, at(100)),
        ]);
        assert_eq!(ranked[0].user_id, 2);
    }

    #[test]
    fn places_are_strict_and_complete() {
        let rows: Vec<UserScore> = (1..=10).map(|id| score(id, 25, 1, at(100))).collect();
        let ranked = build_leaderboard(rows);
        let places: Vec<u32> = ranked.iter().map(|e| e.place).collect();
        assert_eq!(places, (1..=10).collect::<Vec<u32>>());
    }

    #[test]
    fn output_does_not_depend_on_input_order() {
        let forward = vec![
            score(1, 40, 2, at(100)),
            score(2, 90, 3, at(200)),
            score(3, 40, 1, at(50)),
        ];
        let mut backward = forward.clone();
        backward.reverse();
        assert_eq!(build_leaderboard(forward), build_leaderboard(backward));
    }

    #[test]
    fn extra_confirmed_points_never_worsen_a_place() {
        let before = build_leaderboard(vec![
            score(1, 40, 2, at(100)),
            score(2, 90, 3, at(200)),
            score(3, 70, 1, at(300)),
        ]);
        // User 1 gets one more merged PR validated.
        let after = build_leaderboard(vec![
            score(1, 70, 3, at(100)),
            score(2, 90, 3, at(200)),
            score(3, 70, 1, at(300)),
        ]);
        let place_of = |entries: &[RankedEntry], id| {
            entries.iter().find(|e| e.user_id == id).unwrap().place
        };
        assert!(place_of(&after, 1) <= place_of(&before, 1));
    }
}
