use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use strum::{Display, EnumString};

/// Time window a leaderboard is computed over. `Weekly` is a trailing 7-day
/// window anchored to the query time and keyed on `validated_at`, so a pull
/// request counts for the week its points were confirmed, not the week it was
/// opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum LeaderboardWindow {
    Overall,
    Weekly,
}

impl LeaderboardWindow {
    /// Inclusive lower bound on `validated_at`, or `None` for all-time.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<NaiveDateTime> {
        match self {
            LeaderboardWindow::Overall => None,
            LeaderboardWindow::Weekly => Some((now - Duration::days(7)).naive_utc()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overall_window_has_no_cutoff() {
        assert_eq!(LeaderboardWindow::Overall.cutoff(Utc::now()), None);
    }

    #[test]
    fn weekly_window_keeps_yesterday_and_drops_ten_days_ago() {
        let now = Utc::now();
        let cutoff = LeaderboardWindow::Weekly.cutoff(now).unwrap();

        let validated_yesterday = (now - Duration::days(1)).naive_utc();
        let validated_ten_days_ago = (now - Duration::days(10)).naive_utc();

        assert!(validated_yesterday >= cutoff);
        assert!(validated_ten_days_ago < cutoff);
    }

    #[test]
    fn window_parses_from_query_value() {
        assert_eq!(
            "weekly".parse::<LeaderboardWindow>().unwrap(),
            LeaderboardWindow::Weekly
        );
        assert_eq!(
            "overall".parse::<LeaderboardWindow>().unwrap(),
            LeaderboardWindow::Overall
        );
        assert!("fortnight".parse::<LeaderboardWindow>().is_err());
    }
}
