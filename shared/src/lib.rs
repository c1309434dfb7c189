use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

mod leaderboard;
mod scoring;
mod window;

pub use leaderboard::*;
pub use scoring::*;
pub use window::*;

pub type GithubHandle = String;

/// Lifecycle state of a tracked pull request. `Merged` and `Closed` are
/// terminal; a record enters as `Open`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PrStatus {
    Open,
    Merged,
    Closed,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
    Contributor,
    Mentor,
    Admin,
}

impl UserRole {
    pub fn can_validate(&self) -> bool {
        matches!(self, UserRole::Mentor | UserRole::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_storage_form() {
        for status in [PrStatus::Open, PrStatus::Merged, PrStatus::Closed] {
            assert_eq!(status.to_string().parse::<PrStatus>().unwrap(), status);
        }
        assert!("reopened".parse::<PrStatus>().is_err());
    }

    #[test]
    fn only_mentors_and_admins_validate() {
        assert!(!UserRole::Contributor.can_validate());
        assert!(UserRole::Mentor.can_validate());
        assert!(UserRole::Admin.can_validate());
    }
}
