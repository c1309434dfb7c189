use shared::PrStatus;
use sqlx::{Postgres, QueryBuilder};

use crate::error::{Error, Result};

/// Optional restrictions on the pull request set. Every present field becomes
/// an `AND` clause; absent fields restrict nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrFilter {
    pub status: Option<PrStatus>,
    pub user_id: Option<i32>,
    pub project_id: Option<i32>,
    pub is_validated: Option<bool>,
}

impl PrFilter {
    /// Coerces raw query string values. A value that fails coercion is a
    /// client error, not a silently dropped filter.
    pub fn from_query(
        status: Option<&str>,
        user_id: Option<i32>,
        project_id: Option<i32>,
        is_validated: Option<&str>,
    ) -> Result<Self> {
        Ok(Self {
            status: status.map(parse_status).transpose()?,
            user_id,
            project_id,
            is_validated: is_validated.map(parse_bool_flag).transpose()?,
        })
    }

    pub fn with_user(mut self, user_id: i32) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_project(mut self, project_id: i32) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Appends the WHERE clause for this filter. The query must alias the
    /// pull_requests table as `pr`.
    pub(crate) fn push_where(&self, query: &mut QueryBuilder<'_, Postgres>) {
        query.push(" WHERE 1 = 1");
        if let Some(status) = self.status {
            query.push(" AND pr.status = ").push_bind(status.to_string());
        }
        if let Some(user_id) = self.user_id {
            query.push(" AND pr.user_id = ").push_bind(user_id);
        }
        if let Some(project_id) = self.project_id {
            query.push(" AND pr.project_id = ").push_bind(project_id);
        }
        if let Some(is_validated) = self.is_validated {
            query.push(" AND pr.is_validated = ").push_bind(is_validated);
        }
    }
}

fn parse_status(raw: &str) -> Result<PrStatus> {
    raw.parse()
        .map_err(|_| Error::InvalidFilter(format!("unknown status `{raw}`")))
}

fn parse_bool_flag(raw: &str) -> Result<bool> {
    match raw {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(Error::InvalidFilter(format!(
            "`{other}` is not a boolean"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(filter: &PrFilter) -> String {
        let mut query = QueryBuilder::new("SELECT 1 FROM pull_requests pr");
        filter.push_where(&mut query);
        query.into_sql()
    }

    #[test]
    fn empty_filter_restricts_nothing() {
        let sql = rendered(&PrFilter::default());
        assert!(sql.ends_with("WHERE 1 = 1"));
    }

    #[test]
    fn present_fields_become_clauses() {
        let filter = PrFilter::from_query(Some("merged"), Some(3), Some(9), Some("true")).unwrap();
        let sql = rendered(&filter);
        assert!(sql.contains("pr.status ="));
        assert!(sql.contains("pr.user_id ="));
        assert!(sql.contains("pr.project_id ="));
        assert!(sql.contains("pr.is_validated ="));
    }

    #[test]
    fn builder_helpers_pin_owner_and_project() {
        let filter = PrFilter::default().with_user(4).with_project(2);
        assert_eq!(filter.user_id, Some(4));
        assert_eq!(filter.project_id, Some(2));
    }

    #[test]
    fn bad_status_is_a_client_error() {
        let result = PrFilter::from_query(Some("reopened"), None, None, None);
        assert!(matches!(result, Err(Error::InvalidFilter(_))));
    }

    #[test]
    fn non_boolean_validation_flag_is_a_client_error() {
        let result = PrFilter::from_query(None, None, None, Some("yes"));
        assert!(matches!(result, Err(Error::InvalidFilter(_))));
    }

    #[test]
    fn boolean_flag_accepts_both_spellings() {
        for (raw, expected) in [("true", true), ("1", true), ("false", false), ("0", false)] {
            let filter = PrFilter::from_query(None, None, None, Some(raw)).unwrap();
            assert_eq!(filter.is_validated, Some(expected));
        }
    }
}
