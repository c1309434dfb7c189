use async_trait::async_trait;
use chrono::NaiveDateTime;
use itertools::Itertools;
use shared::PrStatus;
use tracing::instrument;

use crate::db::DB;
use crate::error::{Error, Result};

/// A pull request as reported by the external VCS source, keyed by its
/// number within the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePullRequest {
    pub number: i32,
    pub title: String,
    pub url: Option<String>,
    pub author: String,
    pub status: PrStatus,
    pub created_at: NaiveDateTime,
    pub merged_at: Option<NaiveDateTime>,
    pub additions: u32,
    pub deletions: u32,
}

/// Capability the sync workflow needs from an external VCS: list a
/// repository's pull requests with diff stats and timestamps. Concrete
/// adapters (GitHub today) can be swapped without touching the aggregation
/// or validation code.
#[async_trait]
pub trait VcsSource: Send + Sync {
    async fn repo_pull_requests(&self, org: &str, repo: &str) -> Result<Vec<RemotePullRequest>>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
}

/// Reconciles a project's pull requests with the external source.
///
/// The remote list is fetched in full before any write, and all writes share
/// one transaction: an upstream failure or a mid-sync error leaves local
/// state untouched. Upserts never modify validation state or points, and
/// affected users' cached totals are re-aggregated before commit.
#[instrument(skip(db, source))]
pub async fn sync_project(
    db: &DB,
    source: &dyn VcsSource,
    project_id: i32,
) -> Result<SyncOutcome> {
    let project = db
        .get_project(project_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("project {project_id}")))?;
    let (org, repo) = parse_repo_slug(&project.github_repo_url)?;

    let remote = source.repo_pull_requests(&org, &repo).await?;
    tracing::info!(
        "fetched {} pull requests for {org}/{repo}",
        remote.len()
    );

    let mut tx = db.begin().await?;
    let mut outcome = SyncOutcome::default();
    let mut touched_users = Vec::new();

    for pr in &remote {
        // Only registered participants are tracked.
        let Some(user_id) = DB::find_user_by_github(&mut tx, &pr.author).await? else {
            outcome.skipped += 1;
            continue;
        };
        let created = DB::upsert_synced_pull_request(&mut tx, project.id, user_id, pr).await?;
        if created {
            outcome.created += 1;
        } else {
            outcome.updated += 1;
        }
        touched_users.push(user_id);
    }

    for user_id in touched_users.into_iter().unique() {
        DB::recompute_user_totals(&mut tx, user_id).await?;
    }
    tx.commit().await?;

    Ok(outcome)
}

/// Extracts `(org, repo)` from a project's GitHub repository URL.
pub fn parse_repo_slug(url: &str) -> Result<(String, String)> {
    let remainder = url
        .strip_prefix("https://github.com/")
        .or_else(|| url.strip_prefix("http://github.com/"))
        .or_else(|| url.strip_prefix("git@github.com:"))
        .ok_or_else(|| {
            Error::Upstream(format!("`{url}` is not a github repository url"))
        })?;
    let mut segments = remainder.trim_end_matches('/').splitn(2, '/');
    let org = segments.next().unwrap_or_default();
    let repo = segments
        .next()
        .unwrap_or_default()
        .trim_end_matches(".git");
    if org.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(Error::Upstream(format!(
            "`{url}` is not an org/repo github url"
        )));
    }
    Ok((org.to_string(), repo.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_https_repo_urls() {
        assert_eq!(
            parse_repo_slug("https://github.com/orbit-board/orbit-board").unwrap(),
            ("orbit-board".to_string(), "orbit-board".to_string())
        );
    }

    #[test]
    fn tolerates_git_suffix_and_trailing_slash() {
        assert_eq!(
            parse_repo_slug("https://github.com/org/repo.git").unwrap(),
            ("org".to_string(), "repo".to_string())
        );
        assert_eq!(
            parse_repo_slug("https://github.com/org/repo/").unwrap(),
            ("org".to_string(), "repo".to_string())
        );
    }

    #[test]
    fn parses_ssh_remotes() {
        assert_eq!(
            parse_repo_slug("git@github.com:org/repo.git").unwrap(),
            ("org".to_string(), "repo".to_string())
        );
    }

    #[test]
    fn rejects_non_github_hosts() {
        assert!(parse_repo_slug("https://gitlab.com/org/repo").is_err());
        assert!(parse_repo_slug("not a url").is_err());
    }

    #[test]
    fn rejects_urls_without_a_repo_segment() {
        assert!(parse_repo_slug("https://github.com/org").is_err());
        assert!(parse_repo_slug("https://github.com/org/").is_err());
    }
}
