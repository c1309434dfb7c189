use async_trait::async_trait;
use chrono::NaiveDateTime;
use octocrab::Octocrab;
use shared::PrStatus;
use tracing::instrument;

use crate::error::{Error, Result};
use crate::sync::{RemotePullRequest, VcsSource};

pub struct GithubClient {
    octocrab: Octocrab,
}

impl GithubClient {
    /// Unauthenticated clients work for public repositories; a token raises
    /// the rate limit and reaches private ones.
    pub fn new(github_token: Option<String>) -> anyhow::Result<Self> {
        let mut builder = Octocrab::builder();
        if let Some(token) = github_token {
            builder = builder.personal_token(token);
        }
        Ok(Self {
            octocrab: builder.build()?,
        })
    }
}

#[async_trait]
impl VcsSource for GithubClient {
    #[instrument(skip(self))]
    async fn repo_pull_requests(&self, org: &str, repo: &str) -> Result<Vec<RemotePullRequest>> {
        let mut page = self
            .octocrab
            .pulls(org, repo)
            .list()
            .state(octocrab::params::State::All)
            .per_page(100)
            .send()
            .await
            .map_err(upstream)?;
        let mut listed = page.take_items();
        while let Some(mut next_page) = self.octocrab.get_page(&page.next).await.map_err(upstream)?
        {
            listed.append(&mut next_page.take_items());
            page = next_page;
        }

        // The list endpoint omits diff stats; fetch each full record.
        let mut result = Vec::with_capacity(listed.len());
        for pr in listed {
            let full = self
                .octocrab
                .pulls(org, repo)
                .get(pr.number)
                .await
                .map_err(upstream)?;
            if let Some(remote) = convert(full) {
                result.push(remote);
            }
        }
        Ok(result)
    }
}

fn upstream(e: octocrab::Error) -> Error {
    Error::Upstream(e.to_string())
}

pub(crate) fn pr_status(merged_at: Option<NaiveDateTime>, closed: bool) -> PrStatus {
    match (merged_at, closed) {
        (Some(_), _) => PrStatus::Merged,
        (None, true) => PrStatus::Closed,
        (None, false) => PrStatus::Open,
    }
}

fn convert(pr: octocrab::models::pulls::PullRequest) -> Option<RemotePullRequest> {
    let author = pr.user.map(|user| user.login)?;
    let created_at = pr.created_at?.naive_utc();
    let merged_at = pr.merged_at.map(|at| at.naive_utc());
    Some(RemotePullRequest {
        number: pr.number as i32,
        title: pr.title.unwrap_or_default(),
        url: pr.html_url.map(|url| url.to_string()),
        author,
        status: pr_status(merged_at, pr.closed_at.is_some()),
        created_at,
        merged_at,
        additions: pr.additions.unwrap_or_default() as u32,
        deletions: pr.deletions.unwrap_or_default() as u32,
    })
}
