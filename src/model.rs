use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::heatmap::HeatmapGrid;
use crate::timeline::Timeline;

pub const SCHEMA_VERSION: u32 = 1;

/// Commits per calendar day, keyed by ISO date.
pub type CommitDateHistogram = BTreeMap<NaiveDate, u32>;

/// A user as returned by `GET /users/{login}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub login: String,
    pub id: u64,
    pub name: Option<String>,
    pub avatar_url: String,
    pub html_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub blog: Option<String>,
    pub followers: u32,
    pub following: u32,
    pub public_repos: u32,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(&self.login)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub language: Option<String>,
    pub stargazers_count: u32,
    pub forks_count: u32,
    pub watchers_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub commit_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commits_by_date: Option<CommitDateHistogram>,
}

impl Repository {
    /// Attach a derived commit count. Identity fields are left untouched.
    pub fn with_commit_count(mut self, commit_count: u64) -> Self {
        self.commit_count = commit_count;
        self
    }

    pub fn with_histogram(mut self, histogram: CommitDateHistogram) -> Self {
        self.commits_by_date = Some(histogram);
        self
    }

    /// A zero count means the commit data has not arrived or could not be fetched.
    pub fn is_pending(&self) -> bool {
        self.commit_count == 0
    }
}

/// One raw page of `GET /repos/{owner}/{repo}/commits`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitPage {
    pub url: String,
    pub status: u16,
    pub link: Option<String>,
    pub body: String,
}

impl CommitPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitEntry {
    pub sha: String,
    pub commit: CommitDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitDetail {
    pub author: Option<CommitSignature>,
    pub committer: Option<CommitSignature>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitSignature {
    pub name: String,
    pub email: Option<String>,
    pub date: DateTime<Utc>,
}

impl CommitEntry {
    /// Authored date, falling back to the committer date.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.commit
            .author
            .as_ref()
            .or(self.commit.committer.as_ref())
            .map(|sig| sig.date)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub profile: Profile,
    pub repositories: Vec<Repository>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub login: String,
    pub timeline: Timeline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub login: String,
    pub repository: String,
    pub commit_count: u64,
    pub min_year: i32,
    pub max_year: i32,
    pub grid: HeatmapGrid,
}
