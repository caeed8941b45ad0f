//! Canonical activity records and the structured projections handed to callers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// What kind of user action a record represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Commit,
    PullRequest,
    Issue,
    Comment,
    Gist,
    Star,
    Event,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Commit => "commit",
            SourceKind::PullRequest => "pull_request",
            SourceKind::Issue => "issue",
            SourceKind::Comment => "comment",
            SourceKind::Gist => "gist",
            SourceKind::Star => "star",
            SourceKind::Event => "event",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timestamped user action.
///
/// Records are immutable once built; the provenance URL is the uniqueness
/// key used during merging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityRecord {
    timestamp: DateTime<Utc>,
    kind: SourceKind,
    provenance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    utc_offset_seconds: Option<i32>,
}

impl ActivityRecord {
    pub fn new(timestamp: DateTime<Utc>, kind: SourceKind, provenance: impl Into<String>) -> Self {
        Self {
            timestamp,
            kind,
            provenance: provenance.into(),
            repository: None,
            author: None,
            utc_offset_seconds: None,
        }
    }

    /// Attach a repository identity (`owner/name`). Empty strings are ignored.
    #[must_use]
    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        let repository = repository.into();
        self.repository = (!repository.is_empty()).then_some(repository);
        self
    }

    #[must_use]
    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author.filter(|a| !a.is_empty());
        self
    }

    /// Attach the author's local UTC offset when the source preserved it
    /// (git commit dates do).
    #[must_use]
    pub fn with_utc_offset(mut self, seconds: Option<i32>) -> Self {
        self.utc_offset_seconds = seconds;
        self
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn provenance(&self) -> &str {
        &self.provenance
    }

    pub fn repository(&self) -> Option<&str> {
        self.repository.as_deref()
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn utc_offset_seconds(&self) -> Option<i32> {
        self.utc_offset_seconds
    }
}

/// Account profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub login: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub twitter_username: Option<String>,
    pub html_url: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub public_repos: Option<u32>,
    pub followers: Option<u32>,
}

/// A repository owned by the subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repository {
    pub full_name: String,
    pub html_url: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub is_fork: bool,
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub repository: String,
    pub state: String,
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    pub fn to_record(&self) -> ActivityRecord {
        ActivityRecord::new(self.created_at, SourceKind::PullRequest, &self.url)
            .with_repository(&self.repository)
            .with_author(self.author.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub repository: String,
    pub state: String,
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Issue {
    pub fn to_record(&self) -> ActivityRecord {
        ActivityRecord::new(self.created_at, SourceKind::Issue, &self.url)
            .with_repository(&self.repository)
            .with_author(self.author.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub url: String,
    pub repository: String,
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// First line of the comment body, truncated.
    pub excerpt: Option<String>,
}

impl Comment {
    pub fn to_record(&self) -> ActivityRecord {
        ActivityRecord::new(self.created_at, SourceKind::Comment, &self.url)
            .with_repository(&self.repository)
            .with_author(self.author.clone())
    }
}

/// Types that carry a provenance URL usable as a merge key.
pub trait ProvenanceKey {
    fn provenance_key(&self) -> &str;
}

impl ProvenanceKey for ActivityRecord {
    fn provenance_key(&self) -> &str {
        &self.provenance
    }
}

impl ProvenanceKey for PullRequest {
    fn provenance_key(&self) -> &str {
        &self.url
    }
}

impl ProvenanceKey for Issue {
    fn provenance_key(&self) -> &str {
        &self.url
    }
}

impl ProvenanceKey for Comment {
    fn provenance_key(&self) -> &str {
        &self.url
    }
}

impl ProvenanceKey for Repository {
    fn provenance_key(&self) -> &str {
        &self.html_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_record_builders() {
        let record = ActivityRecord::new(ts(), SourceKind::Commit, "https://github.com/a/b/commit/1")
            .with_repository("a/b")
            .with_author(Some("octocat".to_string()))
            .with_utc_offset(Some(7200));

        assert_eq!(record.kind(), SourceKind::Commit);
        assert_eq!(record.repository(), Some("a/b"));
        assert_eq!(record.author(), Some("octocat"));
        assert_eq!(record.utc_offset_seconds(), Some(7200));
        assert_eq!(record.provenance_key(), "https://github.com/a/b/commit/1");
    }

    #[test]
    fn test_empty_repository_and_author_normalize_to_none() {
        let record = ActivityRecord::new(ts(), SourceKind::Event, "x")
            .with_repository("")
            .with_author(Some(String::new()));
        assert_eq!(record.repository(), None);
        assert_eq!(record.author(), None);
    }

    #[test]
    fn test_pull_request_to_record() {
        let pr = PullRequest {
            number: 42,
            title: "Fix".to_string(),
            url: "https://github.com/acme/widget/pull/42".to_string(),
            repository: "acme/widget".to_string(),
            state: "MERGED".to_string(),
            author: Some("octocat".to_string()),
            created_at: ts(),
            updated_at: None,
            closed_at: None,
            merged_at: None,
        };
        let record = pr.to_record();
        assert_eq!(record.kind(), SourceKind::PullRequest);
        assert_eq!(record.timestamp(), ts());
        assert_eq!(record.repository(), Some("acme/widget"));
    }

    #[test]
    fn test_source_kind_serializes_snake_case() {
        let json = serde_json::to_string(&SourceKind::PullRequest).unwrap();
        assert_eq!(json, "\"pull_request\"");
        assert_eq!(SourceKind::Star.to_string(), "star");
    }
}
