//! Decoded per-endpoint payload schemas.
//!
//! Each endpoint gets an explicit schema decoded once at the boundary. Fields
//! the aggregator never reads are left out; serde ignores them.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;

/// Minimal account reference (`{"login": ...}`).
#[derive(Debug, Clone, Deserialize)]
pub struct RestActor {
    pub login: String,
}

/// `GET /users/{login}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RestUser {
    pub login: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub blog: Option<String>,
    pub twitter_username: Option<String>,
    #[serde(default)]
    pub html_url: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub public_repos: Option<u32>,
    pub followers: Option<u32>,
}

// ---------- Events ----------

/// `GET /users/{login}/events/public` item.
#[derive(Debug, Clone, Deserialize)]
pub struct RestEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub actor: Option<RestActor>,
    pub repo: EventRepo,
    #[serde(default)]
    pub payload: EventPayload,
    pub created_at: DateTime<Utc>,
}

/// Event repository reference; `name` is `owner/name`.
#[derive(Debug, Clone, Deserialize)]
pub struct EventRepo {
    pub name: String,
}

/// Union of the payload fields the normalizer reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPayload {
    pub action: Option<String>,
    #[serde(default)]
    pub commits: Vec<PushCommit>,
    pub pull_request: Option<PayloadPullRequest>,
    pub issue: Option<PayloadIssue>,
    pub comment: Option<PayloadComment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushCommit {
    pub sha: String,
    pub author: Option<PushCommitAuthor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushCommitAuthor {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayloadPullRequest {
    pub number: u64,
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayloadIssue {
    pub number: u64,
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayloadComment {
    pub html_url: String,
    pub body: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

// ---------- Search ----------

/// Envelope of every search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage<T> {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// `GET /search/commits` item.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchCommitItem {
    pub sha: String,
    pub html_url: String,
    pub commit: CommitDetail,
    pub author: Option<RestActor>,
    pub repository: Option<SearchCommitRepo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    pub author: Option<CommitSignature>,
    pub committer: Option<CommitSignature>,
}

/// Git signature. The date keeps the author's own UTC offset.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitSignature {
    pub name: Option<String>,
    pub date: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchCommitRepo {
    pub full_name: String,
}

/// `GET /search/issues` item (issues and pull requests).
#[derive(Debug, Clone, Deserialize)]
pub struct SearchIssueItem {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub state: String,
    pub user: Option<RestActor>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub pull_request: Option<SearchPullRequestRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchPullRequestRef {
    pub merged_at: Option<DateTime<Utc>>,
}

// ---------- Gists, stars, repositories ----------

#[derive(Debug, Clone, Deserialize)]
pub struct RestGist {
    pub id: String,
    pub html_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub owner: Option<RestActor>,
}

/// Starred item under `application/vnd.github.star+json`.
#[derive(Debug, Clone, Deserialize)]
pub struct RestStar {
    pub starred_at: DateTime<Utc>,
    pub repo: RestRepo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestRepo {
    pub full_name: String,
    pub html_url: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fork: bool,
    pub language: Option<String>,
}

// ---------- Graph ----------

/// Graph response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphResponse<T> {
    pub data: Option<T>,
    #[serde(default = "Vec::new")]
    pub errors: Vec<GraphErrorEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphErrorEntry {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphUserData {
    pub user: Option<GraphUser>,
}

/// The `user(login: $login)` node. Connections are present only when the
/// query included them.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphUser {
    pub login: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub website_url: Option<String>,
    pub twitter_username: Option<String>,
    #[serde(default)]
    pub url: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub repositories: Option<TotalCount>,
    pub followers: Option<TotalCount>,
    pub pull_requests: Option<Connection<GraphPullRequest>>,
    pub issues: Option<Connection<GraphIssue>>,
    pub issue_comments: Option<Connection<GraphComment>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalCount {
    pub total_count: u32,
}

/// A cursor-paginated connection. Nodes may be null (deleted content).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub page_info: PageInfo,
    #[serde(default = "Vec::new")]
    pub nodes: Vec<Option<T>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphRepoRef {
    pub name_with_owner: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphActor {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphPullRequest {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
    pub repository: Option<GraphRepoRef>,
    pub author: Option<GraphActor>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphIssue {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub repository: Option<GraphRepoRef>,
    pub author: Option<GraphActor>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphComment {
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub body_text: Option<String>,
    pub repository: Option<GraphRepoRef>,
    pub author: Option<GraphActor>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use serde_json::json;

    #[test]
    fn test_event_without_payload_decodes() {
        let event: RestEvent = serde_json::from_value(json!({
            "id": "1",
            "type": "WatchEvent",
            "actor": {"login": "octocat"},
            "repo": {"name": "acme/widget"},
            "created_at": "2024-01-02T03:04:05Z"
        }))
        .unwrap();
        assert_eq!(event.kind, "WatchEvent");
        assert!(event.payload.commits.is_empty());
    }

    #[test]
    fn test_commit_date_keeps_author_offset() {
        let item: SearchCommitItem = serde_json::from_value(json!({
            "sha": "abc",
            "html_url": "https://github.com/acme/widget/commit/abc",
            "commit": {
                "author": {"name": "Octo", "date": "2024-05-01T09:30:00.000-07:00"},
                "committer": null
            },
            "author": {"login": "octocat"},
            "repository": {"full_name": "acme/widget"}
        }))
        .unwrap();
        let date = item.commit.author.unwrap().date.unwrap();
        assert_eq!(date.offset().local_minus_utc(), -7 * 3600);
        assert_eq!(date.with_timezone(&Utc).hour(), 16);
    }

    #[test]
    fn test_graph_connection_with_null_nodes() {
        let conn: Connection<GraphActor> = serde_json::from_value(json!({
            "pageInfo": {"hasNextPage": true, "endCursor": "Y3Vyc29y"},
            "nodes": [{"login": "a"}, null]
        }))
        .unwrap();
        assert!(conn.page_info.has_next_page);
        assert_eq!(conn.nodes.len(), 2);
        assert!(conn.nodes[1].is_none());
    }

    #[test]
    fn test_graph_response_errors_default_empty() {
        let resp: GraphResponse<GraphUserData> =
            serde_json::from_value(json!({"data": {"user": null}})).unwrap();
        assert!(resp.errors.is_empty());
        assert!(resp.data.unwrap().user.is_none());
    }

    #[test]
    fn test_search_page_defaults() {
        let page: SearchPage<SearchIssueItem> = serde_json::from_value(json!({})).unwrap();
        assert_eq!(page.total_count, 0);
        assert!(page.items.is_empty());
    }
}
