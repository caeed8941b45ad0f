//! Graph-query surface.
//!
//! One query document serves both the initial call (profile, first page of
//! pull requests, issues and comments) and every continuation call (only
//! the connections that still have pages). `@include` directives switch
//! parts on and off; the login and cursors are always bound variables.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::client::ApiClient;
use crate::error::{ActivityError, Result};
use crate::model::{Comment, Issue, Profile, PullRequest};
use crate::normalize::convert::{
    comment_from_graph, issue_from_graph, profile_from_graph, pull_request_from_graph,
};
use crate::normalize::types::{Connection, GraphResponse, GraphUser, GraphUserData};
use crate::pagination::{CursorPageSource, PageCursor, StreamPage, StreamRequest};

/// Stream index of the pull request connection.
pub const PULL_REQUEST_STREAM: usize = 0;
/// Stream index of the issue connection.
pub const ISSUE_STREAM: usize = 1;
/// Number of adaptively paginated connections.
pub const STREAM_COUNT: usize = 2;

/// Largest page a connection accepts.
const MAX_GRAPH_PAGE: u32 = 100;

const ACTIVITY_QUERY: &str = r#"
query UserActivity(
  $login: String!
  $perPage: Int!
  $prAfter: String
  $issueAfter: String
  $withProfile: Boolean!
  $withPullRequests: Boolean!
  $withIssues: Boolean!
  $withComments: Boolean!
) {
  user(login: $login) {
    login
    ...ProfileFields @include(if: $withProfile)
    pullRequests(first: $perPage, after: $prAfter, orderBy: {field: CREATED_AT, direction: DESC}) @include(if: $withPullRequests) {
      pageInfo { hasNextPage endCursor }
      nodes {
        number title url state createdAt updatedAt closedAt mergedAt
        repository { nameWithOwner }
        author { login }
      }
    }
    issues(first: $perPage, after: $issueAfter, orderBy: {field: CREATED_AT, direction: DESC}) @include(if: $withIssues) {
      pageInfo { hasNextPage endCursor }
      nodes {
        number title url state createdAt updatedAt closedAt
        repository { nameWithOwner }
        author { login }
      }
    }
    issueComments(first: $perPage, orderBy: {field: UPDATED_AT, direction: DESC}) @include(if: $withComments) {
      pageInfo { hasNextPage endCursor }
      nodes {
        url createdAt updatedAt bodyText
        repository { nameWithOwner }
        author { login }
      }
    }
  }
}

fragment ProfileFields on User {
  name bio company location websiteUrl twitterUsername url createdAt updatedAt
  repositories(ownerAffiliations: OWNER) { totalCount }
  followers { totalCount }
}
"#;

/// Item of either paginated connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphItem {
    PullRequest(PullRequest),
    Issue(Issue),
}

/// Everything the initial graph call returns.
#[derive(Debug)]
pub struct InitialGraphPage {
    pub profile: Profile,
    /// First page of each paginated connection, indexed by stream.
    pub first_pages: Vec<StreamPage<GraphItem>>,
    pub comments: Vec<Comment>,
}

/// Authenticated graph client for one subject.
pub struct GraphClient {
    client: ApiClient,
    login: String,
    per_page: u32,
    web_prefix: String,
}

impl GraphClient {
    /// Fails with [`ActivityError::AuthRequired`] without a credential: the
    /// graph endpoint rejects anonymous requests.
    pub fn new(client: &ApiClient, login: &str) -> Result<Self> {
        if !client.context().is_authenticated() {
            return Err(ActivityError::AuthRequired);
        }
        let config = client.context().config();
        Ok(Self {
            client: client.clone(),
            login: login.to_string(),
            per_page: config.pagination.per_page.clamp(1, MAX_GRAPH_PAGE),
            web_prefix: config.endpoints.web_prefix(),
        })
    }

    /// Profile plus the first page of every connection.
    pub async fn fetch_initial(&self) -> Result<InitialGraphPage> {
        let user = self
            .query(json!({
                "login": self.login,
                "perPage": self.per_page,
                "prAfter": null,
                "issueAfter": null,
                "withProfile": true,
                "withPullRequests": true,
                "withIssues": true,
                "withComments": true,
            }))
            .await?;

        let profile = profile_from_graph(&user);
        let web_prefix = self.web_prefix.as_str();
        let comments = user
            .issue_comments
            .map(|conn| {
                conn.nodes
                    .into_iter()
                    .flatten()
                    .map(|c| comment_from_graph(c, web_prefix))
                    .collect()
            })
            .unwrap_or_default();

        let mut first_pages = Vec::with_capacity(STREAM_COUNT);
        if let Some(conn) = user.pull_requests {
            first_pages.push(stream_page(PULL_REQUEST_STREAM, conn, |pr| {
                GraphItem::PullRequest(pull_request_from_graph(pr, web_prefix))
            }));
        }
        if let Some(conn) = user.issues {
            first_pages.push(stream_page(ISSUE_STREAM, conn, |issue| {
                GraphItem::Issue(issue_from_graph(issue, web_prefix))
            }));
        }

        Ok(InitialGraphPage {
            profile,
            first_pages,
            comments,
        })
    }

    /// Profile only, without any connection.
    pub async fn fetch_profile(&self) -> Result<Profile> {
        let user = self
            .query(json!({
                "login": self.login,
                "perPage": self.per_page,
                "prAfter": null,
                "issueAfter": null,
                "withProfile": true,
                "withPullRequests": false,
                "withIssues": false,
                "withComments": false,
            }))
            .await?;
        Ok(profile_from_graph(&user))
    }

    async fn query(&self, variables: Value) -> Result<GraphUser> {
        let url = self.client.context().config().endpoints.graphql_url.clone();
        let body = json!({ "query": ACTIVITY_QUERY, "variables": variables });
        let response: GraphResponse<GraphUserData> = self.client.post_json(&url, &body).await?;

        if !response.errors.is_empty() {
            return Err(ActivityError::GraphErrorList {
                messages: response.errors.into_iter().map(|e| e.message).collect(),
            });
        }
        response
            .data
            .and_then(|data| data.user)
            .ok_or_else(|| ActivityError::protocol(404, format!("user {} not found", self.login)))
    }
}

fn stream_page<N>(
    stream: usize,
    conn: Connection<N>,
    convert: impl Fn(N) -> GraphItem,
) -> StreamPage<GraphItem> {
    StreamPage {
        stream,
        items: conn.nodes.into_iter().flatten().map(convert).collect(),
        cursor: PageCursor::from_page_info(conn.page_info.has_next_page, conn.page_info.end_cursor),
    }
}

#[async_trait]
impl CursorPageSource for GraphClient {
    type Item = GraphItem;

    async fn fetch_streams(&self, requests: &[StreamRequest]) -> Result<Vec<StreamPage<GraphItem>>> {
        let after = |stream: usize| {
            requests
                .iter()
                .find(|r| r.stream == stream)
                .map(|r| r.after.clone())
        };
        let pr_after = after(PULL_REQUEST_STREAM);
        let issue_after = after(ISSUE_STREAM);

        let user = self
            .query(json!({
                "login": self.login,
                "perPage": self.per_page,
                "prAfter": pr_after.clone().flatten(),
                "issueAfter": issue_after.clone().flatten(),
                "withProfile": false,
                "withPullRequests": pr_after.is_some(),
                "withIssues": issue_after.is_some(),
                "withComments": false,
            }))
            .await?;

        let web_prefix = self.web_prefix.as_str();
        let mut pages = Vec::with_capacity(requests.len());
        if pr_after.is_some()
            && let Some(conn) = user.pull_requests
        {
            pages.push(stream_page(PULL_REQUEST_STREAM, conn, |pr| {
                GraphItem::PullRequest(pull_request_from_graph(pr, web_prefix))
            }));
        }
        if issue_after.is_some()
            && let Some(conn) = user.issues
        {
            pages.push(stream_page(ISSUE_STREAM, conn, |issue| {
                GraphItem::Issue(issue_from_graph(issue, web_prefix))
            }));
        }
        Ok(pages)
    }
}
