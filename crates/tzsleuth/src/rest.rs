//! REST surface: page-number sources for every paged endpoint.
//!
//! Each endpoint is a [`RestPageSource`] configured with a route function,
//! the media type to request and the envelope shape, so the offset and
//! parallel engines can drive any of them.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::client::{ACCEPT_JSON, ApiClient};
use crate::error::Result;
use crate::model::Profile;
use crate::normalize::convert::profile_from_rest;
use crate::normalize::types::{
    RestEvent, RestGist, RestRepo, RestStar, RestUser, SearchCommitItem, SearchIssueItem,
    SearchPage,
};
use crate::pagination::OffsetPageSource;

/// Media type that adds `starred_at` to starred items.
pub const ACCEPT_STAR: &str = "application/vnd.github.star+json";

/// Which search qualifier selects issues vs pull requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    PullRequest,
    Issue,
}

impl IssueKind {
    fn qualifier(self) -> &'static str {
        match self {
            IssueKind::PullRequest => "type:pr",
            IssueKind::Issue => "type:issue",
        }
    }
}

/// Response envelope of a paged endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageShape {
    /// The body is a JSON array of items.
    Array,
    /// The body is a search envelope with an `items` array.
    SearchItems,
}

/// A paged REST endpoint.
pub struct RestPageSource<T> {
    client: ApiClient,
    /// Builds the full URL for `(page, per_page)`.
    route_fn: Box<dyn Fn(u32, u32) -> String + Send + Sync>,
    accept: &'static str,
    shape: PageShape,
    _marker: PhantomData<fn() -> T>,
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

impl<T> RestPageSource<T> {
    fn new(
        client: &ApiClient,
        route_fn: impl Fn(u32, u32) -> String + Send + Sync + 'static,
        accept: &'static str,
        shape: PageShape,
    ) -> Self {
        Self {
            client: client.clone(),
            route_fn: Box::new(route_fn),
            accept,
            shape,
            _marker: PhantomData,
        }
    }

    /// URL for a page, for logging and tests.
    pub fn route(&self, page: u32, per_page: u32) -> String {
        (self.route_fn)(page, per_page)
    }
}

fn api_route(client: &ApiClient, path: String) -> impl Fn(u32, u32) -> String + Send + Sync + 'static {
    let base = client.context().config().endpoints.api_url(&path);
    let sep = if base.contains('?') { '&' } else { '?' };
    move |page, per_page| format!("{base}{sep}per_page={per_page}&page={page}")
}

impl RestPageSource<RestEvent> {
    /// `GET /users/{login}/events/public`.
    pub fn events(client: &ApiClient, login: &str) -> Self {
        let route = api_route(client, format!("/users/{login}/events/public"));
        Self::new(client, route, ACCEPT_JSON, PageShape::Array)
    }
}

impl RestPageSource<SearchCommitItem> {
    /// `GET /search/commits?q=author:{login}`, newest first.
    pub fn commits(client: &ApiClient, login: &str) -> Self {
        let query = encode(&format!("author:{login}"));
        let route = api_route(
            client,
            format!("/search/commits?q={query}&sort=author-date&order=desc"),
        );
        Self::new(client, route, ACCEPT_JSON, PageShape::SearchItems)
    }
}

impl RestPageSource<SearchIssueItem> {
    /// `GET /search/issues?q=author:{login} type:pr|type:issue`, newest first.
    pub fn search_issues(client: &ApiClient, login: &str, kind: IssueKind) -> Self {
        let query = encode(&format!("author:{login} {}", kind.qualifier()));
        let route = api_route(
            client,
            format!("/search/issues?q={query}&sort=created&order=desc"),
        );
        Self::new(client, route, ACCEPT_JSON, PageShape::SearchItems)
    }
}

impl RestPageSource<RestGist> {
    pub fn gists(client: &ApiClient, login: &str) -> Self {
        let route = api_route(client, format!("/users/{login}/gists"));
        Self::new(client, route, ACCEPT_JSON, PageShape::Array)
    }
}

impl RestPageSource<RestStar> {
    /// Starred repositories with star timestamps.
    pub fn starred(client: &ApiClient, login: &str) -> Self {
        let route = api_route(client, format!("/users/{login}/starred"));
        Self::new(client, route, ACCEPT_STAR, PageShape::Array)
    }
}

impl RestPageSource<RestRepo> {
    /// Owned repositories, most recently pushed first.
    pub fn repos(client: &ApiClient, login: &str) -> Self {
        let route = api_route(
            client,
            format!("/users/{login}/repos?type=owner&sort=pushed&direction=desc"),
        );
        Self::new(client, route, ACCEPT_JSON, PageShape::Array)
    }
}

impl<T> RestPageSource<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Fetch one page of a search endpoint with its envelope.
    pub async fn fetch_search_page(&self, page: u32, per_page: u32) -> Result<SearchPage<T>> {
        let url = self.route(page, per_page);
        self.client.get_json(&url, self.accept).await
    }
}

#[async_trait]
impl<T> OffsetPageSource for RestPageSource<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Item = T;

    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<Vec<T>> {
        let url = self.route(page, per_page);
        match self.shape {
            PageShape::Array => self.client.get_json(&url, self.accept).await,
            PageShape::SearchItems => Ok(self
                .client
                .get_json::<SearchPage<T>>(&url, self.accept)
                .await?
                .items),
        }
    }
}

/// `GET /users/{login}`.
pub async fn get_user(client: &ApiClient, login: &str) -> Result<Profile> {
    let url = client
        .context()
        .config()
        .endpoints
        .api_url(&format!("/users/{login}"));
    let user: RestUser = client.get_json(&url, ACCEPT_JSON).await?;
    Ok(profile_from_rest(user))
}
