//! Conversion from decoded payloads to canonical records and projections.
//!
//! `web_prefix` is the web root with a single trailing slash
//! (`https://github.com/`). It is used both to build permalinks that match
//! what the API returns elsewhere and to pull repository identities out of
//! those permalinks.

use chrono::Utc;

use super::types::{
    GraphComment, GraphIssue, GraphPullRequest, GraphUser, RestEvent, RestGist, RestRepo,
    RestStar, RestUser, SearchCommitItem, SearchIssueItem,
};
use crate::model::{
    ActivityRecord, Comment, Issue, Profile, PullRequest, Repository, SourceKind,
};

/// Longest comment excerpt kept on a [`Comment`].
pub const MAX_EXCERPT_CHARS: usize = 120;

/// Extract `owner/name` from a permalink under `base`.
///
/// Returns an empty string when the URL does not start with `base` or has
/// fewer than two path segments after it.
///
/// ```
/// use tzsleuth::normalize::extract_repository;
///
/// assert_eq!(
///     extract_repository("https://github.com/acme/widget/pull/42", "https://github.com/"),
///     "acme/widget"
/// );
/// assert_eq!(extract_repository("https://github.com/acme", "https://github.com/"), "");
/// ```
pub fn extract_repository(url: &str, base: &str) -> String {
    let Some(rest) = url.strip_prefix(base) else {
        return String::new();
    };
    let mut segments = rest
        .split(['/', '?', '#'])
        .take_while(|s| !s.is_empty());
    match (segments.next(), segments.next()) {
        (Some(owner), Some(name)) => format!("{owner}/{name}"),
        _ => String::new(),
    }
}

/// First line of a body, cut to [`MAX_EXCERPT_CHARS`].
pub fn excerpt(body: &str) -> Option<String> {
    let line = body.lines().map(str::trim).find(|l| !l.is_empty())?;
    Some(match line.char_indices().nth(MAX_EXCERPT_CHARS) {
        Some((idx, _)) => format!("{}...", &line[..idx]),
        None => line.to_string(),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ---------- Profile ----------

pub fn profile_from_rest(user: RestUser) -> Profile {
    Profile {
        login: user.login,
        name: non_empty(user.name),
        bio: non_empty(user.bio),
        company: non_empty(user.company),
        location: non_empty(user.location),
        website: non_empty(user.blog),
        twitter_username: non_empty(user.twitter_username),
        html_url: user.html_url,
        created_at: user.created_at,
        updated_at: user.updated_at,
        public_repos: user.public_repos,
        followers: user.followers,
    }
}

pub fn profile_from_graph(user: &GraphUser) -> Profile {
    Profile {
        login: user.login.clone(),
        name: non_empty(user.name.clone()),
        bio: non_empty(user.bio.clone()),
        company: non_empty(user.company.clone()),
        location: non_empty(user.location.clone()),
        website: non_empty(user.website_url.clone()),
        twitter_username: non_empty(user.twitter_username.clone()),
        html_url: user.url.clone(),
        created_at: user.created_at,
        updated_at: user.updated_at,
        public_repos: user.repositories.as_ref().map(|c| c.total_count),
        followers: user.followers.as_ref().map(|c| c.total_count),
    }
}

// ---------- Pull requests, issues, comments ----------

/// Repository identity from a structured field, or from the permalink.
fn repository_or_extract(structured: Option<String>, url: &str, web_prefix: &str) -> String {
    structured
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| extract_repository(url, web_prefix))
}

pub fn pull_request_from_graph(pr: GraphPullRequest, web_prefix: &str) -> PullRequest {
    let repository = repository_or_extract(
        pr.repository.map(|r| r.name_with_owner),
        &pr.url,
        web_prefix,
    );
    PullRequest {
        number: pr.number,
        title: pr.title,
        url: pr.url,
        repository,
        state: pr.state,
        author: pr.author.map(|a| a.login),
        created_at: pr.created_at,
        updated_at: pr.updated_at,
        closed_at: pr.closed_at,
        merged_at: pr.merged_at,
    }
}

pub fn issue_from_graph(issue: GraphIssue, web_prefix: &str) -> Issue {
    let repository = repository_or_extract(
        issue.repository.map(|r| r.name_with_owner),
        &issue.url,
        web_prefix,
    );
    Issue {
        number: issue.number,
        title: issue.title,
        url: issue.url,
        repository,
        state: issue.state,
        author: issue.author.map(|a| a.login),
        created_at: issue.created_at,
        updated_at: issue.updated_at,
        closed_at: issue.closed_at,
    }
}

pub fn comment_from_graph(comment: GraphComment, web_prefix: &str) -> Comment {
    let repository = repository_or_extract(
        comment.repository.map(|r| r.name_with_owner),
        &comment.url,
        web_prefix,
    );
    Comment {
        excerpt: comment.body_text.as_deref().and_then(excerpt),
        url: comment.url,
        repository,
        author: comment.author.map(|a| a.login),
        created_at: comment.created_at,
        updated_at: comment.updated_at,
    }
}

pub fn pull_request_from_search(item: SearchIssueItem, web_prefix: &str) -> PullRequest {
    let repository = extract_repository(&item.html_url, web_prefix);
    let merged_at = item.pull_request.and_then(|pr| pr.merged_at);
    PullRequest {
        number: item.number,
        title: item.title,
        url: item.html_url,
        repository,
        state: item.state,
        author: item.user.map(|u| u.login),
        created_at: item.created_at,
        updated_at: item.updated_at,
        closed_at: item.closed_at,
        merged_at,
    }
}

pub fn issue_from_search(item: SearchIssueItem, web_prefix: &str) -> Issue {
    let repository = extract_repository(&item.html_url, web_prefix);
    Issue {
        number: item.number,
        title: item.title,
        url: item.html_url,
        repository,
        state: item.state,
        author: item.user.map(|u| u.login),
        created_at: item.created_at,
        updated_at: item.updated_at,
        closed_at: item.closed_at,
    }
}

// ---------- Commits, gists, stars, repositories ----------

/// Commit search hit to a record, keeping the author's UTC offset.
///
/// Falls back to the committer date; hits with neither are dropped.
pub fn commit_record(item: SearchCommitItem, web_prefix: &str) -> Option<ActivityRecord> {
    let date = item
        .commit
        .author
        .as_ref()
        .and_then(|a| a.date)
        .or_else(|| item.commit.committer.as_ref().and_then(|c| c.date))?;
    let repository = item
        .repository
        .map(|r| r.full_name)
        .unwrap_or_else(|| extract_repository(&item.html_url, web_prefix));
    let author = item
        .author
        .map(|a| a.login)
        .or_else(|| item.commit.author.and_then(|a| a.name));

    Some(
        ActivityRecord::new(date.with_timezone(&Utc), SourceKind::Commit, item.html_url)
            .with_repository(repository)
            .with_author(author)
            .with_utc_offset(Some(date.offset().local_minus_utc())),
    )
}

pub fn gist_record(gist: RestGist) -> ActivityRecord {
    ActivityRecord::new(gist.created_at, SourceKind::Gist, gist.html_url)
        .with_author(gist.owner.map(|o| o.login))
}

/// Star to a record. Stars have no permalink of their own, so the key is
/// the stargazers page qualified by the subject.
pub fn star_record(star: RestStar, login: &str) -> ActivityRecord {
    let key = format!(
        "{}/stargazers#{}",
        star.repo.html_url.trim_end_matches('/'),
        login
    );
    ActivityRecord::new(star.starred_at, SourceKind::Star, key)
        .with_repository(star.repo.full_name)
        .with_author(Some(login.to_string()))
}

pub fn repository_from_rest(repo: RestRepo) -> Repository {
    Repository {
        full_name: repo.full_name,
        html_url: repo.html_url,
        created_at: repo.created_at,
        updated_at: repo.updated_at,
        pushed_at: repo.pushed_at,
        is_fork: repo.fork,
        language: non_empty(repo.language),
    }
}

// ---------- Events ----------

/// Records and comment projections derived from one event.
#[derive(Debug, Default)]
pub struct EventConversion {
    pub records: Vec<ActivityRecord>,
    pub comments: Vec<Comment>,
}

const COMMENT_EVENTS: &[&str] = &[
    "IssueCommentEvent",
    "PullRequestReviewCommentEvent",
    "CommitCommentEvent",
];

/// Map one public event to canonical records.
///
/// Pushes expand to one commit record per pushed commit, keyed by the web
/// commit URL so they merge with commit search hits. Opened pull requests
/// and issues are keyed by their permalink; comments by the comment URL.
/// Anything else becomes a generic event record.
pub fn event_records(event: RestEvent, web_prefix: &str) -> EventConversion {
    let repo = event.repo.name.clone();
    let actor = event.actor.as_ref().map(|a| a.login.clone());
    let action = event.payload.action.as_deref();
    let mut out = EventConversion::default();

    match event.kind.as_str() {
        "PushEvent" if !event.payload.commits.is_empty() => {
            for commit in &event.payload.commits {
                let url = format!("{web_prefix}{repo}/commit/{}", commit.sha);
                out.records.push(
                    ActivityRecord::new(event.created_at, SourceKind::Commit, url)
                        .with_repository(repo.as_str())
                        .with_author(
                            actor
                                .clone()
                                .or_else(|| commit.author.as_ref().and_then(|a| a.name.clone())),
                        ),
                );
            }
        }
        "PullRequestEvent" if action == Some("opened") => {
            if let Some(pr) = &event.payload.pull_request {
                let url = pr
                    .html_url
                    .clone()
                    .unwrap_or_else(|| format!("{web_prefix}{repo}/pull/{}", pr.number));
                out.records.push(
                    ActivityRecord::new(event.created_at, SourceKind::PullRequest, url)
                        .with_repository(repo.as_str())
                        .with_author(actor),
                );
            } else {
                out.records.push(generic_event_record(&event, web_prefix));
            }
        }
        "IssuesEvent" if action == Some("opened") => {
            if let Some(issue) = &event.payload.issue {
                let url = issue
                    .html_url
                    .clone()
                    .unwrap_or_else(|| format!("{web_prefix}{repo}/issues/{}", issue.number));
                out.records.push(
                    ActivityRecord::new(event.created_at, SourceKind::Issue, url)
                        .with_repository(repo.as_str())
                        .with_author(actor),
                );
            } else {
                out.records.push(generic_event_record(&event, web_prefix));
            }
        }
        kind if COMMENT_EVENTS.contains(&kind) && event.payload.comment.is_some() => {
            if let Some(comment) = &event.payload.comment {
                let created_at = comment.created_at.unwrap_or(event.created_at);
                out.records.push(
                    ActivityRecord::new(created_at, SourceKind::Comment, comment.html_url.as_str())
                        .with_repository(repo.as_str())
                        .with_author(actor.clone()),
                );
                out.comments.push(Comment {
                    url: comment.html_url.clone(),
                    repository: repo.clone(),
                    author: actor,
                    created_at,
                    updated_at: comment.updated_at,
                    excerpt: comment.body.as_deref().and_then(excerpt),
                });
            }
        }
        _ => out.records.push(generic_event_record(&event, web_prefix)),
    }

    out
}

fn generic_event_record(event: &RestEvent, web_prefix: &str) -> ActivityRecord {
    let url = format!("{web_prefix}{}#event-{}", event.repo.name, event.id);
    ActivityRecord::new(event.created_at, SourceKind::Event, url)
        .with_repository(event.repo.name.as_str())
        .with_author(event.actor.as_ref().map(|a| a.login.clone()))
}
