//! Request execution shared by the REST, graph and scrape paths.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::context::ClientContext;
use crate::error::{ActivityError, Result};
use crate::http::{HttpHeaders, HttpMethod, HttpRequest, HttpResponse};

/// REST API version pinned on every API request.
pub const API_VERSION: &str = "2022-11-28";
/// Default media type for REST requests.
pub const ACCEPT_JSON: &str = "application/vnd.github+json";
/// Longest error body excerpt kept in a protocol error.
const MAX_ERROR_MESSAGE_LEN: usize = 200;

/// Request counters for one aggregation call.
#[derive(Debug, Default)]
pub struct FetchStats {
    requests: AtomicU64,
    cache_hits: AtomicU64,
    failures: AtomicU64,
}

/// Point-in-time copy of [`FetchStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FetchStatsSnapshot {
    pub requests: u64,
    pub cache_hits: u64,
    pub failures: u64,
}

impl FetchStatsSnapshot {
    /// Cache hit ratio (0.0 when nothing was requested).
    pub fn hit_ratio(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.requests as f64
        }
    }
}

impl FetchStats {
    pub fn snapshot(&self) -> FetchStatsSnapshot {
        FetchStatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Call-scoped request executor.
///
/// Cheap to clone: the context, counters and cancellation token are shared.
#[derive(Clone)]
pub struct ApiClient {
    ctx: Arc<ClientContext>,
    cancel: CancellationToken,
    stats: Arc<FetchStats>,
}

impl ApiClient {
    pub fn new(ctx: Arc<ClientContext>, cancel: CancellationToken) -> Self {
        Self {
            ctx,
            cancel,
            stats: Arc::new(FetchStats::default()),
        }
    }

    pub fn context(&self) -> &ClientContext {
        &self.ctx
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn stats(&self) -> FetchStatsSnapshot {
        self.stats.snapshot()
    }

    /// GET a JSON document from the API.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, accept: &str) -> Result<T> {
        let request = HttpRequest {
            method: HttpMethod::Get,
            url: url.to_string(),
            headers: self.api_headers(accept),
            body: Vec::new(),
            max_body_bytes: None,
        };
        let response = self.execute(request).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// POST a JSON body to the API and decode the JSON reply.
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let mut headers = self.api_headers("application/json");
        headers.push(("Content-Type".to_string(), "application/json".to_string()));
        let request = HttpRequest {
            method: HttpMethod::Post,
            url: url.to_string(),
            headers,
            body: serde_json::to_vec(body)?,
            max_body_bytes: None,
        };
        let response = self.execute(request).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// GET a web page as text, keeping at most the first `max_bytes`.
    ///
    /// The transport is asked to stop reading at the limit; the body is cut
    /// again here for transports that buffer everything. A cut through a
    /// multi-byte character decodes lossily. Never carries the credential:
    /// web pages are public.
    pub async fn get_text_bounded(&self, url: &str, max_bytes: usize) -> Result<String> {
        let request = HttpRequest {
            method: HttpMethod::Get,
            url: url.to_string(),
            headers: vec![
                ("Accept".to_string(), "text/html".to_string()),
                (
                    "User-Agent".to_string(),
                    self.ctx.config().endpoints.user_agent.clone(),
                ),
            ],
            body: Vec::new(),
            max_body_bytes: Some(max_bytes),
        };
        let mut body = self.execute(request).await?.body;
        if body.len() > max_bytes {
            tracing::debug!(url, received = body.len(), max_bytes, "Truncating page body");
            body.truncate(max_bytes);
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    fn api_headers(&self, accept: &str) -> HttpHeaders {
        let mut headers = vec![
            ("Accept".to_string(), accept.to_string()),
            (
                "User-Agent".to_string(),
                self.ctx.config().endpoints.user_agent.clone(),
            ),
            ("X-GitHub-Api-Version".to_string(), API_VERSION.to_string()),
        ];
        if let Some(credential) = self.ctx.credential() {
            headers.push(("Authorization".to_string(), credential.bearer()));
        }
        headers
    }

    /// Send one request: pace, honor cancellation, classify the status.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        if let Some(limiter) = self.ctx.rate_limiter() {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(ActivityError::Cancelled),
                _ = limiter.wait() => {}
            }
        }

        let method = request.method;
        let url = request.url.clone();
        self.stats.requests.fetch_add(1, Ordering::Relaxed);

        let sent = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(ActivityError::Cancelled),
            sent = self.ctx.transport().send(request) => sent,
        };
        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                return Err(e.into());
            }
        };

        if response.is_cache_hit() {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
        }
        tracing::debug!(
            method = method.as_str(),
            url = %url,
            status = response.status,
            cache_hit = response.is_cache_hit(),
            "HTTP response"
        );

        if !response.is_success() {
            self.stats.failures.fetch_add(1, Ordering::Relaxed);
            return Err(ActivityError::protocol(
                response.status,
                error_message(&response.body),
            ));
        }

        Ok(response)
    }
}

/// Pull a readable message out of an error body.
///
/// API errors are `{"message": "..."}`; anything else is truncated text.
fn error_message(body: &[u8]) -> String {
    #[derive(serde::Deserialize)]
    struct ApiErrorBody {
        message: String,
    }

    if let Ok(parsed) = serde_json::from_slice::<ApiErrorBody>(body) {
        return parsed.message;
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    match text.char_indices().nth(MAX_ERROR_MESSAGE_LEN) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
