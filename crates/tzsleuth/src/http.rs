//! Transport seam for all outbound HTTP.
//!
//! The aggregator never talks to the network directly: every request goes
//! through an [`HttpTransport`], which may be a plain reqwest client or a
//! cache-aware executor supplied by the caller. The only thing the core
//! inspects beyond status, headers and body is whether the response was
//! served from a cache (see [`HttpResponse::is_cache_hit`]).

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// The two verbs the aggregator issues: REST and scrape reads are GETs,
/// GraphQL queries are POSTs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        if self == HttpMethod::Post { "POST" } else { "GET" }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered header pairs. Lookups through [`header_get`] ignore name case.
pub type HttpHeaders = Vec<(String, String)>;

/// Outbound request as handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
    /// Stop reading the response body after this many bytes. Transports
    /// that cannot stream may ignore it; callers truncate again.
    pub max_body_bytes: Option<usize>,
}

impl HttpRequest {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header_get(&self.headers, name)
    }
}

/// Fully buffered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpResponse {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header_get(&self.headers, name)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.status, 200..=299)
    }

    /// Whether a caching transport answered this request without going to
    /// the origin.
    ///
    /// Recognizes `X-From-Cache: 1` and `X-Cache: HIT` (prefix match, so
    /// `HIT from proxy` counts).
    #[must_use]
    pub fn is_cache_hit(&self) -> bool {
        match self.header("x-from-cache").map(str::trim) {
            Some(flag) => flag == "1" || flag.eq_ignore_ascii_case("true"),
            None => self.header("x-cache").is_some_and(|status| {
                status
                    .trim_start()
                    .get(..3)
                    .is_some_and(|prefix| prefix.eq_ignore_ascii_case("hit"))
            }),
        }
    }
}

#[derive(Debug, Error)]
pub enum HttpError {
    /// Connection, TLS, timeout or body read failure.
    #[error("http transport error: {0}")]
    Transport(String),

    #[error("no mock response registered for {method} {url}")]
    NoMockResponse { method: String, url: String },
}

/// Anything that can turn an [`HttpRequest`] into an [`HttpResponse`].
///
/// Implementations must be shareable across the tasks of a parallel fetch.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// First value for `name`, compared case-insensitively.
#[must_use]
pub fn header_get<'a>(headers: &'a HttpHeaders, name: &str) -> Option<&'a str> {
    headers.iter().find_map(|(key, value)| {
        key.eq_ignore_ascii_case(name).then_some(value.as_str())
    })
}

pub mod reqwest_transport {
    use std::time::Duration;

    use super::{HttpError, HttpHeaders, HttpMethod, HttpRequest, HttpResponse, HttpTransport};
    use async_trait::async_trait;

    impl From<reqwest::Error> for HttpError {
        fn from(err: reqwest::Error) -> Self {
            HttpError::Transport(err.to_string())
        }
    }

    /// [`HttpTransport`] over a shared `reqwest::Client`.
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new(client: reqwest::Client) -> Self {
            Self { client }
        }

        /// Build a client whose requests give up after `timeout`.
        pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
            let client = reqwest::Client::builder().timeout(timeout).build()?;
            Ok(Self::new(client))
        }

        fn prepare(&self, request: HttpRequest) -> reqwest::RequestBuilder {
            let verb = match request.method {
                HttpMethod::Get => reqwest::Method::GET,
                HttpMethod::Post => reqwest::Method::POST,
            };
            let builder = request
                .headers
                .iter()
                .fold(self.client.request(verb, &request.url), |b, (name, value)| {
                    b.header(name.as_str(), value.as_str())
                });
            if request.body.is_empty() {
                builder
            } else {
                builder.body(request.body)
            }
        }
    }

    /// Non-UTF-8 header values are kept as empty strings.
    fn copy_headers(map: &reqwest::header::HeaderMap) -> HttpHeaders {
        map.iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.to_str().map(str::to_owned).unwrap_or_default(),
                )
            })
            .collect()
    }

    /// Read at most `cap` body bytes, dropping the rest of the stream.
    async fn read_capped(reply: &mut reqwest::Response, cap: usize) -> Result<Vec<u8>, HttpError> {
        let mut body = Vec::new();
        while body.len() < cap {
            let Some(chunk) = reply.chunk().await? else {
                break;
            };
            let room = cap - body.len();
            body.extend_from_slice(&chunk[..chunk.len().min(room)]);
        }
        Ok(body)
    }

    #[async_trait]
    impl HttpTransport for ReqwestTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
            let cap = request.max_body_bytes;
            let mut reply = self.prepare(request).send().await?;
            let status = reply.status().as_u16();
            let headers = copy_headers(reply.headers());
            let body = match cap {
                Some(cap) => read_capped(&mut reply, cap).await?,
                None => reply.bytes().await?.to_vec(),
            };
            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}

#[cfg(test)]
pub use mock::{MockTransport, json_response};
