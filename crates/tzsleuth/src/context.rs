//! Session-wide client configuration.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use crate::config::AggregatorConfig;
use crate::credential::Credential;
use crate::error::{ActivityError, Result};
use crate::http::HttpTransport;
use crate::http::reqwest_transport::ReqwestTransport;
use crate::rate_limit::ApiRateLimiter;
use crate::scrape::{LinkExtractor, default_link_extractor};

/// Everything a request needs, built once per session and shared.
#[derive(Clone)]
pub struct ClientContext {
    credential: Option<Credential>,
    transport: Arc<dyn HttpTransport>,
    rate_limiter: Option<ApiRateLimiter>,
    config: Arc<AggregatorConfig>,
    link_extractor: Arc<dyn LinkExtractor>,
}

impl ClientContext {
    pub fn builder() -> ClientContextBuilder {
        ClientContextBuilder::default()
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub fn transport(&self) -> &dyn HttpTransport {
        self.transport.as_ref()
    }

    pub fn rate_limiter(&self) -> Option<&ApiRateLimiter> {
        self.rate_limiter.as_ref()
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn link_extractor(&self) -> &dyn LinkExtractor {
        self.link_extractor.as_ref()
    }
}

impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext")
            .field("credential", &self.credential)
            .field("rate_limiter", &self.rate_limiter)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ClientContext`].
#[derive(Default)]
pub struct ClientContextBuilder {
    config: AggregatorConfig,
    credential: Option<Credential>,
    transport: Option<Arc<dyn HttpTransport>>,
    link_extractor: Option<Arc<dyn LinkExtractor>>,
}

impl ClientContextBuilder {
    #[must_use]
    pub fn config(mut self, config: AggregatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the credential from a raw token.
    ///
    /// Malformed tokens are dropped with a warning and the context is built
    /// unauthenticated.
    #[must_use]
    pub fn token(mut self, token: Option<&str>) -> Self {
        self.credential = Credential::parse(token);
        self
    }

    #[must_use]
    pub fn credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }

    /// Use a caller-supplied transport (for example a caching executor).
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn link_extractor(mut self, extractor: Arc<dyn LinkExtractor>) -> Self {
        self.link_extractor = Some(extractor);
        self
    }

    /// Build the context, creating a reqwest transport if none was supplied.
    pub fn build(self) -> Result<ClientContext> {
        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => {
                let timeout = StdDuration::from_secs(self.config.endpoints.request_timeout_secs);
                Arc::new(
                    ReqwestTransport::with_timeout(timeout)
                        .map_err(|e| ActivityError::transport(e.to_string()))?,
                )
            }
        };
        let rate_limiter = self.config.requests_per_second.map(ApiRateLimiter::new);

        Ok(ClientContext {
            credential: self.credential,
            transport,
            rate_limiter,
            config: Arc::new(self.config),
            link_extractor: self.link_extractor.unwrap_or_else(default_link_extractor),
        })
    }
}
