use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::client::{HttpClient, RedirectPolicy};
use async_trait::async_trait;
use reqwest::cookie::Jar;
use tracing::warn;

/// Default total request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// reqwest-backed engine.
///
/// reqwest fixes the redirect policy when a client is built, so this keeps
/// one client per policy. Both share the same cookie jar and timeout. A flag
/// holds the engine-wide policy; [`HttpClient::execute_with`] picks a client
/// per call without reading or changing it.
pub struct BasicClient {
    follow: reqwest::Client,
    stop: reqwest::Client,
    stop_redirects: AtomicBool,
}

impl BasicClient {
    /// Engine with the default 10 second timeout and no cookie jar.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> BasicClientBuilder {
        BasicClientBuilder::default()
    }
}

impl Default for BasicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute_with(
        &self,
        req: reqwest::Request,
        policy: RedirectPolicy,
    ) -> reqwest::Result<reqwest::Response> {
        match policy {
            RedirectPolicy::Follow => self.follow.execute(req).await,
            RedirectPolicy::Stop => self.stop.execute(req).await,
        }
    }

    fn redirect_policy(&self) -> RedirectPolicy {
        if self.stop_redirects.load(Ordering::Acquire) {
            RedirectPolicy::Stop
        } else {
            RedirectPolicy::Follow
        }
    }

    fn set_redirect_policy(&self, policy: RedirectPolicy) -> RedirectPolicy {
        let previous = self
            .stop_redirects
            .swap(policy == RedirectPolicy::Stop, Ordering::AcqRel);
        if previous {
            RedirectPolicy::Stop
        } else {
            RedirectPolicy::Follow
        }
    }
}

#[derive(Default)]
pub struct BasicClientBuilder {
    timeout: Option<Duration>,
    jar: Option<Arc<Jar>>,
}

impl BasicClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Shares `jar` across every request made by the engine.
    pub fn cookie_jar(mut self, jar: Arc<Jar>) -> Self {
        self.jar = Some(jar);
        self
    }

    /// Builds the engine. A client that reqwest refuses to build (TLS backend
    /// initialisation) falls back to reqwest's defaults.
    pub fn build(self) -> BasicClient {
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let make = |policy: reqwest::redirect::Policy| {
            let mut builder = reqwest::Client::builder().timeout(timeout).redirect(policy);
            if let Some(jar) = &self.jar {
                builder = builder.cookie_provider(Arc::clone(jar));
            }
            builder.build().unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build HTTP client, using defaults");
                reqwest::Client::new()
            })
        };

        BasicClient {
            follow: make(reqwest::redirect::Policy::default()),
            stop: make(reqwest::redirect::Policy::none()),
            stop_redirects: AtomicBool::new(false),
        }
    }
}
