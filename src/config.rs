//! SDK configuration.
//!
//! A [`Config`] is assembled by a [`ConfigBuilder`] that starts from sane
//! defaults; callers adjust it with fluent setters or with [`Modifier`]s,
//! which run in the order they are applied. Building never fails.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use reqwest::cookie::Jar;
use tracing::Span;

use crate::classify::{DefaultClassifier, ResponseClassifier};
use crate::fetch::{BasicClient, DEFAULT_TIMEOUT, HttpClient, Transport};

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.upbound.io";

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("up-sdk-rs/", env!("CARGO_PKG_VERSION"));

/// A configuration change applied during building.
pub type Modifier = Box<dyn FnOnce(&mut ConfigBuilder) + Send>;

/// Shared SDK configuration. Cheap to clone; every clone uses the same
/// transport.
#[derive(Debug, Clone)]
pub struct Config {
    transport: Arc<Transport>,
    logger: Span,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Defaults with `modifiers` applied in order.
    pub fn new(modifiers: impl IntoIterator<Item = Modifier>) -> Self {
        Self::builder().apply_all(modifiers).build()
    }

    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    pub fn logger(&self) -> &Span {
        &self.logger
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Mutable configuration under construction. Fields are public so custom
/// [`Modifier`]s can change anything a setter can.
pub struct ConfigBuilder {
    pub base_url: Url,
    pub user_agent: String,
    /// Total request timeout for the default engine.
    pub timeout: Duration,
    pub cookie_jar: Option<Arc<Jar>>,
    /// Replaces the default engine; `timeout` and `cookie_jar` then no longer apply.
    pub http_client: Option<Arc<dyn HttpClient>>,
    pub classifier: Arc<dyn ResponseClassifier>,
    pub logger: Span,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            cookie_jar: None,
            http_client: None,
            classifier: Arc::new(DefaultClassifier),
            logger: Span::none(),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).unwrap_or_else(|_| unreachable!("default base url is valid"))
}

impl ConfigBuilder {
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = url;
        self
    }

    /// Parses `url` as the base URL. This is the only fallible setter.
    pub fn base_url_str(self, url: &str) -> Result<Self, url::ParseError> {
        Ok(self.base_url(Url::parse(url)?))
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Total request timeout for the default engine. Ignored when a custom
    /// engine is supplied through [`http_client`](Self::http_client).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Shares `jar` with the default engine so login cookies carry over to
    /// later calls.
    pub fn cookie_jar(mut self, jar: Arc<Jar>) -> Self {
        self.cookie_jar = Some(jar);
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn classifier(mut self, classifier: Arc<dyn ResponseClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn logger(mut self, logger: Span) -> Self {
        self.logger = logger;
        self
    }

    pub fn apply(mut self, modifier: Modifier) -> Self {
        modifier(&mut self);
        self
    }

    pub fn apply_all(self, modifiers: impl IntoIterator<Item = Modifier>) -> Self {
        modifiers.into_iter().fold(self, |builder, m| builder.apply(m))
    }

    pub fn build(self) -> Config {
        let engine: Arc<dyn HttpClient> = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = BasicClient::builder().timeout(self.timeout);
                if let Some(jar) = self.cookie_jar {
                    builder = builder.cookie_jar(jar);
                }
                Arc::new(builder.build())
            }
        };

        let transport = Transport::new(self.base_url, self.user_agent, engine, self.classifier)
            .with_span(self.logger.clone());

        Config {
            transport: Arc::new(transport),
            logger: self.logger,
        }
    }
}

/// Modifier setting the base URL.
pub fn with_base_url(url: Url) -> Modifier {
    Box::new(move |b: &mut ConfigBuilder| b.base_url = url)
}

/// Modifier setting the user agent.
pub fn with_user_agent(user_agent: impl Into<String>) -> Modifier {
    let user_agent = user_agent.into();
    Box::new(move |b: &mut ConfigBuilder| b.user_agent = user_agent)
}

/// Modifier replacing the HTTP engine.
pub fn with_http_client(client: Arc<dyn HttpClient>) -> Modifier {
    Box::new(move |b: &mut ConfigBuilder| b.http_client = Some(client))
}

/// Modifier replacing the response classifier.
pub fn with_classifier(classifier: Arc<dyn ResponseClassifier>) -> Modifier {
    Box::new(move |b: &mut ConfigBuilder| b.classifier = classifier)
}

pub fn with_logger(logger: Span) -> Modifier {
    Box::new(move |b: &mut ConfigBuilder| b.logger = logger)
}

pub fn with_timeout(timeout: Duration) -> Modifier {
    Box::new(move |b: &mut ConfigBuilder| b.timeout = timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FakeClient;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        let transport = config.transport();
        assert_eq!(transport.base_url().as_str(), "https://api.upbound.io/");
        assert_eq!(transport.user_agent(), DEFAULT_USER_AGENT);
        assert!(DEFAULT_USER_AGENT.starts_with("up-sdk-rs/"));
    }

    #[test]
    fn test_modifiers_run_in_order() {
        let config = Config::new([
            with_user_agent("first"),
            with_user_agent("second"),
            with_base_url(Url::parse("https://h/api").unwrap()),
        ]);
        assert_eq!(config.transport().user_agent(), "second");
        assert_eq!(config.transport().base_url().as_str(), "https://h/api");
    }

    #[test]
    fn test_modifier_sees_earlier_changes() {
        let config = Config::builder()
            .user_agent("base")
            .apply(Box::new(|b: &mut ConfigBuilder| {
                b.user_agent = format!("{}/extended", b.user_agent);
            }))
            .build();
        assert_eq!(config.transport().user_agent(), "base/extended");
    }

    #[test]
    fn test_base_url_str_rejects_garbage() {
        assert!(Config::builder().base_url_str("not a url").is_err());
        let builder = Config::builder().base_url_str("https://staging.example").unwrap();
        assert_eq!(
            builder.build().transport().base_url().as_str(),
            "https://staging.example/"
        );
    }

    #[test]
    fn test_custom_engine_is_used() {
        let fake = FakeClient::new();
        let config = Config::new([with_http_client(Arc::new(fake.clone()))]);
        config
            .transport()
            .engine()
            .set_redirect_policy(crate::fetch::RedirectPolicy::Stop);
        assert_eq!(fake.redirect_policy(), crate::fetch::RedirectPolicy::Stop);
    }

    #[test]
    fn test_clones_share_transport() {
        let config = Config::builder().cookie_jar(Arc::new(Jar::default())).build();
        let copy = config.clone();
        assert!(Arc::ptr_eq(config.transport(), copy.transport()));
    }
}
