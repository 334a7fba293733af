use crate::fetch::client::{HttpClient, RedirectPolicy};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue, InvalidHeaderName, InvalidHeaderValue};

/// An [`HttpClient`] wrapper that stamps a fixed header on every request.
///
/// This is how a caller attaches credentials the SDK itself never manages:
/// an access token from a token exchange, or a static API key.
pub struct HeaderAuth<C> {
    inner: C,
    name: HeaderName,
    value: HeaderValue,
}

impl<C> HeaderAuth<C> {
    pub fn new(inner: C, name: &str, value: &str) -> Result<Self, HeaderAuthError> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let mut value = HeaderValue::from_str(value)?;
        value.set_sensitive(true);
        Ok(Self { inner, name, value })
    }

    /// `Authorization: Bearer <token>`.
    pub fn bearer(inner: C, token: &str) -> Result<Self, HeaderAuthError> {
        Self::new(inner, AUTHORIZATION.as_str(), &format!("Bearer {token}"))
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HeaderAuthError {
    #[error("invalid header name: {0}")]
    Name(#[from] InvalidHeaderName),
    #[error("invalid header value: {0}")]
    Value(#[from] InvalidHeaderValue),
}

#[async_trait]
impl<C: HttpClient> HttpClient for HeaderAuth<C> {
    async fn execute_with(
        &self,
        mut req: reqwest::Request,
        policy: RedirectPolicy,
    ) -> reqwest::Result<reqwest::Response> {
        req.headers_mut().insert(self.name.clone(), self.value.clone());
        self.inner.execute_with(req, policy).await
    }

    fn redirect_policy(&self) -> RedirectPolicy {
        self.inner.redirect_policy()
    }

    fn set_redirect_policy(&self, policy: RedirectPolicy) -> RedirectPolicy {
        self.inner.set_redirect_policy(policy)
    }
}
