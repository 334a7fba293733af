//! Git source OAuth hand-off.
//!
//! Logging in to a git provider starts with a redirect to the provider's
//! authorization page. The SDK does not follow it: the caller gets the
//! status code and the target URL and drives the browser step itself.

use std::sync::Arc;

use reqwest::{Method, StatusCode, Url};
use tracing::debug;

use crate::config::Config;
use crate::context::Context;
use crate::error::Result;
use crate::fetch::{ApiClient, Transport};

const BASE_PATH: &str = "v1/gitSources";
const GITHUB_LOGIN: &str = "github/client/login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResponse {
    pub status_code: StatusCode,
    /// Where the server redirected to, if it did.
    pub redirect_url: Option<Url>,
}

pub struct GitSourcesClient<C = Transport> {
    client: Arc<C>,
}

impl GitSourcesClient {
    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::clone(config.transport()))
    }
}

impl<C: ApiClient> GitSourcesClient<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Starts the GitHub login. A non-zero `port` asks the server to hand the
    /// result back to a CLI listening on that local port.
    ///
    /// Redirects are not followed for this call. A 4xx/5xx answer comes back
    /// as the configured classifier's error.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn login(&self, ctx: &Context, port: u16) -> Result<LoginResponse> {
        let sub_path = match port {
            0 => GITHUB_LOGIN.to_string(),
            port => format!("{GITHUB_LOGIN}?cli={port}"),
        };
        let req = self
            .client
            .new_request::<()>(ctx, Method::GET, BASE_PATH, &sub_path, None)?;
        let request_url = req.url().clone();

        let raw = self.client.send_unfollowed(req).await?;

        let redirect_url = raw
            .location()
            .map(|location| request_url.join(location))
            .transpose()?;
        debug!(status = raw.status.as_u16(), redirect = ?redirect_url.as_ref().map(Url::as_str), "Login redirect");

        Ok(LoginResponse {
            status_code: raw.status,
            redirect_url,
        })
    }
}
