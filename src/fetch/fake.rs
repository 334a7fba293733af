//! In-memory [`HttpClient`] for tests.
//!
//! [`FakeClient`] never touches the network. It answers with canned
//! responses (queued ones first, then a fallback) and records every request
//! it sees together with the redirect policy the request ran under.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Method, ResponseBuilderExt, Url};

use super::client::{HttpClient, RedirectPolicy};

#[derive(Debug, Clone)]
struct Canned {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl Canned {
    fn to_response(&self, url: &Url) -> reqwest::Response {
        let mut builder = http::Response::builder()
            .status(self.status)
            .url(url.clone());
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        match builder.body(self.body.clone()) {
            Ok(resp) => resp.into(),
            Err(_) => http::Response::new(self.body.clone()).into(),
        }
    }
}

/// What the fake saw for one request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub redirect_policy: RedirectPolicy,
}

#[derive(Debug, Default)]
struct State {
    queued: VecDeque<Canned>,
    fallback: Option<Canned>,
    requests: Vec<RecordedRequest>,
    policy: RedirectPolicy,
    delay: Option<Duration>,
}

/// Cloneable handle; clones share responses and recordings.
#[derive(Debug, Clone, Default)]
pub struct FakeClient {
    state: Arc<Mutex<State>>,
}

impl FakeClient {
    /// A fake that answers `200` with an empty body until told otherwise.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every request (after the queue drains) with `status` and `body`.
    pub fn respond(self, status: u16, body: &str) -> Self {
        self.lock().fallback = Some(Canned {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        });
        self
    }

    /// Answers every request with a redirect to `location`.
    pub fn redirect(self, status: u16, location: &str) -> Self {
        self.lock().fallback = Some(Canned {
            status,
            headers: vec![("location".to_string(), location.to_string())],
            body: format!("<a href=\"{location}\">Found</a>."),
        });
        self
    }

    /// Queues a one-shot response served before the fallback.
    pub fn push(self, status: u16, body: &str) -> Self {
        self.lock().queued.push_back(Canned {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        });
        self
    }

    /// Holds every response back for `delay`.
    pub fn delay(self, delay: Duration) -> Self {
        self.lock().delay = Some(delay);
        self
    }

    /// Every request seen so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.lock().requests.last().cloned()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl HttpClient for FakeClient {
    async fn execute_with(
        &self,
        req: reqwest::Request,
        policy: RedirectPolicy,
    ) -> reqwest::Result<reqwest::Response> {
        let (canned, delay) = {
            let mut state = self.lock();
            let recorded = RecordedRequest {
                method: req.method().clone(),
                url: req.url().clone(),
                headers: req.headers().clone(),
                body: req
                    .body()
                    .and_then(|b| b.as_bytes())
                    .map(Bytes::copy_from_slice),
                redirect_policy: policy,
            };
            state.requests.push(recorded);
            let canned = state
                .queued
                .pop_front()
                .or_else(|| state.fallback.clone())
                .unwrap_or(Canned {
                    status: 200,
                    headers: Vec::new(),
                    body: String::new(),
                });
            (canned, state.delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(canned.to_response(req.url()))
    }

    fn redirect_policy(&self) -> RedirectPolicy {
        self.lock().policy
    }

    fn set_redirect_policy(&self, policy: RedirectPolicy) -> RedirectPolicy {
        std::mem::replace(&mut self.lock().policy, policy)
    }
}
