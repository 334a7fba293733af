//! Request construction and dispatch shared by every service.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, LOCATION, USER_AGENT};
use reqwest::{Method, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{Instrument, Span, debug};

use super::client::{HttpClient, RedirectPolicy};
use super::path::{clean_join, under_base};
use crate::classify::ResponseClassifier;
use crate::context::{Context, REQUEST_ID_HEADER, id_from_context};
use crate::error::{Error, Result};

/// A built request together with the context it runs under.
pub struct ApiRequest {
    inner: reqwest::Request,
    ctx: Context,
}

impl ApiRequest {
    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    pub fn url(&self) -> &Url {
        self.inner.url()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// For callers that need extra headers (e.g. `Authorization`) on one call.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    /// The encoded payload, if any.
    pub fn body(&self) -> Option<&[u8]> {
        self.inner.body().and_then(|b| b.as_bytes())
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", self.inner.method())
            .field("url", &self.inner.url().as_str())
            .field("request_id", &id_from_context(&self.ctx))
            .finish()
    }
}

/// Status line and headers of a response whose body was drained.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl RawResponse {
    /// The `Location` header, when present and valid UTF-8.
    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }
}

/// The seam every service is written against.
///
/// [`Transport`] is the production implementation; tests can swap in
/// anything that builds and dispatches requests.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Builds a request for `prefix`/`sub_path` beneath the base URL. A body,
    /// when given, is sent as JSON.
    fn new_request<B>(
        &self,
        ctx: &Context,
        method: Method,
        prefix: &str,
        sub_path: &str,
        body: Option<&B>,
    ) -> Result<ApiRequest>
    where
        B: Serialize + ?Sized;

    /// Dispatches `req`, classifies the response and discards the body.
    async fn send(&self, req: ApiRequest) -> Result<()>;

    /// Dispatches `req`, classifies the response and decodes the JSON body.
    async fn send_json<T>(&self, req: ApiRequest) -> Result<T>
    where
        T: DeserializeOwned + Send;

    /// Dispatches `req` with redirects disabled for this call only. A 3xx is
    /// returned raw; a 4xx/5xx goes through the classifier like any other call.
    async fn send_unfollowed(&self, req: ApiRequest) -> Result<RawResponse>;
}

/// HTTP transport bound to one base URL.
pub struct Transport {
    base_url: Url,
    user_agent: String,
    engine: Arc<dyn HttpClient>,
    classifier: Arc<dyn ResponseClassifier>,
    span: Span,
}

impl Transport {
    pub fn new(
        base_url: Url,
        user_agent: impl Into<String>,
        engine: Arc<dyn HttpClient>,
        classifier: Arc<dyn ResponseClassifier>,
    ) -> Self {
        Self {
            base_url,
            user_agent: user_agent.into(),
            engine,
            classifier,
            span: Span::none(),
        }
    }

    /// Runs all request work inside `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn engine(&self) -> &Arc<dyn HttpClient> {
        &self.engine
    }

    fn url_for(&self, prefix: &str, sub_path: &str) -> Result<Url> {
        let (path, query) = match sub_path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (sub_path, None),
        };
        let mut reference = under_base(self.base_url.path(), &clean_join(&[prefix, path]));
        if let Some(query) = query {
            reference.push('?');
            reference.push_str(query);
        }
        Ok(self.base_url.join(&reference)?)
    }

    /// Sends `req`, under `policy` when given and the engine's own otherwise.
    async fn dispatch(&self, req: ApiRequest, policy: Option<RedirectPolicy>) -> Result<Response> {
        let ApiRequest { inner, ctx } = req;
        debug!(
            method = %inner.method(),
            url = %inner.url(),
            request_id = id_from_context(&ctx),
            redirects = ?policy,
            "Sending request"
        );
        let resp = match policy {
            Some(policy) => within(&ctx, self.engine.execute_with(inner, policy)).await??,
            None => within(&ctx, self.engine.execute(inner)).await??,
        };
        debug!(status = resp.status().as_u16(), "Received response");
        Ok(resp)
    }

    async fn classified(&self, req: ApiRequest) -> Result<(Response, Context)> {
        let ctx = req.ctx.clone();
        let resp = self.dispatch(req, None).await?;
        let resp = within(&ctx, self.classifier.classify(resp)).await??;
        Ok((resp, ctx))
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.base_url.as_str())
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ApiClient for Transport {
    fn new_request<B>(
        &self,
        ctx: &Context,
        method: Method,
        prefix: &str,
        sub_path: &str,
        body: Option<&B>,
    ) -> Result<ApiRequest>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url_for(prefix, sub_path)?;
        let mut inner = reqwest::Request::new(method, url);

        let headers = inner.headers_mut();
        headers.insert(USER_AGENT, header_value(&self.user_agent)?);
        let request_id = id_from_context(ctx);
        if !request_id.is_empty() {
            headers.insert(REQUEST_ID_HEADER, header_value(request_id)?);
        }

        if let Some(body) = body {
            let encoded = serde_json::to_vec(body).map_err(Error::Encode)?;
            inner
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            *inner.body_mut() = Some(encoded.into());
        }

        Ok(ApiRequest {
            inner,
            ctx: ctx.clone(),
        })
    }

    async fn send(&self, req: ApiRequest) -> Result<()> {
        self.classified(req)
            .instrument(self.span.clone())
            .await
            .map(|_| ())
    }

    async fn send_json<T>(&self, req: ApiRequest) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        async {
            let (resp, ctx) = self.classified(req).await?;
            let body = within(&ctx, resp.bytes()).await??;
            serde_json::from_slice(&body).map_err(Error::Decode)
        }
        .instrument(self.span.clone())
        .await
    }

    async fn send_unfollowed(&self, req: ApiRequest) -> Result<RawResponse> {
        async {
            let ctx = req.ctx.clone();
            let mut resp = self.dispatch(req, Some(RedirectPolicy::Stop)).await?;
            let status = resp.status();
            if status.is_client_error() || status.is_server_error() {
                resp = within(&ctx, self.classifier.classify(resp)).await??;
            }
            let raw = RawResponse {
                status: resp.status(),
                headers: resp.headers().clone(),
            };
            within(&ctx, resp.bytes()).await??;
            Ok::<_, Error>(raw)
        }
        .instrument(self.span.clone())
        .await
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| Error::Request(e.to_string()))
}

/// Runs `fut` unless `ctx` is cancelled or its deadline passes first.
async fn within<F: Future>(ctx: &Context, fut: F) -> Result<F::Output> {
    if ctx.is_cancelled() {
        return Err(Error::Cancelled);
    }
    let deadline = async {
        match ctx.deadline() {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    };
    tokio::select! {
        biased;
        _ = ctx.token().cancelled() => Err(Error::Cancelled),
        _ = deadline => Err(Error::Timeout),
        out = fut => Ok(out),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::classify::DefaultClassifier;
    use crate::context::with_id;
    use crate::error::{ApiError, ErrorKind, is_not_found};
    use crate::fetch::fake::FakeClient;
    use serde::Deserialize;
    use serde_json::json;

    fn transport(base: &str, fake: &FakeClient) -> Transport {
        Transport::new(
            base.parse().unwrap(),
            "up-sdk-test",
            Arc::new(fake.clone()),
            Arc::new(DefaultClassifier),
        )
    }

    fn get(t: &Transport, prefix: &str, sub_path: &str) -> ApiRequest {
        t.new_request::<()>(&Context::background(), Method::GET, prefix, sub_path, None)
            .unwrap()
    }

    #[test]
    fn test_new_request_joins_under_base_path() {
        let t = transport("https://h/api", &FakeClient::new());
        assert_eq!(
            get(&t, "v1/teams", "abc").url().as_str(),
            "https://h/api/v1/teams/abc"
        );
        assert_eq!(get(&t, "v1/teams", "").url().as_str(), "https://h/api/v1/teams");
    }

    #[test]
    fn test_new_request_with_trailing_slash_base() {
        let t = transport("https://api.example/", &FakeClient::new());
        assert_eq!(get(&t, "v1/self", "").url().as_str(), "https://api.example/v1/self");
    }

    #[test]
    fn test_new_request_does_not_escape_base() {
        let t = transport("https://h/api", &FakeClient::new());
        assert_eq!(
            get(&t, "v1/teams", "../../../x").url().as_str(),
            "https://h/api/x"
        );
    }

    #[test]
    fn test_new_request_sub_path_query() {
        let t = transport("https://h", &FakeClient::new());
        let req = get(&t, "v1/gitSources", "github/client/login?cli=8080");
        assert_eq!(req.url().path(), "/v1/gitSources/github/client/login");
        assert_eq!(req.url().query(), Some("cli=8080"));
    }

    #[test]
    fn test_new_request_without_body() {
        let t = transport("https://h", &FakeClient::new());
        let req = get(&t, "v1/teams", "");
        assert_eq!(*req.method(), Method::GET);
        assert!(req.headers().get(CONTENT_TYPE).is_none());
        assert!(req.body().is_none());
        assert_eq!(req.headers()[USER_AGENT], "up-sdk-test");
        assert!(req.headers().get(REQUEST_ID_HEADER).is_none());
    }

    #[test]
    fn test_new_request_json_body_not_html_escaped() {
        let t = transport("https://h", &FakeClient::new());
        let body = json!({"q": "a<b&c>d"});
        let req = t
            .new_request(&Context::background(), Method::POST, "v1/teams", "", Some(&body))
            .unwrap();
        assert_eq!(req.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(req.body().unwrap(), br#"{"q":"a<b&c>d"}"#);
        let decoded: serde_json::Value = serde_json::from_slice(req.body().unwrap()).unwrap();
        assert_eq!(decoded, body);
    }

    #[test]
    fn test_new_request_sets_request_id_from_context() {
        let t = transport("https://h", &FakeClient::new());
        let ctx = with_id(&Context::background(), "rid-1");
        let req = t
            .new_request::<()>(&ctx, Method::DELETE, "v1/teams", "x", None)
            .unwrap();
        assert_eq!(req.headers()[REQUEST_ID_HEADER], "rid-1");
    }

    #[test]
    fn test_new_request_rejects_bad_user_agent() {
        let t = Transport::new(
            "https://h".parse().unwrap(),
            "bad\nagent",
            Arc::new(FakeClient::new()),
            Arc::new(DefaultClassifier),
        );
        let result = t.new_request::<()>(&Context::background(), Method::GET, "v1", "", None);
        assert!(matches!(result, Err(Error::Request(_))));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Thing {
        id: u32,
    }

    #[tokio::test]
    async fn test_send_json_decodes_success() {
        let fake = FakeClient::new().respond(200, r#"{"id":7}"#);
        let t = transport("https://h", &fake);
        let thing: Thing = t.send_json(get(&t, "v1/things", "7")).await.unwrap();
        assert_eq!(thing, Thing { id: 7 });
    }

    #[tokio::test]
    async fn test_send_json_classifies_before_decoding() {
        let fake = FakeClient::new().respond(404, "no such thing");
        let t = transport("https://h", &fake);
        let err = t
            .send_json::<Thing>(get(&t, "v1/things", "7"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
        assert!(is_not_found(&err));
    }

    #[tokio::test]
    async fn test_send_json_decode_error() {
        let fake = FakeClient::new().respond(200, "not json");
        let t = transport("https://h", &fake);
        let err = t
            .send_json::<Thing>(get(&t, "v1/things", "7"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert_eq!(err.kind(), None);
    }

    #[tokio::test]
    async fn test_send_discards_body() {
        let fake = FakeClient::new().respond(200, "ignored, not json");
        let t = transport("https://h", &fake);
        t.send(get(&t, "v1/things", "7")).await.unwrap();
    }

    #[tokio::test]
    async fn test_send_surfaces_classified_error() {
        let fake = FakeClient::new().respond(503, "down");
        let t = transport("https://h", &fake);
        let err = t.send(get(&t, "v1/things", "")).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Unknown));
        assert_eq!(err.to_string(), "unknown error: down");
    }

    #[tokio::test]
    async fn test_cancelled_context_short_circuits() {
        let fake = FakeClient::new();
        let t = transport("https://h", &fake);
        let (ctx, cancel) = Context::background().with_cancel();
        cancel.cancel();
        let req = t
            .new_request::<()>(&ctx, Method::GET, "v1/things", "", None)
            .unwrap();
        let err = t.send(req).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert!(fake.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fires_before_slow_response() {
        let fake = FakeClient::new().delay(Duration::from_secs(30));
        let t = transport("https://h", &fake);
        let ctx = Context::background().with_timeout(Duration::from_secs(1));
        let req = t
            .new_request::<()>(&ctx, Method::GET, "v1/things", "", None)
            .unwrap();
        let err = t.send(req).await.unwrap_err();
        assert!(matches!(err, Error::Timeout));
    }

    #[tokio::test]
    async fn test_send_unfollowed_leaves_engine_policy() {
        let fake = FakeClient::new().redirect(302, "https://github.com/login");
        let t = transport("https://h", &fake);
        let raw = t
            .send_unfollowed(get(&t, "v1/gitSources", "github/client/login"))
            .await
            .unwrap();
        assert_eq!(raw.status, StatusCode::FOUND);
        assert_eq!(raw.location(), Some("https://github.com/login"));
        assert_eq!(
            fake.last_request().unwrap().redirect_policy,
            RedirectPolicy::Stop
        );
        assert_eq!(fake.redirect_policy(), RedirectPolicy::Follow);
    }

    #[tokio::test]
    async fn test_send_unfollowed_cancelled() {
        let fake = FakeClient::new();
        let t = transport("https://h", &fake);

        let (ctx, cancel) = Context::background().with_cancel();
        cancel.cancel();
        let req = t
            .new_request::<()>(&ctx, Method::GET, "v1/gitSources", "", None)
            .unwrap();
        assert!(matches!(t.send_unfollowed(req).await, Err(Error::Cancelled)));
        assert!(fake.requests().is_empty());
        assert_eq!(fake.redirect_policy(), RedirectPolicy::Follow);
    }

    #[tokio::test]
    async fn test_send_unfollowed_classifies_failures() {
        let fake = FakeClient::new().respond(403, "not yours");
        let t = transport("https://h", &fake);
        let err = t
            .send_unfollowed(get(&t, "v1/gitSources", "github/client/login"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Forbidden));
        assert_eq!(err.to_string(), "forbidden: not yours");
    }

    #[tokio::test]
    async fn test_send_unfollowed_honours_custom_classifier() {
        struct Lenient;

        #[async_trait]
        impl ResponseClassifier for Lenient {
            async fn classify(&self, resp: Response) -> std::result::Result<Response, ApiError> {
                Ok(resp)
            }
        }

        let fake = FakeClient::new().respond(418, "teapot");
        let t = Transport::new(
            "https://h".parse().unwrap(),
            "up-sdk-test",
            Arc::new(fake.clone()),
            Arc::new(Lenient),
        );
        let raw = t
            .send_unfollowed(get(&t, "v1/gitSources", ""))
            .await
            .unwrap();
        assert_eq!(raw.status, StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unfollowed_call_does_not_affect_concurrent_calls() {
        let fake = FakeClient::new()
            .delay(Duration::from_secs(5))
            .respond(200, "")
            .push(302, "");
        let t = Arc::new(transport("https://h", &fake));

        let unfollowed = {
            let t = Arc::clone(&t);
            tokio::spawn(async move {
                t.send_unfollowed(get(&t, "v1/gitSources", "github/client/login"))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fake.redirect_policy(), RedirectPolicy::Follow);

        t.send(get(&t, "v1/teams", "x")).await.unwrap();
        let raw = unfollowed.await.unwrap().unwrap();
        assert_eq!(raw.status, StatusCode::FOUND);

        let requests = fake.requests();
        assert_eq!(requests[0].redirect_policy, RedirectPolicy::Stop);
        assert_eq!(requests[1].url.path(), "/v1/teams/x");
        assert_eq!(requests[1].redirect_policy, RedirectPolicy::Follow);
    }

    #[test]
    fn test_new_request_with_doubled_leading_slash_base() {
        let t = transport("https://h//api", &FakeClient::new());
        let url = get(&t, "v1/teams", "abc").url().clone();
        assert_eq!(url.host_str(), Some("h"));
        assert_eq!(url.path(), "/api/v1/teams/abc");
    }
}
