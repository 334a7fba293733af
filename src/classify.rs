//! Mapping of raw HTTP responses onto success or a classified [`ApiError`].

use async_trait::async_trait;
use reqwest::Response;
use tracing::warn;

use crate::error::{ApiError, ErrorKind};

/// Placeholder cause used when an error body cannot be read.
pub const UNREADABLE_BODY: &str = "could not read error body";

/// Decides whether a response is a success.
///
/// On success the response is handed back untouched so the caller can read
/// the body. On failure the classifier owns the response and may consume it.
#[async_trait]
pub trait ResponseClassifier: Send + Sync {
    async fn classify(&self, resp: Response) -> Result<Response, ApiError>;
}

/// Status-code based classifier: 2xx succeeds, 404/403/401 map to their
/// kinds, anything else is [`ErrorKind::Unknown`]. The error body becomes the
/// cause.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClassifier;

#[async_trait]
impl ResponseClassifier for DefaultClassifier {
    async fn classify(&self, resp: Response) -> Result<Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let url = resp.url().clone();
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Failed to read error body");
                UNREADABLE_BODY.to_string()
            }
        };

        let kind = ErrorKind::from_status(status.as_u16());
        warn!(status = status.as_u16(), %kind, %url, "Request failed");
        Err(ApiError::new(kind).with_cause(body))
    }
}
