//! Request-scoped context: cancellation, deadline and request ID.
//!
//! A [`Context`] is passed explicitly to every SDK call. The request ID lives
//! in a private field so it cannot collide with anything else a caller keeps
//! alongside the context; use [`with_id`] and [`id_from_context`] to reach it.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Header carrying the request ID on outbound requests.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone, Default)]
pub struct Context {
    cancel: CancellationToken,
    deadline: Option<Instant>,
    request_id: Option<String>,
}

impl Context {
    /// A context that is never cancelled, has no deadline and no request ID.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derives a context that is cancelled when `self` is, or when the
    /// returned token is cancelled.
    pub fn with_cancel(&self) -> (Self, CancellationToken) {
        let child = self.cancel.child_token();
        let ctx = Self {
            cancel: child.clone(),
            deadline: self.deadline,
            request_id: self.request_id.clone(),
        };
        (ctx, child)
    }

    /// Derives a context whose deadline is `timeout` from now, or the parent's
    /// deadline if that is earlier.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        let mut ctx = self.clone();
        ctx.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        ctx
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.cancel
    }
}

/// Returns a copy of `ctx` carrying `id` as its request ID.
pub fn with_id(ctx: &Context, id: impl Into<String>) -> Context {
    let mut ctx = ctx.clone();
    ctx.request_id = Some(id.into());
    ctx
}

/// Returns the request ID carried by `ctx`, or `""` when there is none.
pub fn id_from_context(ctx: &Context) -> &str {
    ctx.request_id.as_deref().unwrap_or_default()
}

/// Generates a fresh random (v4) request ID.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
