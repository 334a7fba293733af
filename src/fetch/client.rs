use async_trait::async_trait;
use reqwest::{Request, Response};

/// Whether an engine follows 3xx responses or hands them back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectPolicy {
    #[default]
    Follow,
    Stop,
}

/// The HTTP engine underneath a [`Transport`](super::Transport).
///
/// Implementations must be safe for concurrent use. The redirect policy is
/// the only piece of engine state a caller may change after construction;
/// a single call that needs a different policy goes through
/// [`execute_with`](HttpClient::execute_with) and leaves that state alone.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Performs `req` under the engine's current redirect policy.
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        self.execute_with(req, self.redirect_policy()).await
    }

    /// Performs `req` under `policy` without touching the engine's own policy.
    async fn execute_with(&self, req: Request, policy: RedirectPolicy) -> reqwest::Result<Response>;

    fn redirect_policy(&self) -> RedirectPolicy;

    /// Replaces the redirect policy and returns the one it replaced.
    fn set_redirect_policy(&self, policy: RedirectPolicy) -> RedirectPolicy;
}
