mod basic;
mod client;
pub mod auth;
pub mod fake;
pub mod path;
mod transport;

pub use basic::{BasicClient, BasicClientBuilder, DEFAULT_TIMEOUT};
pub use client::{HttpClient, RedirectPolicy};
pub use fake::FakeClient;
pub use transport::{ApiClient, ApiRequest, RawResponse, Transport};
