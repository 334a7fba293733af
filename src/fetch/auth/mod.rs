//! Engine wrappers that attach caller-supplied credentials.

mod header;

pub use header::{HeaderAuth, HeaderAuthError};
