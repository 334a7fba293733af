//! Client SDK for the Upbound API.
//!
//! The [`fetch`] module holds the HTTP transport every service is built on;
//! [`services`] holds typed clients per API; [`oauth2`] describes the token
//! exchange used to obtain federated credentials.

pub mod classify;
pub mod config;
pub mod context;
pub mod error;
pub mod fetch;
pub mod oauth2;
pub mod services;

pub use config::{Config, ConfigBuilder, Modifier};
pub use context::Context;
pub use error::{ApiError, Classified, Error, ErrorKind, Result};
