//! OAuth2 error responses (RFC 6749 section 5.2).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error codes a token-exchange endpoint may answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    InvalidRequest,
    InvalidScope,
    UnsupportedGrantType,
    InvalidClient,
    InvalidTarget,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::InvalidRequest => "invalid_request",
            ErrorType::InvalidScope => "invalid_scope",
            ErrorType::UnsupportedGrantType => "unsupported_grant_type",
            ErrorType::InvalidClient => "invalid_client",
            ErrorType::InvalidTarget => "invalid_target",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An OAuth2 error body.
///
/// The description should stay within the printable ASCII subset RFC 6749
/// allows (`%x20-21 / %x23-5B / %x5D-7E`); it is not checked here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("type: {kind}, description: {description}")]
pub struct OAuth2Error {
    #[serde(rename = "error")]
    kind: ErrorType,
    #[serde(
        rename = "error_description",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    description: String,
}

impl OAuth2Error {
    pub fn new(kind: ErrorType) -> Self {
        Self {
            kind,
            description: String::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn kind(&self) -> ErrorType {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// HTTP status a server answers with for this error.
    pub fn status(&self) -> u16 {
        match self.kind {
            ErrorType::InvalidClient => 401,
            _ => 400,
        }
    }
}
