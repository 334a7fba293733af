//! Error types shared by the transport, the classifier and every service.
//!
//! Server failures are surfaced as [`ApiError`], a single record tagged with an
//! [`ErrorKind`]. Callers branch on the kind through the [`Classified`]
//! predicates or the free functions [`is_not_found`], [`is_forbidden`] and
//! [`is_unauthorized`], which also accept foreign errors and answer `false`.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// SDK-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Closed set of classifications for a non-2xx response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Unauthorized,
    Unknown,
}

impl ErrorKind {
    /// Maps an HTTP status code onto a kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => ErrorKind::NotFound,
            403 => ErrorKind::Forbidden,
            401 => ErrorKind::Unauthorized,
            _ => ErrorKind::Unknown,
        }
    }

    /// Fixed human-readable message attached to errors of this kind.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "resource not found",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Unauthorized => "permission denied",
            ErrorKind::Unknown => "unknown error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// The server's error body, kept verbatim as the cause of an [`ApiError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody(pub String);

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for ErrorBody {}

/// A classified server failure.
///
/// `message` is safe to log; `cause` carries whatever the server sent back.
#[derive(Debug, Clone)]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
    cause: Option<ErrorBody>,
}

impl ApiError {
    /// Builds an error of `kind` with the kind's fixed message.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: kind.message().to_string(),
            cause: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(ErrorBody(cause.into()));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&ErrorBody> {
        self.cause.as_ref()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}: {}", self.message, cause),
            None => f.write_str(&self.message),
        }
    }
}

impl StdError for ApiError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_ref().map(|c| c as &(dyn StdError + 'static))
    }
}

/// Every failure the SDK can hand back to a caller.
#[derive(Debug, Error)]
pub enum Error {
    /// The server answered with a non-2xx status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The base URL, prefix or sub-path did not form a valid URL.
    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),

    /// The request body could not be JSON-encoded.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// A 2xx response body was not valid JSON for the expected type.
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// The HTTP engine failed (connect, DNS, TLS, body read).
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The request could not be assembled (bad header value and similar).
    #[error("failed to build request: {0}")]
    Request(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("request deadline exceeded")]
    Timeout,
}

impl Error {
    /// Returns the classification when this is a server failure.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Api(e) => Some(e.kind()),
            _ => None,
        }
    }
}

/// Kind predicates for errors that carry a classification.
pub trait Classified {
    fn is_not_found(&self) -> bool;
    fn is_forbidden(&self) -> bool;
    fn is_unauthorized(&self) -> bool;
}

impl Classified for ApiError {
    fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    fn is_forbidden(&self) -> bool {
        self.kind == ErrorKind::Forbidden
    }

    fn is_unauthorized(&self) -> bool {
        self.kind == ErrorKind::Unauthorized
    }
}

impl Classified for Error {
    fn is_not_found(&self) -> bool {
        matches!(self, Error::Api(e) if e.is_not_found())
    }

    fn is_forbidden(&self) -> bool {
        matches!(self, Error::Api(e) if e.is_forbidden())
    }

    fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Api(e) if e.is_unauthorized())
    }
}

/// Finds the first error in `err`'s source chain that carries a classification.
fn find_classified<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a dyn Classified> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(sdk) = e.downcast_ref::<Error>() {
            return Some(sdk);
        }
        if let Some(api) = e.downcast_ref::<ApiError>() {
            return Some(api);
        }
        current = e.source();
    }
    None
}

/// Reports whether `err` (or something it wraps) is a not-found failure.
/// Errors that are not SDK errors report `false`.
pub fn is_not_found(err: &(dyn StdError + 'static)) -> bool {
    find_classified(err).is_some_and(|c| c.is_not_found())
}

pub fn is_forbidden(err: &(dyn StdError + 'static)) -> bool {
    find_classified(err).is_some_and(|c| c.is_forbidden())
}

pub fn is_unauthorized(err: &(dyn StdError + 'static)) -> bool {
    find_classified(err).is_some_and(|c| c.is_unauthorized())
}
