//! RFC 8693 token exchange: request and response shapes.
//!
//! Only encoding, decoding and validation live here. Nothing in this module
//! performs I/O.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{ErrorType, OAuth2Error};
use super::scope::{Scope, parse_scopes};

pub const GRANT_TYPE_TOKEN_EXCHANGE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";

pub const TOKEN_TYPE_ID_TOKEN: &str = "urn:ietf:params:oauth:token-type:id_token";
pub const TOKEN_TYPE_ACCESS_TOKEN: &str = "urn:ietf:params:oauth:token-type:access_token";
pub const TOKEN_TYPE_JWT: &str = "urn:ietf:params:oauth:token-type:jwt";

const KNOWN_TOKEN_TYPES: &[&str] = &[TOKEN_TYPE_ID_TOKEN, TOKEN_TYPE_ACCESS_TOKEN, TOKEN_TYPE_JWT];

/// Services a token may be exchanged for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Audience {
    SpacesApi,
    SpacesControlPlanes,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::SpacesApi => "upbound:spaces:api",
            Audience::SpacesControlPlanes => "upbound:spaces:controlplanes",
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Audience {
    type Err = OAuth2Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upbound:spaces:api" => Ok(Audience::SpacesApi),
            "upbound:spaces:controlplanes" => Ok(Audience::SpacesControlPlanes),
            other => Err(OAuth2Error::new(ErrorType::InvalidTarget)
                .with_description(format!("unknown audience {other:?}"))),
        }
    }
}

/// Form body of a token-exchange request, as it travels on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenExchangeRequest {
    #[serde(default)]
    pub grant_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_token_type: Option<String>,
}

impl TokenExchangeRequest {
    /// Exchange `subject_token` for an ID token.
    pub fn new(subject_token: impl Into<String>, subject_token_type: impl Into<String>) -> Self {
        Self {
            grant_type: GRANT_TYPE_TOKEN_EXCHANGE.to_string(),
            requested_token_type: Some(TOKEN_TYPE_ID_TOKEN.to_string()),
            subject_token: Some(subject_token.into()),
            subject_token_type: Some(subject_token_type.into()),
            ..Default::default()
        }
    }

    pub fn audience(mut self, audience: Audience) -> Self {
        self.audience = Some(audience.as_str().to_string());
        self
    }

    /// Adds `scope` to the space-delimited scope list.
    pub fn scope(mut self, scope: &Scope) -> Self {
        self.scope = Some(match self.scope.take() {
            Some(existing) if !existing.is_empty() => format!("{existing} {scope}"),
            _ => scope.to_string(),
        });
        self
    }

    pub fn requested_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.requested_token_type = Some(token_type.into());
        self
    }

    /// Encodes the request as `application/x-www-form-urlencoded`.
    pub fn to_form(&self) -> Result<String, serde_urlencoded::ser::Error> {
        serde_urlencoded::to_string(self)
    }

    /// Decodes a form body. Malformed input is an `invalid_request`.
    pub fn from_form(form: &str) -> Result<Self, OAuth2Error> {
        serde_urlencoded::from_str(form).map_err(|e| {
            OAuth2Error::new(ErrorType::InvalidRequest).with_description(e.to_string())
        })
    }

    /// Checks the request the way a token endpoint must before issuing a
    /// token.
    pub fn validate(&self) -> Result<TokenExchange, OAuth2Error> {
        if self.grant_type != GRANT_TYPE_TOKEN_EXCHANGE {
            return Err(OAuth2Error::new(ErrorType::UnsupportedGrantType)
                .with_description(format!("grant_type must be {GRANT_TYPE_TOKEN_EXCHANGE}")));
        }

        let subject_token = required(&self.subject_token, "subject_token")?;
        let subject_token_type = required(&self.subject_token_type, "subject_token_type")?;
        let requested_token_type = required(&self.requested_token_type, "requested_token_type")?;
        if !KNOWN_TOKEN_TYPES.contains(&requested_token_type.as_str()) {
            return Err(OAuth2Error::new(ErrorType::InvalidRequest)
                .with_description(format!("unsupported requested_token_type {requested_token_type:?}")));
        }

        let audience = self
            .audience
            .as_deref()
            .filter(|a| !a.is_empty())
            .map(Audience::from_str)
            .transpose()?;

        let scopes = match self.scope.as_deref() {
            Some(raw) => parse_scopes(raw)?,
            None => Vec::new(),
        };

        Ok(TokenExchange {
            audience,
            scopes,
            subject_token,
            subject_token_type,
            requested_token_type,
        })
    }
}

fn required(value: &Option<String>, name: &str) -> Result<String, OAuth2Error> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.clone()),
        _ => Err(OAuth2Error::new(ErrorType::InvalidRequest)
            .with_description(format!("missing {name}"))),
    }
}

/// A validated token-exchange request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenExchange {
    pub audience: Option<Audience>,
    pub scopes: Vec<Scope>,
    pub subject_token: String,
    pub subject_token_type: String,
    pub requested_token_type: String,
}

/// Successful token-exchange response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenExchangeResponse {
    pub access_token: String,
    pub issued_token_type: String,
    pub token_type: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
}

impl TokenExchangeResponse {
    /// Value for an `Authorization` header carrying the issued token.
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}
