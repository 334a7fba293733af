//! OAuth2 token-exchange contract (RFC 8693): scopes, audiences, token
//! types, request/response shapes and the OAuth2 error body.

mod error;
mod exchange;
mod scope;

pub use error::{ErrorType, OAuth2Error};
pub use exchange::{
    Audience, GRANT_TYPE_TOKEN_EXCHANGE, TOKEN_TYPE_ACCESS_TOKEN, TOKEN_TYPE_ID_TOKEN,
    TOKEN_TYPE_JWT, TokenExchange, TokenExchangeRequest, TokenExchangeResponse,
};
pub use scope::{
    ORGANIZATION_PREFIX, OrganizationScopeParser, Scope, ScopeParser, ScopeType, parse_scope,
    parse_scopes,
};
