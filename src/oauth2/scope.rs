//! Scope values carried in token-exchange requests.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use super::error::{ErrorType, OAuth2Error};

/// Prefix of an organization scope, e.g. `upbound:org:acme`.
pub const ORGANIZATION_PREFIX: &str = "upbound:org:";

pub const ORGANIZATION_NAME_MIN_LEN: usize = 2;
pub const ORGANIZATION_NAME_MAX_LEN: usize = 100;

static ORGANIZATION_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(([a-zA-Z0-9]+-?)*[a-zA-Z0-9])$")
        .unwrap_or_else(|e| unreachable!("organization name pattern: {e}"))
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeType {
    Organization,
}

impl ScopeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeType::Organization => "organization",
        }
    }
}

/// A parsed scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Access to a single organization, by name.
    Organization(String),
}

impl Scope {
    pub fn scope_type(&self) -> ScopeType {
        match self {
            Scope::Organization(_) => ScopeType::Organization,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Organization(name) => write!(f, "{ORGANIZATION_PREFIX}{name}"),
        }
    }
}

impl FromStr for Scope {
    type Err = OAuth2Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_scope(raw).ok_or_else(|| {
            OAuth2Error::new(ErrorType::InvalidScope)
                .with_description(format!("unrecognised scope {raw:?}"))
        })
    }
}

/// Recognises one family of scope strings.
pub trait ScopeParser: Send + Sync {
    /// Returns the scope when `raw` belongs to this family and is well formed.
    fn parse(&self, raw: &str) -> Option<Scope>;
}

/// Parses `upbound:org:<name>` scopes.
///
/// Names are 2 to 100 characters of ASCII letters and digits, optionally
/// separated by single dashes, and never start or end with a dash.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrganizationScopeParser;

impl ScopeParser for OrganizationScopeParser {
    fn parse(&self, raw: &str) -> Option<Scope> {
        let name = raw.strip_prefix(ORGANIZATION_PREFIX)?;
        if !(ORGANIZATION_NAME_MIN_LEN..=ORGANIZATION_NAME_MAX_LEN).contains(&name.len()) {
            return None;
        }
        ORGANIZATION_NAME
            .is_match(name)
            .then(|| Scope::Organization(name.to_string()))
    }
}

static PARSERS: &[&dyn ScopeParser] = &[&OrganizationScopeParser];

/// Parses `raw` with every known scope family.
pub fn parse_scope(raw: &str) -> Option<Scope> {
    PARSERS.iter().find_map(|p| p.parse(raw))
}

/// Parses a space-delimited scope list. Fails on the first unknown entry.
pub fn parse_scopes(raw: &str) -> Result<Vec<Scope>, OAuth2Error> {
    raw.split(' ')
        .filter(|s| !s.is_empty())
        .map(Scope::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_organization() {
        assert_eq!(
            parse_scope("upbound:org:acme-co"),
            Some(Scope::Organization("acme-co".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_leading_dash() {
        assert_eq!(parse_scope("upbound:org:-bad"), None);
    }

    #[test]
    fn test_parse_rejects_trailing_and_double_dash() {
        assert_eq!(parse_scope("upbound:org:bad-"), None);
        assert_eq!(parse_scope("upbound:org:a--b"), None);
    }

    #[test]
    fn test_parse_allows_repeated_internal_dashes() {
        assert!(parse_scope("upbound:org:a-b-c-d").is_some());
    }

    #[test]
    fn test_parse_length_bounds() {
        assert_eq!(parse_scope("upbound:org:a"), None);
        assert!(parse_scope("upbound:org:ab").is_some());

        let longest = "a".repeat(ORGANIZATION_NAME_MAX_LEN);
        assert!(parse_scope(&format!("{ORGANIZATION_PREFIX}{longest}")).is_some());
        let too_long = "a".repeat(ORGANIZATION_NAME_MAX_LEN + 1);
        assert_eq!(parse_scope(&format!("{ORGANIZATION_PREFIX}{too_long}")), None);
    }

    #[test]
    fn test_parse_rejects_unknown_prefix() {
        assert_eq!(parse_scope("upbound:team:acme"), None);
        assert_eq!(parse_scope("acme"), None);
        assert_eq!(parse_scope(""), None);
    }

    #[test]
    fn test_parse_rejects_non_alphanumeric() {
        assert_eq!(parse_scope("upbound:org:acme_co"), None);
        assert_eq!(parse_scope("upbound:org:acmé"), None);
    }

    #[test]
    fn test_reserialize_is_identity() {
        for raw in ["upbound:org:acme-co", "upbound:org:A1", "upbound:org:x-1-y"] {
            assert_eq!(parse_scope(raw).unwrap().to_string(), raw);
        }
    }

    #[test]
    fn test_scope_type() {
        let scope: Scope = "upbound:org:acme".parse().unwrap();
        assert_eq!(scope.scope_type(), ScopeType::Organization);
        assert_eq!(scope.scope_type().as_str(), "organization");
    }

    #[test]
    fn test_parse_scopes_list() {
        let scopes = parse_scopes("upbound:org:one  upbound:org:two").unwrap();
        assert_eq!(scopes.len(), 2);

        let err = parse_scopes("upbound:org:one nope").unwrap_err();
        assert_eq!(err.kind(), ErrorType::InvalidScope);
    }
}
