//! Lexical URL path joining.
//!
//! `clean_join("v1/teams", "a//b/../c")` is `"v1/teams/a/c"`. Joining is purely
//! textual: duplicate separators collapse, `.` segments drop, and `..` removes
//! the preceding segment. A `..` with nothing left to remove is discarded, so
//! the result can never climb above the point it is joined onto.

/// Joins `parts` with `/` and cleans the result. Empty parts are skipped; the
/// result never starts or ends with `/`.
pub fn clean_join(parts: &[&str]) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for part in parts {
        for segment in part.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                s => segments.push(s),
            }
        }
    }
    segments.join("/")
}

/// Appends `joined` beneath `base_path`, keeping exactly one separator.
///
/// The result always starts with a single `/`, so it can never be read as a
/// scheme-relative reference (`//host/...`).
pub fn under_base(base_path: &str, joined: &str) -> String {
    let base = base_path.trim_matches('/');
    match (base.is_empty(), joined.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{joined}"),
        (false, true) => format!("/{base}"),
        (false, false) => format!("/{base}/{joined}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_join() {
        assert_eq!(clean_join(&["v1/teams", "abc"]), "v1/teams/abc");
    }

    #[test]
    fn test_empty_sub_path_yields_prefix() {
        assert_eq!(clean_join(&["v1/teams", ""]), "v1/teams");
    }

    #[test]
    fn test_collapses_duplicate_separators() {
        assert_eq!(clean_join(&["/v1//teams/", "/abc/"]), "v1/teams/abc");
    }

    #[test]
    fn test_resolves_dot_segments() {
        assert_eq!(clean_join(&["v1/teams", "./a/../b"]), "v1/teams/b");
    }

    #[test]
    fn test_cannot_escape_above_root() {
        assert_eq!(clean_join(&["v1", "../../../etc"]), "etc");
        assert_eq!(clean_join(&["..", ".."]), "");
    }

    #[test]
    fn test_under_base() {
        assert_eq!(under_base("/api", "v1/teams"), "/api/v1/teams");
        assert_eq!(under_base("/api/", "v1/teams"), "/api/v1/teams");
        assert_eq!(under_base("/", "v1/self"), "/v1/self");
        assert_eq!(under_base("", "v1/self"), "/v1/self");
        assert_eq!(under_base("/api", ""), "/api");
        assert_eq!(under_base("/", ""), "/");
    }

    #[test]
    fn test_under_base_collapses_leading_slashes() {
        assert_eq!(under_base("//api", "v1/teams"), "/api/v1/teams");
        assert_eq!(under_base("///api//", ""), "/api");
        assert_eq!(under_base("//", "v1"), "/v1");
    }
}
