//! Route group classification.
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - A group matches its own path and anything below it (`/words`,
//!   `/words/42`) but never a sibling sharing the prefix (`/wordsmith`)

/// Coarse route group, used as a metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGroup {
    User,
    Experience,
    Words,
    Health,
    Other,
}

impl RouteGroup {
    /// Classify `path` relative to the versioned API prefix.
    pub fn classify(api_prefix: &str, path: &str) -> Self {
        if under(path, "/health") {
            return RouteGroup::Health;
        }
        let Some(rest) = path.strip_prefix(api_prefix) else {
            return RouteGroup::Other;
        };
        if under(rest, "/user") {
            RouteGroup::User
        } else if under(rest, "/experience") {
            RouteGroup::Experience
        } else if under(rest, "/words") {
            RouteGroup::Words
        } else {
            RouteGroup::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteGroup::User => "user",
            RouteGroup::Experience => "experience",
            RouteGroup::Words => "words",
            RouteGroup::Health => "health",
            RouteGroup::Other => "other",
        }
    }
}

/// True when `path` is `prefix` or a sub-path of it.
fn under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "/api/v1";

    #[test]
    fn test_groups_under_prefix() {
        assert_eq!(RouteGroup::classify(PREFIX, "/api/v1/user"), RouteGroup::User);
        assert_eq!(RouteGroup::classify(PREFIX, "/api/v1/user/signup"), RouteGroup::User);
        assert_eq!(
            RouteGroup::classify(PREFIX, "/api/v1/experience"),
            RouteGroup::Experience
        );
        assert_eq!(RouteGroup::classify(PREFIX, "/api/v1/words/42"), RouteGroup::Words);
        assert_eq!(RouteGroup::classify(PREFIX, "/health"), RouteGroup::Health);
    }

    #[test]
    fn test_sibling_prefix_does_not_match() {
        assert_eq!(RouteGroup::classify(PREFIX, "/api/v1/wordsmith"), RouteGroup::Other);
        assert_eq!(RouteGroup::classify(PREFIX, "/api/v1/users"), RouteGroup::Other);
        assert_eq!(RouteGroup::classify(PREFIX, "/healthz"), RouteGroup::Other);
    }

    #[test]
    fn test_other_versions_and_paths() {
        assert_eq!(RouteGroup::classify(PREFIX, "/api/v2/user"), RouteGroup::Other);
        assert_eq!(RouteGroup::classify(PREFIX, "/"), RouteGroup::Other);
        assert_eq!(RouteGroup::classify(PREFIX, "/API/v1/user"), RouteGroup::Other);
    }
}
