//! Route classification table.
//!
//! Patterns use the path-matcher syntax the provider's SDKs use:
//! - literal characters match themselves
//! - `(...)` is a raw regular-expression group, e.g. `/sign-in(.*)`
//! - `:name` matches a single path segment
//!
//! Matching is case-insensitive and tolerates one trailing slash.
//! The table is built once at start-up and shared read-only.

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    Public,
    AdminOnly,
    DefaultProtected,
}

#[derive(Debug, Error)]
pub enum RoutePatternError {
    #[error("route pattern must start with '/': {0:?}")]
    NotAbsolute(String),
    #[error("unbalanced parentheses in route pattern {0:?}")]
    Unbalanced(String),
    #[error("invalid route pattern {pattern:?}: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub const DEFAULT_PUBLIC_ROUTES: &[&str] = &["/", "/sign-in(.*)", "/sign-up(.*)", "/health"];
pub const DEFAULT_ADMIN_ROUTES: &[&str] = &["/admin(.*)"];

#[derive(Debug, Clone)]
struct RouteRule {
    pattern: String,
    regex: Regex,
    class: RouteClass,
}

/// Ordered pattern → class mappings. First match wins; unmatched paths are
/// `DefaultProtected`.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. Rules added earlier take precedence.
    pub fn with_rule(mut self, pattern: &str, class: RouteClass) -> Result<Self, RoutePatternError> {
        let regex = compile(pattern)?;
        self.rules.push(RouteRule {
            pattern: pattern.to_string(),
            regex,
            class,
        });
        Ok(self)
    }

    /// Build the table from the two configured pattern lists.
    ///
    /// Admin patterns are checked first, so a path listed in both lists stays
    /// admin-only.
    pub fn from_patterns<A, P>(admin: &[A], public: &[P]) -> Result<Self, RoutePatternError>
    where
        A: AsRef<str>,
        P: AsRef<str>,
    {
        let table = admin.iter().try_fold(Self::new(), |t, p| {
            t.with_rule(p.as_ref(), RouteClass::AdminOnly)
        })?;
        public
            .iter()
            .try_fold(table, |t, p| t.with_rule(p.as_ref(), RouteClass::Public))
    }

    pub fn defaults() -> Result<Self, RoutePatternError> {
        Self::from_patterns(DEFAULT_ADMIN_ROUTES, DEFAULT_PUBLIC_ROUTES)
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        self.rules
            .iter()
            .find(|r| r.regex.is_match(path))
            .map(|r| r.class)
            .unwrap_or(RouteClass::DefaultProtected)
    }

    /// Configured patterns, in evaluation order (for start-up logging).
    pub fn patterns(&self) -> impl Iterator<Item = (&str, RouteClass)> {
        self.rules.iter().map(|r| (r.pattern.as_str(), r.class))
    }
}

fn compile(pattern: &str) -> Result<Regex, RoutePatternError> {
    if !pattern.starts_with('/') {
        return Err(RoutePatternError::NotAbsolute(pattern.to_string()));
    }

    let mut out = String::from("^");
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '(' => {
                // Copy the group verbatim up to its matching ')'.
                let mut depth = 1;
                out.push('(');
                for g in chars.by_ref() {
                    out.push(g);
                    match g {
                        '(' => depth += 1,
                        ')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                }
                if depth != 0 {
                    return Err(RoutePatternError::Unbalanced(pattern.to_string()));
                }
            }
            ')' => return Err(RoutePatternError::Unbalanced(pattern.to_string())),
            ':' if chars.peek().is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') => {
                while chars
                    .peek()
                    .is_some_and(|n| n.is_ascii_alphanumeric() || *n == '_')
                {
                    chars.next();
                }
                out.push_str("[^/]+");
            }
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    if !pattern.ends_with('/') {
        out.push_str("/?");
    }
    out.push('$');

    RegexBuilder::new(&out)
        .case_insensitive(true)
        .build()
        .map_err(|source| RoutePatternError::Regex {
            pattern: pattern.to_string(),
            source,
        })
}
