//! Redirect URI allow-listing for the authorization callback flow.
//!
//! A pattern is either an exact URI or a prefix ending in `*`
//! (`https://claude.ai/*`, `http://localhost:*`). Matching is byte-wise and
//! case-sensitive; nothing is normalized.

use log::warn;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while parsing redirect URI patterns
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RedirectPatternError {
    #[error("Redirect URI pattern is empty")]
    Empty,
    #[error("Redirect URI pattern '{0}' may only use '*' as its final character")]
    MisplacedWildcard(String),
}

/// A single allow-list entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectUriPattern {
    /// Candidate must be byte-equal
    Exact(String),
    /// Candidate must start with the fixed prefix (pattern without its `*`)
    Prefix(String),
}

impl RedirectUriPattern {
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            RedirectUriPattern::Exact(uri) => candidate == uri.as_str(),
            RedirectUriPattern::Prefix(prefix) => candidate.starts_with(prefix.as_str()),
        }
    }
}

impl FromStr for RedirectUriPattern {
    type Err = RedirectPatternError;

    fn from_str(pattern: &str) -> Result<Self, Self::Err> {
        if pattern.is_empty() {
            return Err(RedirectPatternError::Empty);
        }
        match pattern.strip_suffix('*') {
            Some(prefix) if prefix.contains('*') => {
                Err(RedirectPatternError::MisplacedWildcard(pattern.to_string()))
            }
            Some(prefix) => Ok(RedirectUriPattern::Prefix(prefix.to_string())),
            None if pattern.contains('*') => {
                Err(RedirectPatternError::MisplacedWildcard(pattern.to_string()))
            }
            None => Ok(RedirectUriPattern::Exact(pattern.to_string())),
        }
    }
}

impl fmt::Display for RedirectUriPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectUriPattern::Exact(uri) => f.write_str(uri),
            RedirectUriPattern::Prefix(prefix) => write!(f, "{prefix}*"),
        }
    }
}

/// Which redirect URIs an authorization callback may send the user agent to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RedirectUriPolicy {
    /// No allow-list configured. Every URI is accepted; development only.
    #[default]
    Unrestricted,
    /// Only URIs matching at least one pattern are accepted
    AllowList(Vec<RedirectUriPattern>),
}

impl RedirectUriPolicy {
    /// Build a policy from configured pattern strings.
    ///
    /// An empty list yields [`RedirectUriPolicy::Unrestricted`].
    pub fn from_patterns<I, S>(patterns: I) -> Result<Self, RedirectPatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| p.as_ref().parse())
            .collect::<Result<Vec<RedirectUriPattern>, _>>()?;

        if patterns.is_empty() {
            warn!("No allowed redirect URIs configured, accepting any redirect URI");
            return Ok(RedirectUriPolicy::Unrestricted);
        }
        Ok(RedirectUriPolicy::AllowList(patterns))
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, RedirectUriPolicy::Unrestricted)
    }

    /// Check a candidate redirect URI against the policy
    pub fn is_allowed(&self, candidate: &str) -> bool {
        match self {
            RedirectUriPolicy::Unrestricted => true,
            RedirectUriPolicy::AllowList(patterns) => patterns.iter().any(|p| p.matches(candidate)),
        }
    }
}
