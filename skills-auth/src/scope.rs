//! Scope alias table and scope resolution.
//!
//! Identity providers often spell scopes as long URIs
//! (`https://www.googleapis.com/auth/userinfo.email`) while operators prefer
//! short names (`email`). A [`ScopeAliasTable`] maps each short alias name to
//! one or more canonical scope identifiers and answers two questions:
//!
//! - **resolve**: is a required scope name satisfied by the scopes a provider
//!   granted, either literally or through one of its alias targets?
//! - **enrich**: which alias names should be exposed next to the canonical
//!   scopes, so consumers comparing plain strings see both spellings?
//!
//! Lookups are case-sensitive exact matches. No trimming or case folding is
//! performed here; configuration must already be normalized.

use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while building a [`ScopeAliasTable`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AliasError {
    #[error("Scope alias '{0}' has no target scopes")]
    EmptyTargets(String),
    #[error("Scope alias '{alias}' targets '{target}', which is itself an alias")]
    ChainedAlias { alias: String, target: String },
    #[error("Invalid scope alias entry '{0}', expected 'alias=scope [scope...]'")]
    InvalidEntry(String),
}

/// Immutable mapping from alias name to an ordered set of canonical scopes.
///
/// Invariants enforced on construction:
/// - every alias has at least one target;
/// - no target names a *different* alias, so enrichment never chains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeAliasTable {
    aliases: BTreeMap<String, Vec<String>>,
}

impl ScopeAliasTable {
    /// Create an empty table (no aliases, literal matching only)
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(alias, targets)` pairs.
    ///
    /// Repeated aliases have their targets merged. Duplicate targets are
    /// dropped while keeping first-seen order.
    pub fn from_entries<I, A, T, S>(entries: I) -> Result<Self, AliasError>
    where
        I: IntoIterator<Item = (A, T)>,
        A: Into<String>,
        T: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut aliases: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (alias, targets) in entries {
            let alias = alias.into();
            let slot = aliases.entry(alias.clone()).or_default();
            for target in targets {
                let target = target.into();
                if !slot.contains(&target) {
                    slot.push(target);
                }
            }
            if slot.is_empty() {
                return Err(AliasError::EmptyTargets(alias));
            }
        }

        for (alias, targets) in &aliases {
            if let Some(target) = targets
                .iter()
                .find(|target| *target != alias && aliases.contains_key(*target))
            {
                return Err(AliasError::ChainedAlias {
                    alias: alias.clone(),
                    target: target.clone(),
                });
            }
        }

        Ok(Self { aliases })
    }

    /// Returns the canonical targets of an alias, if it is one
    pub fn targets(&self, alias: &str) -> Option<&[String]> {
        self.aliases.get(alias).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Iterate over `(alias, targets)` in alias name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.aliases
            .iter()
            .map(|(alias, targets)| (alias.as_str(), targets.as_slice()))
    }

    /// Check whether `required` is satisfied by the granted canonical scopes.
    ///
    /// True if `required` was granted literally, or if it is an alias and at
    /// least one of its targets was granted.
    pub fn resolve(&self, required: &str, canonical: &HashSet<String>) -> bool {
        self.satisfied_by(required, canonical).is_some()
    }

    /// Like [`resolve`](Self::resolve), but returns the granted scopes that
    /// satisfied the requirement.
    pub fn satisfied_by(&self, required: &str, canonical: &HashSet<String>) -> Option<Vec<String>> {
        if canonical.contains(required) {
            return Some(vec![required.to_string()]);
        }
        let matched: Vec<String> = self
            .targets(required)?
            .iter()
            .filter(|target| canonical.contains(*target))
            .cloned()
            .collect();
        (!matched.is_empty()).then_some(matched)
    }

    /// Expand granted scopes with every alias whose targets intersect them.
    ///
    /// The granted order is preserved (without duplicates) and alias names
    /// are appended in table order.
    pub fn enrich(&self, canonical: &[String]) -> Vec<String> {
        let mut enriched: Vec<String> = Vec::with_capacity(canonical.len() + self.len());
        for scope in canonical {
            if !enriched.contains(scope) {
                enriched.push(scope.clone());
            }
        }

        let granted: HashSet<&str> = canonical.iter().map(String::as_str).collect();
        for (alias, targets) in self.iter() {
            let intersects = targets.iter().any(|t| granted.contains(t.as_str()));
            if intersects && !enriched.iter().any(|s| s == alias) {
                enriched.push(alias.to_string());
            }
        }
        enriched
    }
}

/// Parses `alias=scope [scope...],alias2=scope` (the environment variable form)
impl FromStr for ScopeAliasTable {
    type Err = AliasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut entries = Vec::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (alias, targets) = entry
                .split_once('=')
                .ok_or_else(|| AliasError::InvalidEntry(entry.to_string()))?;
            let alias = alias.trim();
            if alias.is_empty() {
                return Err(AliasError::InvalidEntry(entry.to_string()));
            }
            let targets: Vec<String> = targets.split_whitespace().map(String::from).collect();
            entries.push((alias.to_string(), targets));
        }
        Self::from_entries(entries)
    }
}

/// Deserializes from a map of alias name to a list of targets, validating
/// the table invariants.
impl<'de> Deserialize<'de> for ScopeAliasTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Vec<String>>::deserialize(deserializer)?;
        Self::from_entries(raw).map_err(serde::de::Error::custom)
    }
}
