//! Launch entry matchers and their evaluation against the build context
//!
//! A launch entry carries a list of matchers under `presentation.cmake`:
//!
//! ```jsonc
//! "cmake": [
//!     { "type": "preset-include", "value": "debug" },
//!     { "type": "kit-match", "value": "^gcc-1[0-9]$" }
//! ]
//! ```
//!
//! The entry is visible when any matcher matches the current context.

use std::collections::HashMap;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::context::BuildContext;
use crate::error::{Error, Result};

/// The six matcher kinds understood in `presentation.cmake`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatcherKind {
    PresetInclude,
    PresetMatch,
    KitInclude,
    KitMatch,
    Include,
    Match,
    /// A `type` this version does not know; never matches
    Unknown,
}

impl MatcherKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatcherKind::PresetInclude => "preset-include",
            MatcherKind::PresetMatch => "preset-match",
            MatcherKind::KitInclude => "kit-include",
            MatcherKind::KitMatch => "kit-match",
            MatcherKind::Include => "include",
            MatcherKind::Match => "match",
            MatcherKind::Unknown => "unknown",
        }
    }

    /// Kinds whose value is a regular expression
    pub fn is_pattern(&self) -> bool {
        matches!(
            self,
            MatcherKind::PresetMatch | MatcherKind::KitMatch | MatcherKind::Match
        )
    }
}

impl FromStr for MatcherKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "preset-include" => MatcherKind::PresetInclude,
            "preset-match" => MatcherKind::PresetMatch,
            "kit-include" => MatcherKind::KitInclude,
            "kit-match" => MatcherKind::KitMatch,
            "include" => MatcherKind::Include,
            "match" => MatcherKind::Match,
            _ => MatcherKind::Unknown,
        })
    }
}

impl std::fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire shape of a matcher inside launch.json
#[derive(Debug, Deserialize)]
struct RawMatcher {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    value: String,
}

/// A single declarative visibility rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawMatcher", into = "MatcherWire")]
pub struct Matcher {
    pub kind: MatcherKind,
    pub value: String,
}

#[derive(Serialize)]
struct MatcherWire {
    #[serde(rename = "type")]
    kind: &'static str,
    value: String,
}

impl From<RawMatcher> for Matcher {
    fn from(raw: RawMatcher) -> Self {
        let kind = raw
            .kind
            .as_deref()
            .map(|k| MatcherKind::from_str(k).unwrap_or(MatcherKind::Unknown))
            .unwrap_or(MatcherKind::Unknown);
        if kind == MatcherKind::Unknown {
            tracing::warn!(
                "Unknown matcher type {:?} for value '{}', it will never match",
                raw.kind,
                raw.value
            );
        }
        Self {
            kind,
            value: raw.value,
        }
    }
}

impl From<Matcher> for MatcherWire {
    fn from(matcher: Matcher) -> Self {
        Self {
            kind: matcher.kind.as_str(),
            value: matcher.value,
        }
    }
}

impl Matcher {
    pub fn new(kind: MatcherKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// Test this matcher against the context.
    ///
    /// Pattern kinds compile through `cache`; an invalid pattern is an error.
    pub fn matches(&self, context: &BuildContext, cache: &mut RegexCache) -> Result<bool> {
        let value = self.value.as_str();
        match self.kind {
            MatcherKind::PresetInclude => Ok(context.preset().is_some_and(|s| s.contains(value))),
            MatcherKind::KitInclude => Ok(context.kit().is_some_and(|s| s.contains(value))),
            MatcherKind::Include => Ok(context.subjects().any(|s| s.contains(value))),
            MatcherKind::PresetMatch => {
                let re = cache.compile(value)?;
                Ok(context.preset().is_some_and(|s| re.is_match(s)))
            }
            MatcherKind::KitMatch => {
                let re = cache.compile(value)?;
                Ok(context.kit().is_some_and(|s| re.is_match(s)))
            }
            MatcherKind::Match => {
                let re = cache.compile(value)?;
                Ok(context.subjects().any(|s| re.is_match(s)))
            }
            MatcherKind::Unknown => Ok(false),
        }
    }
}

/// Compiled patterns, keyed by their source text.
///
/// One cache lives for one document pass.
#[derive(Debug, Default)]
pub struct RegexCache {
    patterns: HashMap<String, Regex>,
}

impl RegexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `pattern`, reusing an earlier compilation when possible
    pub fn compile(&mut self, pattern: &str) -> Result<&Regex> {
        if !self.patterns.contains_key(pattern) {
            let re = Regex::new(pattern).map_err(|e| Error::pattern(pattern, e))?;
            self.patterns.insert(pattern.to_string(), re);
        }
        Ok(&self.patterns[pattern])
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Decide whether any matcher in `matchers` accepts `context`.
///
/// Returns `Ok(false)` without looking at the matchers when the context is
/// empty. Otherwise every pattern in the list is compiled before the scan,
/// so a broken pattern fails the evaluation no matter where it sits.
pub fn evaluate(matchers: &[Matcher], context: &BuildContext) -> Result<bool> {
    evaluate_with_cache(matchers, context, &mut RegexCache::new())
}

/// [`evaluate`] with a caller-owned pattern cache
pub fn evaluate_with_cache(
    matchers: &[Matcher],
    context: &BuildContext,
    cache: &mut RegexCache,
) -> Result<bool> {
    if context.is_empty() {
        return Ok(false);
    }

    for matcher in matchers.iter().filter(|m| m.kind.is_pattern()) {
        cache.compile(&matcher.value)?;
    }

    for matcher in matchers {
        if matcher.matches(context, cache)? {
            tracing::trace!("{} '{}' matched {}", matcher.kind, matcher.value, context);
            return Ok(true);
        }
    }

    Ok(false)
}
