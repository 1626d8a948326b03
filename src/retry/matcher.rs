// src/retry/matcher.rs

use std::collections::HashMap;
use std::fmt;

use regex::Regex;
use tracing::trace;

use crate::errors::{Result, TfrunnerError};

/// A compiled retry pattern and the human-readable reason it stands for.
#[derive(Clone)]
pub struct CompiledPattern {
    regex: Regex,
    description: String,
}

impl CompiledPattern {
    pub fn new(pattern: &str, description: impl Into<String>) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| TfrunnerError::InvalidRetryPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            regex,
            description: description.into(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPattern")
            .field("pattern", &self.pattern())
            .field("description", &self.description)
            .finish()
    }
}

/// Classifies failed attempts as transient by matching their output.
///
/// Patterns are compiled once, up front. A malformed pattern is a
/// configuration error and fails construction, naming the pattern.
#[derive(Debug, Clone, Default)]
pub struct RetryMatcher {
    patterns: Vec<CompiledPattern>,
}

impl RetryMatcher {
    /// Compile every `pattern -> description` entry.
    ///
    /// Entries are compiled in sorted pattern order, so when two patterns
    /// overlap the lexicographically smaller one wins consistently.
    pub fn new(patterns: &HashMap<String, String>) -> Result<Self> {
        let mut entries: Vec<(&String, &String)> = patterns.iter().collect();
        entries.sort();

        let patterns = entries
            .into_iter()
            .map(|(pattern, description)| CompiledPattern::new(pattern, description.as_str()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Return the description of the first pattern matching the combined
    /// `stdout + "\n" + stderr (+ "\n" + error)` text, trimmed.
    pub fn find_match(&self, stdout: &str, stderr: &str, error: Option<&str>) -> Option<&str> {
        if self.patterns.is_empty() {
            return None;
        }

        let mut combined = String::with_capacity(stdout.len() + stderr.len() + 2);
        combined.push_str(stdout);
        combined.push('\n');
        combined.push_str(stderr);
        if let Some(err) = error {
            combined.push('\n');
            combined.push_str(err);
        }
        let combined = combined.trim();

        let matched = self.patterns.iter().find(|p| p.is_match(combined))?;
        trace!(pattern = matched.pattern(), "retry pattern matched");
        Some(matched.description())
    }
}
