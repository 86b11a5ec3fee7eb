// src/goals/codec.rs
// Goal name canonicalization
//
// A goal is identified by its canonical key: the trimmed user text wrapped in
// single quotes. Spreadsheets treat cells starting with `=`, `+`, `-` or `@`
// as formulas, so nothing user-typed is ever persisted unwrapped. The display
// name is the trimmed text without the wrapper.

use std::fmt;

use crate::error::{GoalError, Result};

const WRAPPER: char = '\'';

/// Stored identity of a goal, exactly as it appears in the `Goal` column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Matches a stored `Goal` cell against this key (exact equality).
    pub fn matches(&self, stored: &str) -> bool {
        self.0 == stored
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user-supplied goal name after validation: the display form plus its key.
///
/// Only [`GoalName::parse`] builds one, so a value of this type has always gone
/// through canonicalization exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalName {
    display: String,
    key: CanonicalKey,
}

impl GoalName {
    /// Trim and canonicalize raw user text.
    pub fn parse(raw: &str) -> Result<Self> {
        let display = raw.trim();
        if display.is_empty() {
            return Err(GoalError::InvalidInput("Goal name cannot be empty.".into()));
        }

        Ok(Self {
            display: display.to_string(),
            key: CanonicalKey(format!("{WRAPPER}{display}{WRAPPER}")),
        })
    }

    pub fn display_name(&self) -> &str {
        &self.display
    }

    pub fn key(&self) -> &CanonicalKey {
        &self.key
    }
}

impl fmt::Display for GoalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

/// Canonicalize raw text directly to its storage key.
pub fn canonicalize(raw: &str) -> Result<CanonicalKey> {
    GoalName::parse(raw).map(|name| name.key)
}

/// Display form of a stored `Goal` cell. Values written by something other
/// than this crate (no wrapper) are shown as-is.
pub fn display_from_stored(stored: &str) -> &str {
    stored
        .strip_prefix(WRAPPER)
        .and_then(|s| s.strip_suffix(WRAPPER))
        .unwrap_or(stored)
}
