//! Keyword-based gate between model output and statement execution.
//!
//! This is a heuristic, not a parser: semicolons and keywords inside quoted
//! string literals are treated exactly like statement-level syntax.

use crate::llm::prompt::INVALID_QUERY_SENTINEL;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static ALLOWED_DML: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(SELECT|INSERT|UPDATE|DELETE)\b").expect("static regex is valid")
});

static DISALLOWED_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(CREATE|ALTER|DROP|TRUNCATE|GRANT|REVOKE|VACUUM|REINDEX|REFRESH)\b")
        .expect("static regex is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsafeReason {
    /// Does not start with SELECT, INSERT, UPDATE or DELETE.
    NotDml,
    DisallowedKeyword(String),
    MultipleStatements,
}

impl fmt::Display for UnsafeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnsafeReason::NotDml => write!(f, "does not start with an allowed DML keyword"),
            UnsafeReason::DisallowedKeyword(kw) => {
                write!(f, "contains disallowed keyword {}", kw.to_uppercase())
            }
            UnsafeReason::MultipleStatements => write!(f, "contains multiple statements"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedStatement {
    Safe(String),
    Invalid,
    Unsafe(UnsafeReason),
}

/// Classifies raw model output. Pure and deterministic.
pub fn classify(raw_text: &str) -> ValidatedStatement {
    let sql = raw_text.trim();

    if sql.is_empty() || sql == INVALID_QUERY_SENTINEL {
        return ValidatedStatement::Invalid;
    }

    if !ALLOWED_DML.is_match(sql) {
        return ValidatedStatement::Unsafe(UnsafeReason::NotDml);
    }

    if let Some(found) = DISALLOWED_KEYWORDS.find(sql) {
        return ValidatedStatement::Unsafe(UnsafeReason::DisallowedKeyword(
            found.as_str().to_string(),
        ));
    }

    // A semicolon left after stripping the ends, with more than one overall,
    // means stacked statements.
    let interior = sql.trim_matches(|c: char| c.is_whitespace() || c == ';');
    if interior.contains(';') && sql.matches(';').count() > 1 {
        return ValidatedStatement::Unsafe(UnsafeReason::MultipleStatements);
    }

    ValidatedStatement::Safe(sql.to_string())
}
