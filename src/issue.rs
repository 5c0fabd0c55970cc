//! Issue records and the best-effort parsers that extract them from
//! provider output.

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Which provider reported an issue. Declaration order is the fixed
/// priority order used when several providers report on one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProviderKind {
    Style,
    Lint,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Style => write!(f, "style"),
            ProviderKind::Lint => write!(f, "lint"),
        }
    }
}

/// Visual category derived from an issue code's leading letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Convention,
    Info,
}

impl Severity {
    pub fn from_code(code: &str) -> Self {
        match code.chars().next().map(|c| c.to_ascii_uppercase()) {
            Some('F' | 'E') => Severity::Error,
            Some('W') => Severity::Warning,
            Some('C' | 'R') => Severity::Convention,
            _ => Severity::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub source: ProviderKind,
    pub line: u32,
    pub column: String,
    pub code: String,
    pub message: String,
}

impl Issue {
    pub fn severity(&self) -> Severity {
        Severity::from_code(&self.code)
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}: [{}] {}",
            self.line, self.column, self.code, self.message
        )
    }
}

/// Lossy line matcher: maps raw provider text to the issues it recognizes.
///
/// Lines that do not match the pattern, or whose line number does not parse
/// as a positive integer, are dropped without error. Provider preambles and
/// summaries rely on this; a provider whose format drifts therefore yields
/// zero issues rather than a failure.
pub struct LineMatcher {
    source: ProviderKind,
    pattern: Regex,
    extract: Extract,
}

type Extract = fn(&Captures<'_>) -> Option<(u32, String, String, String)>;

impl LineMatcher {
    fn new(source: ProviderKind, pattern: &str, extract: Extract) -> Self {
        Self {
            source,
            pattern: Regex::new(pattern).expect("valid issue pattern"),
            extract,
        }
    }

    /// Lazily yield issues from `text`. Each call restarts from the beginning.
    pub fn matches<'a>(&'a self, text: &'a str) -> impl Iterator<Item = Issue> + 'a {
        self.pattern.captures_iter(text).filter_map(move |caps| {
            let (line, column, code, message) = (self.extract)(&caps)?;
            if line == 0 {
                return None;
            }
            Some(Issue {
                source: self.source,
                line,
                column,
                code,
                message: message.trim().to_string(),
            })
        })
    }
}

/// `<path>:<line>:<column>: <code> <message>`
pub static STYLE_MATCHER: LazyLock<LineMatcher> = LazyLock::new(|| {
    LineMatcher::new(
        ProviderKind::Style,
        r"(?m)\w+:(\d+):(\d+):\s(\w+)\s(.+)$",
        |caps| {
            Some((
                caps[1].parse().ok()?,
                caps[2].to_string(),
                caps[3].to_string(),
                caps[4].to_string(),
            ))
        },
    )
});

/// `<letter>: <line>, <column>: <message>`
pub static LINT_MATCHER: LazyLock<LineMatcher> = LazyLock::new(|| {
    LineMatcher::new(
        ProviderKind::Lint,
        r"(?m)^(\w):\s+(\d+),\s*(\d+):\s(.+)$",
        |caps| {
            Some((
                caps[2].parse().ok()?,
                caps[3].to_string(),
                caps[1].to_string(),
                caps[4].to_string(),
            ))
        },
    )
});

/// The matcher for a provider's text format.
pub fn matcher_for(kind: ProviderKind) -> &'static LineMatcher {
    match kind {
        ProviderKind::Style => &*STYLE_MATCHER,
        ProviderKind::Lint => &*LINT_MATCHER,
    }
}
