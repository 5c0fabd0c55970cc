use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::git::Git;

/// Author name followed by the first four digits of the blame timestamp.
static AUTHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([\w\s]+)\d{4}").expect("valid author regex"));

/// Per-line authorship for one file, snapshotted at blame time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blame {
    path: PathBuf,
    authors: Vec<Option<String>>,
}

impl Blame {
    /// Parse blame output, one entry per output line.
    ///
    /// A line the author pattern does not match yields an unknown author;
    /// it never shortens the record.
    pub fn parse(path: impl Into<PathBuf>, output: &str) -> Self {
        let authors = output
            .lines()
            .map(|line| {
                AUTHOR_RE
                    .captures(line)
                    .map(|caps| caps[1].trim().to_string())
                    .filter(|name| !name.is_empty())
            })
            .collect();
        Self {
            path: path.into(),
            authors,
        }
    }

    /// Number of lines in the file when it was blamed.
    pub fn len(&self) -> usize {
        self.authors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }

    /// Author of a 1-based line; `Ok(None)` when the line's author is unknown.
    ///
    /// A line past the end of the record means blame and issue data disagree
    /// about the file's length, which is reported as `Inconsistent`.
    pub fn author(&self, line: u32) -> Result<Option<&str>> {
        let index = (line as usize).checked_sub(1).ok_or_else(|| Error::Inconsistent {
            path: self.path.clone(),
            detail: "line numbers start at 1".to_string(),
        })?;
        self.authors
            .get(index)
            .map(Option::as_deref)
            .ok_or_else(|| Error::Inconsistent {
                path: self.path.clone(),
                detail: format!(
                    "issue on line {line} but blame covers {} lines",
                    self.authors.len()
                ),
            })
    }
}

pub trait BlameProvider {
    /// Fetch fresh authorship for `path`. Never cached across calls.
    fn blame(&self, path: &Path) -> Result<Blame>;
}

/// Blame provider backed by `git blame`.
pub struct GitBlame {
    git: Git,
}

impl GitBlame {
    pub fn new(git: Git) -> Self {
        Self { git }
    }
}

impl BlameProvider for GitBlame {
    fn blame(&self, path: &Path) -> Result<Blame> {
        let output = self.git.blame(path).map_err(|e| Error::BlameUnavailable {
            path: path.to_path_buf(),
            reason: e.trim().to_string(),
        })?;
        let blame = Blame::parse(path, &output);
        debug!(path = %path.display(), lines = blame.len(), "blamed file");
        Ok(blame)
    }
}
