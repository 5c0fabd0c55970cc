use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::aggregate::IssueMap;
use crate::blame::{Blame, BlameProvider};
use crate::error::{Error, Result};
use crate::provider::IssueProvider;

/// The text of a file as it was when its issues were collected.
#[derive(Debug, Default)]
pub struct SourceText {
    lines: Vec<String>,
}

impl SourceText {
    pub fn new(contents: &str) -> Self {
        Self {
            lines: contents.lines().map(str::to_string).collect(),
        }
    }

    /// Read `path` lossily. An unreadable file yields no lines, so the
    /// report simply omits source context for it.
    pub async fn read(path: &Path) -> Self {
        match tokio::fs::read(path).await {
            Ok(bytes) => Self::new(&String::from_utf8_lossy(&bytes)),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "source unreadable");
                Self::default()
            }
        }
    }

    /// The 1-based `line`, trimmed.
    pub fn line(&self, line: u32) -> Option<&str> {
        let idx = (line as usize).checked_sub(1)?;
        self.lines.get(idx).map(|l| l.trim())
    }
}

/// Result of analyzing one file.
#[derive(Debug)]
pub enum FileOutcome {
    Analyzed {
        issues: IssueMap,
        blame: Blame,
        source: SourceText,
    },
    /// A file-scoped failure; other files in the run are unaffected.
    Failed(Error),
}

#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

/// Everything one full run produced, in working-set order.
#[derive(Debug)]
pub struct Report {
    pub files: Vec<FileReport>,
    pub elapsed: Duration,
}

pub struct Analyzer<P, B> {
    providers: Vec<P>,
    blame: B,
}

impl<P: IssueProvider, B: BlameProvider> Analyzer<P, B> {
    /// `providers` are invoked in the order given.
    pub fn new(providers: Vec<P>, blame: B) -> Self {
        Self { providers, blame }
    }

    /// Analyze every file, one after another.
    ///
    /// File-scoped errors are captured in that file's report; any other
    /// error aborts the run.
    pub async fn run(&self, files: &[PathBuf]) -> Result<Report> {
        let started = Instant::now();
        let mut reports = Vec::with_capacity(files.len());

        for path in files {
            let outcome = match self.analyze_file(path).await {
                Ok((issues, blame, source)) => FileOutcome::Analyzed {
                    issues,
                    blame,
                    source,
                },
                Err(e) if e.is_file_scoped() => {
                    warn!(path = %path.display(), error = %e, "skipping file");
                    FileOutcome::Failed(e)
                }
                Err(e) => return Err(e),
            };
            reports.push(FileReport {
                path: path.clone(),
                outcome,
            });
        }

        let elapsed = started.elapsed();
        info!(
            files = reports.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "run complete"
        );
        Ok(Report {
            files: reports,
            elapsed,
        })
    }

    async fn analyze_file(&self, path: &Path) -> Result<(IssueMap, Blame, SourceText)> {
        let blame = self.blame.blame(path)?;
        let source = SourceText::read(path).await;

        let mut issues = IssueMap::new();
        for provider in &self.providers {
            issues.extend(provider.issues(path).await?);
        }

        if let Some(max_line) = issues.max_line()
            && max_line as usize > blame.len()
        {
            return Err(Error::Inconsistent {
                path: path.to_path_buf(),
                detail: format!(
                    "issue on line {max_line} but blame covers {} lines",
                    blame.len()
                ),
            });
        }

        Ok((issues, blame, source))
    }
}
