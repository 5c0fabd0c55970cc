use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::{Error, Result};

/// Thin wrapper over the `git` CLI, rooted at the repository top level.
#[derive(Debug, Clone)]
pub struct Git {
    root: PathBuf,
}

impl Git {
    /// Discover the repository containing `dir` via `git rev-parse --show-toplevel`.
    pub fn discover(dir: &Path) -> Result<Self> {
        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(dir)
            .output()
            .map_err(|e| Error::NotARepository(format!("failed to run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::NotARepository(stderr.trim().to_string()));
        }

        let top = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if top.is_empty() {
            return Err(Error::NotARepository(format!(
                "no top-level directory for {}",
                dir.display()
            )));
        }

        let root = PathBuf::from(top);
        // Canonicalize so paths compare equal with canonicalized file arguments
        let root = root.canonicalize().unwrap_or(root);
        debug!(root = %root.display(), "discovered repository");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths (relative to the root) printed by `git diff --name-only [range]`.
    pub fn diff_names(&self, range: Option<&str>) -> Result<Vec<String>> {
        let mut args = vec!["diff", "--name-only"];
        if let Some(range) = range {
            args.push(range);
        }
        let output = self
            .git(&args)
            .map_err(|e| Error::Process(format!("git {} failed: {}", args.join(" "), e.trim())))?;

        Ok(output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Raw `git blame` output for a file.
    pub fn blame(&self, path: &Path) -> std::result::Result<String, String> {
        let path_str = path.to_string_lossy();
        self.git(&["blame", "--", &path_str])
    }

    /// Run a git command in the repo root.
    fn git(&self, args: &[&str]) -> std::result::Result<String, String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| format!("failed to run git: {e}"))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(String::from_utf8_lossy(&output.stderr).to_string())
        }
    }
}

