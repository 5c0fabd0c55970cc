//! Working-set resolution: which files the watch loop should track.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::git::Git;

/// How the working set is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// One explicit file, stored as an absolute path.
    File(PathBuf),
    /// Every matching file directly inside a directory (non-recursive).
    Directory(PathBuf),
    /// Files changed in the working tree plus files changed on the branch.
    Branch,
}

impl Mode {
    /// Pick a mode from the CLI arguments.
    ///
    /// `--branch`, or no target at all, selects branch mode. Relative
    /// targets are resolved against `cwd`.
    pub fn from_args(target: Option<&Path>, branch: bool, cwd: &Path) -> Result<Self> {
        if branch {
            return Ok(Mode::Branch);
        }
        let Some(target) = target else {
            return Ok(Mode::Branch);
        };
        if target.as_os_str().is_empty() {
            return Err(Error::InvalidArgument(
                "please provide a file or directory".to_string(),
            ));
        }
        let path = cwd.join(target);
        if path.is_dir() {
            Ok(Mode::Directory(absolute(&path)))
        } else {
            Ok(Mode::File(absolute(&path)))
        }
    }
}

/// Anything that can produce the current working set.
pub trait WorkingSetSource {
    fn resolve(&self) -> Result<BTreeSet<PathBuf>>;
}

pub struct FileSetResolver {
    mode: Mode,
    git: Git,
    suffix: String,
    base_branch: String,
}

impl FileSetResolver {
    /// Validate the mode up front so argument errors surface before the loop starts.
    pub fn new(mode: Mode, git: Git, suffix: String, base_branch: String) -> Result<Self> {
        if let Mode::File(ref path) = mode {
            if !has_suffix(path, &suffix) {
                return Err(Error::UnsupportedFileType {
                    path: path.clone(),
                    suffix,
                });
            }
            if !path.is_file() {
                return Err(Error::InvalidArgument(format!(
                    "{} does not exist",
                    path.display()
                )));
            }
        }
        Ok(Self {
            mode,
            git,
            suffix,
            base_branch,
        })
    }

    fn directory_files(&self, dir: &Path) -> Result<BTreeSet<PathBuf>> {
        let mut files = BTreeSet::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && has_suffix(&path, &self.suffix) {
                files.insert(absolute(&path));
            }
        }
        Ok(files)
    }

    fn branch_files(&self) -> Result<BTreeSet<PathBuf>> {
        let range = format!("{}..HEAD", self.base_branch);
        let changed = self.git.diff_names(None)?;
        let on_branch = self.git.diff_names(Some(&range))?;

        let files = changed
            .iter()
            .chain(on_branch.iter())
            .map(|name| self.git.root().join(name))
            .filter(|path| has_suffix(path, &self.suffix))
            // Deleted files still show up in the diff
            .filter(|path| path.is_file())
            .collect();
        Ok(files)
    }
}

impl WorkingSetSource for FileSetResolver {
    fn resolve(&self) -> Result<BTreeSet<PathBuf>> {
        let files = match &self.mode {
            Mode::File(path) => {
                let mut files = BTreeSet::new();
                if path.is_file() {
                    files.insert(path.clone());
                }
                files
            }
            Mode::Directory(dir) => self.directory_files(dir)?,
            Mode::Branch => self.branch_files()?,
        };
        debug!(count = files.len(), "resolved working set");
        Ok(files)
    }
}

pub fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.to_str().is_some_and(|p| p.ends_with(suffix))
}

fn absolute(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_suffix() {
        assert!(has_suffix(Path::new("/repo/a.py"), ".py"));
        assert!(!has_suffix(Path::new("/repo/a.pyc"), ".py"));
        assert!(!has_suffix(Path::new("/repo/README.md"), ".py"));
    }

    #[test]
    fn test_mode_branch_flag_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let mode = Mode::from_args(Some(Path::new("a.py")), true, tmp.path()).unwrap();
        assert_eq!(mode, Mode::Branch);
    }

    #[test]
    fn test_mode_no_target_is_branch() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(Mode::from_args(None, false, tmp.path()).unwrap(), Mode::Branch);
    }

    #[test]
    fn test_mode_directory() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("pkg")).unwrap();
        let mode = Mode::from_args(Some(Path::new("pkg")), false, tmp.path()).unwrap();
        let expected = tmp.path().join("pkg").canonicalize().unwrap();
        assert_eq!(mode, Mode::Directory(expected));
    }

    #[test]
    fn test_mode_file_relative_to_cwd() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.py"), "x = 1\n").unwrap();
        let mode = Mode::from_args(Some(Path::new("a.py")), false, tmp.path()).unwrap();
        let expected = tmp.path().join("a.py").canonicalize().unwrap();
        assert_eq!(mode, Mode::File(expected));
    }

    #[test]
    fn test_mode_empty_target_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Mode::from_args(Some(Path::new("")), false, tmp.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
