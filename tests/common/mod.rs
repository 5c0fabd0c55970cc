#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

pub fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} in {} failed: {}",
        args,
        dir.display(),
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Create a temporary git repo on `master` with an initial commit by `author`.
pub fn init_temp_repo(author: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    let path = dir.path();

    run_git(path, &["init"]);
    run_git(path, &["config", "user.email", "test@test.com"]);
    run_git(path, &["config", "user.name", author]);
    run_git(path, &["config", "commit.gpgsign", "false"]);

    std::fs::write(path.join("README.md"), "# test\n").unwrap();
    run_git(path, &["add", "."]);
    run_git(path, &["commit", "-m", "init"]);
    run_git(path, &["branch", "-M", "master"]);

    dir
}

/// Canonical repo root, matching what `git rev-parse --show-toplevel` reports.
pub fn root(repo: &TempDir) -> PathBuf {
    repo.path().canonicalize().unwrap()
}

/// Write `contents` to `name` in the repo and commit it.
pub fn commit_file(repo: &Path, name: &str, contents: &str) -> PathBuf {
    let path = repo.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    run_git(repo, &["add", name]);
    run_git(repo, &["commit", "-m", &format!("add {name}")]);
    path.canonicalize().unwrap()
}

/// Source text with `n` numbered lines.
pub fn numbered_lines(n: usize) -> String {
    (1..=n).map(|i| format!("x{i} = {i}\n")).collect()
}

/// Write an executable shell script standing in for an analysis tool.
#[cfg(unix)]
pub fn write_tool(dir: &Path, name: &str, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path.to_string_lossy().to_string()
}
