mod common;

use lintblame::blame::{BlameProvider, GitBlame};
use lintblame::error::Error;
use lintblame::git::Git;

use common::{commit_file, init_temp_repo, numbered_lines, root, run_git};

#[test]
fn test_blame_committed_file() {
    let repo = init_temp_repo("Alice Smith");
    let file = commit_file(repo.path(), "mod.py", &numbered_lines(3));

    let blame = GitBlame::new(Git::discover(repo.path()).unwrap())
        .blame(&file)
        .unwrap();
    assert_eq!(blame.len(), 3);
    for line in 1..=3 {
        assert_eq!(blame.author(line).unwrap(), Some("Alice Smith"));
    }
    assert!(blame.author(4).is_err());
}

#[test]
fn test_blame_mixed_authors() {
    let repo = init_temp_repo("Alice");
    let file = commit_file(repo.path(), "mod.py", "a = 1\nb = 2\n");

    run_git(repo.path(), &["config", "user.name", "Bob"]);
    std::fs::write(&file, "a = 1\nb = 3\nc = 4\n").unwrap();
    run_git(repo.path(), &["commit", "-am", "bob edits"]);

    let blame = GitBlame::new(Git::discover(repo.path()).unwrap())
        .blame(&file)
        .unwrap();
    assert_eq!(blame.author(1).unwrap(), Some("Alice"));
    assert_eq!(blame.author(2).unwrap(), Some("Bob"));
    assert_eq!(blame.author(3).unwrap(), Some("Bob"));
}

#[test]
fn test_blame_sees_uncommitted_lines() {
    let repo = init_temp_repo("Alice");
    let file = commit_file(repo.path(), "mod.py", "a = 1\n");
    std::fs::write(&file, "a = 1\nb = 2\n").unwrap();

    let blame = GitBlame::new(Git::discover(repo.path()).unwrap())
        .blame(&file)
        .unwrap();
    assert_eq!(blame.len(), 2);
    assert_eq!(blame.author(2).unwrap(), Some("Not Committed Yet"));
}

#[test]
fn test_blame_untracked_file_unavailable() {
    let repo = init_temp_repo("Alice");
    let file = root(&repo).join("scratch.py");
    std::fs::write(&file, "x = 1\n").unwrap();

    let err = GitBlame::new(Git::discover(repo.path()).unwrap())
        .blame(&file)
        .unwrap_err();
    assert!(matches!(err, Error::BlameUnavailable { .. }));
    assert!(err.is_file_scoped());
}
