use std::path::PathBuf;
use std::sync::{LazyLock, OnceLock};

use regex::Regex;
use tracing::{debug, warn};

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)name = (.+)$").expect("valid name regex"));

/// The operator's display name, read from a git-style config file at most once.
///
/// Absence (no file, unreadable file, or no `name = ...` line) is memoized
/// like any other result; highlighting is then simply disabled.
#[derive(Debug, Default)]
pub struct OperatorIdentity {
    source: Option<PathBuf>,
    resolved: OnceLock<Option<String>>,
}

impl OperatorIdentity {
    pub fn new(source: Option<PathBuf>) -> Self {
        Self {
            source,
            resolved: OnceLock::new(),
        }
    }

    /// An identity that is already known, bypassing any file.
    pub fn fixed(name: Option<&str>) -> Self {
        let resolved = OnceLock::new();
        let _ = resolved.set(name.map(str::to_string));
        Self {
            source: None,
            resolved,
        }
    }

    pub fn current_operator(&self) -> Option<&str> {
        self.resolved.get_or_init(|| self.resolve()).as_deref()
    }

    fn resolve(&self) -> Option<String> {
        let path = self.source.as_ref()?;
        if !path.is_file() {
            debug!(path = %path.display(), "identity file missing");
            return None;
        }
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read identity file");
                return None;
            }
        };
        let name = parse_name(&contents);
        debug!(path = %path.display(), name = ?name, "resolved operator identity");
        name
    }
}

fn parse_name(contents: &str) -> Option<String> {
    NAME_RE
        .captures(contents)
        .map(|caps| caps[1].trim().to_string())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gitconfig() {
        let contents = "[user]\n\tname = Alice Smith\n\temail = alice@example.com\n";
        assert_eq!(parse_name(contents).as_deref(), Some("Alice Smith"));
    }

    #[test]
    fn test_parse_without_name() {
        assert_eq!(parse_name("[core]\n\teditor = vim\n"), None);
    }

    #[test]
    fn test_missing_file_is_none() {
        let identity = OperatorIdentity::new(Some(PathBuf::from("/nonexistent/.gitconfig")));
        assert_eq!(identity.current_operator(), None);
    }

    #[test]
    fn test_no_source_is_none() {
        assert_eq!(OperatorIdentity::new(None).current_operator(), None);
    }

    #[test]
    fn test_resolved_once() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(".gitconfig");
        std::fs::write(&path, "[user]\n\tname = Alice\n").unwrap();

        let identity = OperatorIdentity::new(Some(path.clone()));
        assert_eq!(identity.current_operator(), Some("Alice"));

        std::fs::write(&path, "[user]\n\tname = Bob\n").unwrap();
        assert_eq!(identity.current_operator(), Some("Alice"));
    }

    #[test]
    fn test_absence_memoized() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(".gitconfig");

        let identity = OperatorIdentity::new(Some(path.clone()));
        assert_eq!(identity.current_operator(), None);

        std::fs::write(&path, "[user]\n\tname = Alice\n").unwrap();
        assert_eq!(identity.current_operator(), None);
    }

    #[test]
    fn test_fixed() {
        assert_eq!(
            OperatorIdentity::fixed(Some("Alice")).current_operator(),
            Some("Alice")
        );
        assert_eq!(OperatorIdentity::fixed(None).current_operator(), None);
    }
}
