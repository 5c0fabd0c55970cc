use crate::issue::{Issue, ProviderKind};

/// Create an `Issue` with sensible defaults for tests.
pub fn make_issue(source: ProviderKind, line: u32, code: &str) -> Issue {
    Issue {
        source,
        line,
        column: "1".to_string(),
        code: code.to_string(),
        message: format!("{code} message"),
    }
}
