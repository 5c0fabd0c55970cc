use std::collections::BTreeMap;

use crate::issue::Issue;

/// Issues for one file grouped by line number.
///
/// Lines iterate in ascending numeric order. Within a line, issues are kept
/// in provider priority order, then in the order each provider reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueMap {
    lines: BTreeMap<u32, Vec<Issue>>,
}

impl IssueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from per-provider batches, in any order.
    pub fn from_batches<I>(batches: I) -> Self
    where
        I: IntoIterator<Item = Vec<Issue>>,
    {
        let mut map = Self::new();
        for batch in batches {
            map.extend(batch);
        }
        map
    }

    pub fn add(&mut self, issue: Issue) {
        let entry = self.lines.entry(issue.line).or_default();
        // Stable insert after every issue whose provider ranks at or above this one
        let pos = entry.partition_point(|existing| existing.source <= issue.source);
        entry.insert(pos, issue);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines with at least one issue.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn issue_count(&self) -> usize {
        self.lines.values().map(Vec::len).sum()
    }

    /// Highest line number carrying an issue.
    pub fn max_line(&self) -> Option<u32> {
        self.lines.keys().next_back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &[Issue])> {
        self.lines.iter().map(|(line, issues)| (*line, issues.as_slice()))
    }
}

impl Extend<Issue> for IssueMap {
    fn extend<T: IntoIterator<Item = Issue>>(&mut self, iter: T) {
        for issue in iter {
            self.add(issue);
        }
    }
}
