//! Change detection over the working set.
//!
//! The watcher is level-triggered: any detected change marks it dirty and
//! the next run covers the whole working set, not just the changed file.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::error::Result;
use crate::fileset::WorkingSetSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// No run has completed yet.
    Initial,
    /// Last run reflects the current files.
    Stable,
    /// A change was seen since the last completed run.
    Dirty,
}

/// Tracked files and the modification time last observed for each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingSet {
    files: BTreeMap<PathBuf, Option<SystemTime>>,
}

impl WorkingSet {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    /// Immutable copy of the tracked paths, in sorted order.
    pub fn snapshot(&self) -> Vec<PathBuf> {
        self.files.keys().cloned().collect()
    }
}

/// What a single tick found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changes {
    pub added: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    /// First file found with a new modification time, if any.
    pub modified: Option<PathBuf>,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// Run over this snapshot of the working set.
    Run(Vec<PathBuf>),
    Idle,
}

pub struct Watcher<S> {
    source: S,
    known: WorkingSet,
    state: WatchState,
}

impl<S: WorkingSetSource> Watcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            known: WorkingSet::default(),
            state: WatchState::Initial,
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn known(&self) -> &WorkingSet {
        &self.known
    }

    /// Evaluate one tick: refresh the working set and decide whether to run.
    ///
    /// Additions and removals are checked first; timestamps are only scanned
    /// when the set itself is unchanged, and scanning stops at the first
    /// modified file.
    pub fn poll(&mut self) -> Result<Tick> {
        let current = self.source.resolve()?;
        let changes = self.detect(&current);

        if !changes.is_empty() {
            debug!(
                added = changes.added.len(),
                removed = changes.removed.len(),
                modified = ?changes.modified,
                "working set changed"
            );
            self.state = WatchState::Dirty;
        }

        match self.state {
            WatchState::Initial | WatchState::Dirty => Ok(Tick::Run(self.known.snapshot())),
            WatchState::Stable => Ok(Tick::Idle),
        }
    }

    /// Record that a run over the last snapshot finished.
    pub fn complete_run(&mut self) {
        self.state = WatchState::Stable;
    }

    fn detect(&mut self, current: &BTreeSet<PathBuf>) -> Changes {
        let mut changes = Changes::default();

        for path in current {
            if !self.known.contains(path) {
                changes.added.push(path.clone());
            }
        }
        let removed: Vec<PathBuf> = self
            .known
            .files
            .keys()
            .filter(|path| !current.contains(*path))
            .cloned()
            .collect();

        if !changes.added.is_empty() || !removed.is_empty() {
            for path in &changes.added {
                self.known.files.insert(path.clone(), mtime(path));
            }
            for path in &removed {
                self.known.files.remove(path);
            }
            changes.removed = removed;
            return changes;
        }

        for (path, seen) in self.known.files.iter_mut() {
            let now = mtime(path);
            if now != *seen {
                *seen = now;
                changes.modified = Some(path.clone());
                break;
            }
        }
        changes
    }
}

fn mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
