//! Change-set aggregation and operator-facing reports.

use crate::layout::StoreLayout;
use crate::migration::MigrationOutcome;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Deduplicated, path-sorted set of files a run touched (or would touch).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    paths: BTreeSet<PathBuf>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>) -> bool {
        self.paths.insert(path.into())
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Paths in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    pub fn into_vec(self) -> Vec<PathBuf> {
        self.paths.into_iter().collect()
    }
}

impl<P: Into<PathBuf>> Extend<P> for ChangeSet {
    fn extend<I: IntoIterator<Item = P>>(&mut self, iter: I) {
        self.paths.extend(iter.into_iter().map(Into::into));
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut set = ChangeSet::new();
        set.extend(iter);
        set
    }
}

/// Machine-readable summary of a run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub kind: String,
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub store_root: String,
    pub dry_run: bool,
    pub no_op: bool,
    pub count: usize,
    /// Store-relative paths with `/` separators, sorted.
    pub changed: Vec<String>,
}

impl MigrationReport {
    pub fn from_outcome(outcome: &MigrationOutcome, layout: &StoreLayout) -> Self {
        Self {
            kind: outcome.request.kind.to_string(),
            from: outcome.request.from.clone(),
            to: outcome.request.to.clone(),
            project: outcome.request.project.clone(),
            store_root: layout.root().to_string_lossy().to_string(),
            dry_run: outcome.dry_run,
            no_op: outcome.no_op,
            count: outcome.changes.len(),
            changed: outcome
                .changes
                .iter()
                .map(|p| layout.display_path(p))
                .collect(),
        }
    }
}

/// Render the text report, one line per entry.
///
/// The last line always summarizes the count and the run mode.
pub fn render_text(outcome: &MigrationOutcome, layout: &StoreLayout) -> Vec<String> {
    let count = outcome.changes.len();
    let mode = if outcome.no_op {
        "no-op"
    } else if outcome.dry_run {
        "dry run"
    } else {
        "applied"
    };

    let mut lines = Vec::with_capacity(count + 2);
    if outcome.no_op {
        lines.push("No-op: --from and --to are identical.".to_string());
    } else if count == 0 {
        lines.push("No changes needed.".to_string());
    } else {
        let verb = if outcome.dry_run { "Would change" } else { "Changed" };
        lines.push(format!("{verb} {count} file(s):"));
        lines.extend(
            outcome
                .changes
                .iter()
                .map(|p| format!("- {}", layout.display_path(p))),
        );
    }
    lines.push(format!("{count} file(s) affected ({mode})"));
    lines
}
