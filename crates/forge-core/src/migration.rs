//! Identifier rename runner.
//!
//! A run has two phases:
//! - **plan**: enumerate shards, read each one, run the dispatch transform and
//!   record changed documents and primary-key renames. Nothing is written, so a
//!   parse failure or rename collision aborts with the store untouched.
//! - **apply**: write every changed document back to its own path, then move
//!   primary-key documents to their new file names.
//!
//! There is no cross-file transaction. An interrupted apply leaves some shards
//! migrated; re-running the same request picks up the rest, since migrated
//! shards no longer match `from`.

use crate::dispatch::{self, Rename};
use crate::kind::IdentifierKind;
use crate::layout::{ShardCategory, ShardLocator, ShardScope, StoreLayout};
use crate::matching::NAMESPACE_SEPARATOR;
use crate::report::ChangeSet;
use crate::store::{DocumentStore, FsDocumentStore};
use crate::{ForgeError, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Characters that cannot appear in a file stem on any supported platform.
const RESERVED_STEM_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// "Rename identifier `from` of `kind` to `to`", optionally within one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRequest {
    pub kind: IdentifierKind,
    pub from: String,
    pub to: String,
    pub project: Option<String>,
}

impl RenameRequest {
    pub fn new(kind: IdentifierKind, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            kind,
            from: from.into(),
            to: to.into(),
            project: None,
        }
    }

    /// Restrict the run to a single project. Shared records are still scanned.
    pub fn in_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn is_no_op(&self) -> bool {
        self.from == self.to
    }

    /// Check the request before any file is touched.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("from", &self.from), ("to", &self.to)] {
            if value.trim().is_empty() {
                return Err(ForgeError::validation(field, "identifier must not be empty"));
            }
            if self.kind == IdentifierKind::TagGroup && value.contains(NAMESPACE_SEPARATOR) {
                return Err(ForgeError::validation(
                    field,
                    format!("tag group '{value}' must not contain '{NAMESPACE_SEPARATOR}'"),
                ));
            }
            if self.kind.is_primary_key() {
                validate_file_stem(field, value)?;
            }
        }
        if let Some(project) = &self.project {
            if project.trim().is_empty() {
                return Err(ForgeError::validation("project", "project id must not be empty"));
            }
            validate_file_stem("project", project)?;
        }
        Ok(())
    }
}

fn validate_file_stem(field: &str, value: &str) -> Result<()> {
    if value == "." || value == ".." {
        return Err(ForgeError::validation(field, format!("'{value}' is not a valid name")));
    }
    if let Some(c) = value
        .chars()
        .find(|c| RESERVED_STEM_CHARS.contains(c) || c.is_control())
    {
        return Err(ForgeError::validation(
            field,
            format!("'{value}' contains {c:?}, which cannot be used in a file name"),
        ));
    }
    Ok(())
}

/// Run-level switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationOptions {
    /// Compute and report the change-set without writing or renaming.
    pub dry_run: bool,
}

/// A document whose content changes.
#[derive(Debug, Clone)]
pub struct PlannedWrite {
    pub category: ShardCategory,
    pub scope: ShardScope,
    pub path: PathBuf,
    pub document: Value,
}

/// A primary-key document moving to its new file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRename {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Everything a run will do, computed without side effects.
#[derive(Debug, Clone, Default)]
pub struct MigrationPlan {
    pub writes: Vec<PlannedWrite>,
    pub renames: Vec<PlannedRename>,
}

impl MigrationPlan {
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty() && self.renames.is_empty()
    }

    /// Every path the plan touches; both ends of each rename are included.
    pub fn changes(&self) -> ChangeSet {
        let mut changes: ChangeSet = self.writes.iter().map(|w| w.path.clone()).collect();
        for rename in &self.renames {
            changes.insert(rename.from.clone());
            changes.insert(rename.to.clone());
        }
        changes
    }
}

/// Result of a run.
#[derive(Debug, Clone)]
pub struct MigrationOutcome {
    pub request: RenameRequest,
    pub dry_run: bool,
    /// `from == to`; nothing was examined.
    pub no_op: bool,
    pub changes: ChangeSet,
}

/// Rename engine over a store rooted at a directory.
pub struct Migrator<S: DocumentStore = FsDocumentStore> {
    layout: StoreLayout,
    store: S,
}

impl Migrator<FsDocumentStore> {
    /// Migrator over the local filesystem.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_store(root, FsDocumentStore::new())
    }
}

impl<S: DocumentStore> Migrator<S> {
    pub fn with_store(root: impl Into<PathBuf>, store: S) -> Self {
        Self {
            layout: StoreLayout::new(root),
            store,
        }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate, plan and (unless dry-run) apply a rename.
    pub fn run(
        &self,
        request: &RenameRequest,
        options: MigrationOptions,
    ) -> Result<MigrationOutcome> {
        if request.is_no_op() {
            info!("No-op: --from and --to are identical ({})", request.from);
            return Ok(MigrationOutcome {
                request: request.clone(),
                dry_run: options.dry_run,
                no_op: true,
                changes: ChangeSet::new(),
            });
        }
        request.validate()?;

        info!(
            "Renaming {} '{}' -> '{}' under {}{}",
            request.kind,
            request.from,
            request.to,
            self.layout.root().display(),
            if options.dry_run { " (dry-run)" } else { "" }
        );

        let plan = self.plan(request)?;
        let changes = plan.changes();

        if options.dry_run {
            info!("Dry run: {} file(s) would change", changes.len());
        } else {
            self.apply(&plan)?;
            info!("Changed {} file(s)", changes.len());
        }

        Ok(MigrationOutcome {
            request: request.clone(),
            dry_run: options.dry_run,
            no_op: false,
            changes,
        })
    }

    /// Read every candidate shard and compute the writes and renames.
    ///
    /// Shards are visited in a fixed order: projects by directory name, then
    /// the shared area; within a scope, categories in dispatch-table order;
    /// within a category, files by name.
    pub fn plan(&self, request: &RenameRequest) -> Result<MigrationPlan> {
        let kind = request.kind;
        let rules = dispatch::rules(kind);
        let rename = Rename::new(&request.from, &request.to);
        let locator = ShardLocator::new(&self.layout, &self.store);

        let mut scopes = locator.project_scopes(request.project.as_deref())?;
        if scopes.is_empty() {
            info!("No projects found under {}", self.layout.projects_dir().display());
        }
        if rules.iter().any(|rule| rule.category == ShardCategory::Lora) {
            scopes.push(ShardScope::Shared);
        }

        let mut plan = MigrationPlan::default();
        for scope in &scopes {
            for rule in rules {
                for shard in locator.locate(scope, rule.category)? {
                    let Some(mut document) = self.store.read(&shard.path)? else {
                        continue;
                    };
                    if !(rule.transform)(&mut document, &rename) {
                        continue;
                    }
                    debug!(
                        "{} {} ({}): {} -> {}",
                        shard.category,
                        self.layout.display_path(&shard.path),
                        rule.fields,
                        request.from,
                        request.to
                    );
                    plan.writes.push(PlannedWrite {
                        category: shard.category,
                        scope: shard.scope,
                        path: shard.path,
                        document,
                    });
                }

                if dispatch::primary_key_category(kind) == Some(rule.category) {
                    if let Some(planned) = self.plan_rename(scope, rule.category, &plan, request)? {
                        plan.renames.push(planned);
                    }
                }
            }
        }

        debug!(
            "Planned {} write(s) and {} rename(s)",
            plan.writes.len(),
            plan.renames.len()
        );
        Ok(plan)
    }

    fn plan_rename(
        &self,
        scope: &ShardScope,
        category: ShardCategory,
        plan: &MigrationPlan,
        request: &RenameRequest,
    ) -> Result<Option<PlannedRename>> {
        let (Some(from), Some(to)) = (
            self.layout.keyed_document_path(scope, category, &request.from),
            self.layout.keyed_document_path(scope, category, &request.to),
        ) else {
            return Ok(None);
        };

        if !self.store.exists(&from) {
            return Ok(None);
        }
        if self.store.exists(&to) {
            return Err(ForgeError::RenameCollision { from, to });
        }

        let own_id = self.own_id(&from, plan)?;
        if own_id.as_deref() != Some(request.to.as_str()) {
            warn!(
                "{} is keyed '{}' but its id does not match; moving it anyway",
                self.layout.display_path(&from),
                request.from
            );
        }

        Ok(Some(PlannedRename { from, to }))
    }

    /// `id` of the document at `path` as it will be after apply: the planned
    /// rewrite if there is one, else the stored document. A rerun after an
    /// interrupted apply has the id already rewritten and nothing planned.
    fn own_id(&self, path: &Path, plan: &MigrationPlan) -> Result<Option<String>> {
        let id_of = |document: &Value| document.get("id").and_then(Value::as_str).map(String::from);
        if let Some(write) = plan.writes.iter().find(|w| w.path == path) {
            return Ok(id_of(&write.document));
        }
        Ok(self.store.read(path)?.as_ref().and_then(id_of))
    }

    /// Write planned documents in order, then perform renames.
    ///
    /// Stops at the first failure; earlier writes stay on disk.
    pub fn apply(&self, plan: &MigrationPlan) -> Result<()> {
        for write in &plan.writes {
            self.store.write(&write.path, &write.document)?;
            debug!(
                "Wrote {} {} ({})",
                write.category,
                self.layout.display_path(&write.path),
                write.scope
            );
        }
        for rename in &plan.renames {
            self.store.rename(&rename.from, &rename.to)?;
            info!(
                "Moved {} -> {}",
                self.layout.display_path(&rename.from),
                self.layout.display_path(&rename.to)
            );
        }
        Ok(())
    }
}

/// Convenience wrapper: run `request` against the filesystem store at `root`.
pub fn rename_id(
    root: &Path,
    request: &RenameRequest,
    options: MigrationOptions,
) -> Result<MigrationOutcome> {
    Migrator::new(root).run(request, options)
}
