//! Forge Core - document store layout and identifier-rename engine.
//!
//! An asset-forge store is a tree of standalone JSON documents (projects,
//! catalogs, specs, assets, checkpoints, LoRA records). Documents refer to
//! each other through plain string identifiers and nothing enforces those
//! references at write time. This crate renames an identifier everywhere it is
//! referenced, moving the owning document when the identifier is also its file
//! name.
//!
//! # Example
//!
//! ```rust,no_run
//! use forge_core::{IdentifierKind, MigrationOptions, Migrator, RenameRequest};
//!
//! fn main() -> forge_core::Result<()> {
//!     let migrator = Migrator::new("/srv/forge/data");
//!     let request = RenameRequest::new(IdentifierKind::TagGroup, "ui", "widgets");
//!
//!     let preview = migrator.run(&request, MigrationOptions { dry_run: true })?;
//!     for path in preview.changes.iter() {
//!         println!("would change {}", path.display());
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod kind;
pub mod layout;
pub mod matching;
pub mod migration;
pub mod report;
pub mod store;

pub use config::{resolve_store_root, LocalConfig, PathsConfig, StoreConfig};
pub use error::{ForgeError, Result};
pub use kind::IdentifierKind;
pub use layout::{Shard, ShardCategory, ShardLocator, ShardScope, StoreLayout};
pub use migration::{
    rename_id, MigrationOptions, MigrationOutcome, MigrationPlan, Migrator, RenameRequest,
};
pub use report::{render_text, ChangeSet, MigrationReport};
pub use store::{DocumentStore, FsDocumentStore};
