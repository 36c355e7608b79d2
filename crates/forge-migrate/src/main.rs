//! forge-migrate - rename an identifier across an asset-forge store.
//!
//! Run with the serving application stopped: the store has no locks and no
//! cross-file transactions. If a run fails part way, fix the cause and run the
//! same command again; already-migrated documents are skipped.

use anyhow::{Context, Result};
use clap::Parser;
use forge_core::{
    render_text, resolve_store_root, ForgeError, IdentifierKind, MigrationOptions,
    MigrationReport, Migrator, RenameRequest, StoreConfig,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "forge-migrate", version)]
#[command(about = "Rename an identifier everywhere it is referenced in an asset-forge store")]
struct Args {
    /// Identifier kind (tag, tagGroup, assetType, style, scenario, palette, checkpoint, lora)
    #[arg(long)]
    kind: IdentifierKind,

    /// Current identifier
    #[arg(long, allow_hyphen_values = true)]
    from: String,

    /// New identifier
    #[arg(long, allow_hyphen_values = true)]
    to: String,

    /// Only migrate this project (shared LoRA records are always included)
    #[arg(long)]
    project: Option<String>,

    /// Store root (defaults to $FORGE_DATA_ROOT, then dataRoot in the local config, then ./data)
    #[arg(long, alias = "data-root")]
    store_root: Option<PathBuf>,

    /// Local config file
    #[arg(long, default_value = StoreConfig::DEFAULT_LOCAL_CONFIG)]
    config: PathBuf,

    /// Report what would change without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Print a JSON report instead of text
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            let code = err
                .downcast_ref::<ForgeError>()
                .map(ForgeError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code as u8)
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let env_root = std::env::var(StoreConfig::DATA_ROOT_ENV).ok();
    let store_root = resolve_store_root(args.store_root.as_deref(), env_root.as_deref(), &args.config)
        .context("Failed to resolve store root")?;
    debug!("Store root: {}", store_root.display());

    let mut request = RenameRequest::new(args.kind, args.from.as_str(), args.to.as_str());
    if let Some(project) = &args.project {
        request = request.in_project(project.as_str());
    }

    let migrator = Migrator::new(&store_root);
    let outcome = migrator.run(
        &request,
        MigrationOptions {
            dry_run: args.dry_run,
        },
    )?;

    if args.json {
        let report = MigrationReport::from_outcome(&outcome, migrator.layout());
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in render_text(&outcome, migrator.layout()) {
            println!("{line}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_full_command() {
        let args = Args::try_parse_from([
            "forge-migrate",
            "--kind",
            "tagGroup",
            "--from",
            "ui",
            "--to",
            "widgets",
            "--project",
            "p1",
            "--data-root",
            "/srv/data",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(args.kind, IdentifierKind::TagGroup);
        assert_eq!(args.project.as_deref(), Some("p1"));
        assert_eq!(args.store_root, Some(PathBuf::from("/srv/data")));
        assert!(args.dry_run);
        assert!(!args.json);
    }

    #[test]
    fn test_rejects_unknown_kind() {
        let err = Args::try_parse_from([
            "forge-migrate", "--kind", "dataset", "--from", "a", "--to", "b",
        ])
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_requires_from_and_to() {
        assert!(Args::try_parse_from(["forge-migrate", "--kind", "tag", "--from", "a"]).is_err());
    }
}
