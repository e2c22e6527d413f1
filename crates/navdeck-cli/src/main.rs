//! navdeck CLI - backup and restore for a navdeck data directory
//!
//! Provides `navdeck backup`, `navdeck restore` and `navdeck inspect`.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use navdeck_core::backup::{
    backup_filename, inspect, BackupEngine, BackupSelection, CategoryFallback, ComponentKind,
    RestoreOptions, RestoreReport,
};
use navdeck_core::storage::{Database, FsBlobStore};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DB_FILE: &str = "navdeck.db";
const BLOB_DIR: &str = "blobs";

#[derive(Parser)]
#[command(name = "navdeck")]
#[command(about = "navdeck - selective backup and restore for your navigation page")]
#[command(version)]
struct Cli {
    /// Data directory holding navdeck.db and uploaded icons
    #[arg(long, global = true, env = "NAVDECK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a backup archive
    Backup {
        /// Output file or directory (defaults to the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Components to include (repeatable; defaults to all)
        #[arg(long = "only", value_enum, value_name = "COMPONENT")]
        only: Vec<ComponentArg>,
    },
    /// Restore components from a backup archive
    Restore {
        /// Archive to restore from
        archive: PathBuf,

        /// Components to restore (repeatable; defaults to all)
        #[arg(long = "only", value_enum, value_name = "COMPONENT")]
        only: Vec<ComponentArg>,

        /// How to check site categories when categories are not restored
        #[arg(long, value_enum, default_value = "store")]
        category_fallback: FallbackArg,
    },
    /// List the components and attachments in a backup archive
    Inspect {
        /// Archive to inspect
        archive: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ComponentArg {
    SiteSettings,
    Metadata,
    Favicon,
    SiteData,
    CategoryData,
    SiteIconFiles,
}

impl From<ComponentArg> for ComponentKind {
    fn from(arg: ComponentArg) -> Self {
        match arg {
            ComponentArg::SiteSettings => ComponentKind::SiteSettings,
            ComponentArg::Metadata => ComponentKind::Metadata,
            ComponentArg::Favicon => ComponentKind::Favicon,
            ComponentArg::SiteData => ComponentKind::SiteData,
            ComponentArg::CategoryData => ComponentKind::CategoryData,
            ComponentArg::SiteIconFiles => ComponentKind::SiteIconFiles,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FallbackArg {
    /// Keep categories that already exist in the store
    Store,
    /// Move every restored site to the default category
    Default,
}

impl From<FallbackArg> for CategoryFallback {
    fn from(arg: FallbackArg) -> Self {
        match arg {
            FallbackArg::Store => CategoryFallback::StoreCategories,
            FallbackArg::Default => CategoryFallback::DefaultOnly,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Backup { output, only } => run_backup(cli.data_dir, output, &only),
        Commands::Restore {
            archive,
            only,
            category_fallback,
        } => run_restore(cli.data_dir, &archive, &only, category_fallback),
        Commands::Inspect { archive } => run_inspect(&archive),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_env("NAVDECK_LOG").unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn resolve_data_dir(data_dir: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match data_dir {
        Some(dir) => Ok(dir),
        None => {
            let home = dirs::home_dir().context("Could not determine home directory")?;
            Ok(home.join(".navdeck"))
        }
    }
}

/// Open the database and blob store under `data_dir`, creating it if needed
fn open_store(data_dir: &Path) -> anyhow::Result<(Database, FsBlobStore)> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;
    tracing::debug!(path = %data_dir.display(), "Opening data directory");
    let db = Database::open(&data_dir.join(DB_FILE))
        .with_context(|| format!("Failed to open database in {}", data_dir.display()))?;
    let blobs = FsBlobStore::new(data_dir.join(BLOB_DIR));
    Ok((db, blobs))
}

fn selection_from(only: &[ComponentArg]) -> BackupSelection {
    if only.is_empty() {
        BackupSelection::all()
    } else {
        BackupSelection::only(only.iter().copied().map(ComponentKind::from))
    }
}

fn join_labels(kinds: &[ComponentKind]) -> String {
    kinds
        .iter()
        .map(|kind| kind.label())
        .collect::<Vec<_>>()
        .join(", ")
}

fn run_backup(
    data_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    only: &[ComponentArg],
) -> anyhow::Result<()> {
    let data_dir = resolve_data_dir(data_dir)?;
    let (db, blobs) = open_store(&data_dir)?;
    let selection = selection_from(only);

    let output_path = match output {
        Some(path) if path.is_dir() => path.join(backup_filename(chrono::Utc::now())),
        Some(path) => path,
        None => std::env::current_dir()
            .context("Failed to get current directory")?
            .join(backup_filename(chrono::Utc::now())),
    };

    let bytes = BackupEngine::new(&db, &blobs)
        .create_backup(&selection)
        .context("Backup failed")?;
    fs::write(&output_path, &bytes)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    let kinds: Vec<_> = selection.kinds().collect();
    println!("Backed up: {}", join_labels(&kinds));
    println!(
        "Backup written to {} ({} bytes)",
        output_path.display(),
        bytes.len()
    );
    Ok(())
}

fn run_restore(
    data_dir: Option<PathBuf>,
    archive: &Path,
    only: &[ComponentArg],
    category_fallback: FallbackArg,
) -> anyhow::Result<()> {
    if !archive.is_file() {
        bail!("Archive not found: {}", archive.display());
    }
    let bytes =
        fs::read(archive).with_context(|| format!("Failed to read {}", archive.display()))?;

    let data_dir = resolve_data_dir(data_dir)?;
    let (db, blobs) = open_store(&data_dir)?;
    let options = RestoreOptions {
        category_fallback: category_fallback.into(),
    };

    let report = BackupEngine::new(&db, &blobs)
        .restore(&bytes, &selection_from(only), &options)
        .context("Restore failed")?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &RestoreReport) {
    if report.is_noop() {
        println!("Nothing to restore: the archive has none of the selected components.");
    } else {
        println!("Restored: {}", join_labels(&report.applied));
    }

    if !report.absent.is_empty() {
        println!("Not in archive: {}", join_labels(&report.absent));
    }

    if report.reassigned_sites > 0 {
        println!(
            "Moved {} site(s) to the default category",
            report.reassigned_sites
        );
    }

    if !report.missing_attachments.is_empty() {
        println!(
            "Skipped {} missing attachment(s):",
            report.missing_attachments.len()
        );
        for path in &report.missing_attachments {
            println!("  {path}");
        }
    }

    if report.invalidates_site_views() {
        println!("Site listings changed; reload the navigation page.");
    }
}

fn run_inspect(archive: &Path) -> anyhow::Result<()> {
    let bytes =
        fs::read(archive).with_context(|| format!("Failed to read {}", archive.display()))?;
    let summary = inspect(&bytes).context("Not a navdeck backup archive")?;

    if summary.manifests.is_empty() {
        println!("No components found.");
    } else {
        println!("Components:");
        for kind in &summary.manifests {
            println!("  {:<16} {}", kind.label(), kind.manifest_name());
        }
    }

    if !summary.attachments.is_empty() {
        println!("Attachments:");
        for (path, size) in &summary.attachments {
            println!("  {path} ({size} bytes)");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_only_selects_everything() {
        assert_eq!(selection_from(&[]), BackupSelection::all());
    }

    #[test]
    fn test_only_maps_to_kinds() {
        let selection = selection_from(&[ComponentArg::SiteData, ComponentArg::CategoryData]);
        assert_eq!(
            selection.kinds().collect::<Vec<_>>(),
            vec![ComponentKind::CategoryData, ComponentKind::SiteData]
        );
    }

    #[test]
    fn test_cli_parses_restore_flags() {
        let cli = Cli::try_parse_from([
            "navdeck",
            "restore",
            "backup.zip",
            "--only",
            "site-data",
            "--category-fallback",
            "default",
        ])
        .unwrap();

        match cli.command {
            Commands::Restore {
                only,
                category_fallback,
                ..
            } => {
                assert_eq!(only, vec![ComponentArg::SiteData]);
                assert_eq!(category_fallback, FallbackArg::Default);
            }
            _ => panic!("expected restore"),
        }
    }
}
