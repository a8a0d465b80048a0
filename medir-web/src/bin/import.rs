//! medir-import - rebuild the Directory Snapshot from a roster file
//!
//! The roster is plain text with a `Doctors:` section and a
//! `Specialties:` section, one entry per line. Entries pair by position;
//! the longer column's excess is reported and dropped. The snapshot file
//! is replaced, discarding any insurances recorded in it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use medir_common::config::{
    load_toml_config, resolve_root_folder, resolve_snapshot_path, ROOT_FOLDER_ENV,
};
use medir_common::snapshot::{import_roster_file, SnapshotStore};

#[derive(Parser, Debug)]
#[command(name = "medir-import")]
#[command(about = "Replace the directory snapshot with a doctor/specialty roster")]
#[command(version)]
struct Args {
    /// Roster text file
    roster: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Folder holding the snapshot file
    #[arg(short, long, env = ROOT_FOLDER_ENV)]
    root_folder: Option<PathBuf>,

    /// Directory Snapshot JSON file
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let toml_config = load_toml_config(args.config.as_deref())?;
    let root_folder = resolve_root_folder(
        args.root_folder.as_deref(),
        ROOT_FOLDER_ENV,
        toml_config.root_folder.as_deref(),
    );
    let snapshot_path = resolve_snapshot_path(&root_folder, args.snapshot, toml_config.snapshot_path);

    let store = SnapshotStore::new(&snapshot_path);
    import_roster_file(&store, &args.roster)
        .await
        .with_context(|| format!("Failed to import {}", args.roster.display()))?;

    Ok(())
}
