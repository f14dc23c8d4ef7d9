//! `notebin` command-line front end.
//!
//! # Responsibility
//! - Parse arguments and config, open the store once, dispatch one command.
//! - Render core results; the core owns every lifecycle rule.
//!
//! Exit codes: 0 success, 1 rejected input, 2 note not found.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{eyre, Result, WrapErr};
use notebin_core::config::{self, Config};
use notebin_core::{init_logging, NoteId, NoteService, SortBy, SqliteNoteStore};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "notebin", version, about = "Local notes with a 15-day trash bin")]
struct Cli {
    /// TOML config file.
    #[arg(long, short = 'c', value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    /// Database file; overrides `storage.path`.
    #[arg(long, value_name = "FILE", global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a note.
    Add {
        #[arg(long, short = 't')]
        title: String,
        #[arg(long, short = 'b', default_value = "")]
        content: String,
        /// Image file to embed.
        #[arg(long, value_name = "FILE")]
        image: Option<PathBuf>,
    },
    /// Change title, content or image of a note.
    Edit {
        id: NoteId,
        #[arg(long, short = 't')]
        title: Option<String>,
        #[arg(long, short = 'b')]
        content: Option<String>,
        #[arg(long, value_name = "FILE", conflicts_with = "clear_image")]
        image: Option<PathBuf>,
        #[arg(long)]
        clear_image: bool,
    },
    /// Move notes to the trash.
    Trash {
        #[arg(required = true)]
        ids: Vec<NoteId>,
    },
    /// Bring a trashed note back.
    Restore { id: NoteId },
    /// Permanently delete notes.
    Delete {
        #[arg(required = true)]
        ids: Vec<NoteId>,
    },
    /// Remove trashed notes older than the retention window.
    Purge {
        /// Retention window in days; defaults to `retention.days`.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        days: Option<u32>,
    },
    /// Show active notes, or the trash.
    List {
        #[arg(long)]
        trash: bool,
        #[arg(long, value_enum, default_value_t = SortArg::Created)]
        sort: SortArg,
        /// Print notes as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Export active notes.
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Text)]
        format: ExportFormat,
        #[arg(long, value_enum, default_value_t = SortArg::Created)]
        sort: SortArg,
        /// Output file; stdout when omitted.
        #[arg(long, short = 'o', value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Title,
    Created,
}

impl From<SortArg> for SortBy {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Title => SortBy::Title,
            SortArg::Created => SortBy::CreatedAt,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExportFormat {
    Text,
    Paged,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => config::load(path)?,
        None => Config::default(),
    };
    if let Some(dir) = config.logging.dir.as_deref() {
        init_logging(&config.logging.level, dir).map_err(|err| eyre!(err))?;
    }

    let db_path = cli.db.unwrap_or_else(|| config.storage.path.clone());
    let store = SqliteNoteStore::open(&db_path)
        .wrap_err_with(|| format!("failed to open note store `{}`", db_path.display()))?;
    let mut service = NoteService::new(store).with_retention(config.retention.policy());

    let code = commands::run(&mut service, cli.command, &mut std::io::stdout().lock())?;
    service.into_store().close()?;

    if code != commands::EXIT_OK {
        std::process::exit(code);
    }
    Ok(())
}
