//! One entry point per subcommand.
//!
//! Each takes the resolved [`Config`] explicitly and performs a single
//! operation against a freshly opened [`HistoryStore`].

use crate::config::Config;
use crate::model::command::is_command_valid;
use crate::storage::sqlite::{HistoryFilter, HistoryStore};
use crate::view::{self, FilterMode, ViewMode};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("can't open history file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Counts from one `load` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub imported: usize,
    pub skipped: usize,
    pub duplicates_removed: usize,
}

pub fn init(config: &Config) -> Result<()> {
    let store = HistoryStore::create(&config.db_path)?;
    info!(
        path = %config.db_path.display(),
        rows = store.count()?,
        "history database ready"
    );
    Ok(())
}

/// Record one executed command. Blank and comment commands are ignored.
pub fn add(config: &Config, command: &str, directory: &str, return_code: i32) -> Result<()> {
    if !is_command_valid(command) {
        debug!("skipping blank or comment command");
        return Ok(());
    }

    let time = HistoryStore::now_millis();
    let store = HistoryStore::open(&config.db_path)?;
    store.insert(command, directory, return_code, time)
}

/// Import a newline-delimited legacy history file as bare commands, then
/// collapse duplicates.
pub fn load(config: &Config, history_path: &Path) -> Result<LoadReport> {
    let file = File::open(history_path).map_err(|source| LoadError::Unreadable {
        path: history_path.to_path_buf(),
        source,
    })?;

    let store = HistoryStore::open(&config.db_path)?;
    let mut report = LoadReport::default();

    for line in BufReader::new(file).split(b'\n') {
        let line = line.with_context(|| format!("reading {}", history_path.display()))?;
        let command = String::from_utf8_lossy(&line);
        if is_command_valid(&command) {
            store.insert_bare(&command)?;
            report.imported += 1;
        } else {
            report.skipped += 1;
        }
    }

    report.duplicates_removed = store.delete_duplicates()?;
    info!(
        path = %history_path.display(),
        imported = report.imported,
        skipped = report.skipped,
        duplicates_removed = report.duplicates_removed,
        "loaded history file"
    );
    Ok(report)
}

/// Query the store and render the result to `out`.
///
/// `cwd` is only consulted for [`FilterMode::CurrentPath`].
pub fn list<W: Write>(
    config: &Config,
    filter: FilterMode,
    view: ViewMode,
    cwd: &Path,
    out: &mut W,
) -> Result<()> {
    let filter = match filter {
        FilterMode::All => HistoryFilter::All,
        FilterMode::Recent => HistoryFilter::Recent {
            limit: config.recent_num,
        },
        FilterMode::CurrentPath => HistoryFilter::Directory(cwd.to_string_lossy().into_owned()),
    };

    let commands = {
        let store = HistoryStore::open_readonly(&config.db_path)?;
        store.select(&filter)?
    };

    match view::render(out, &commands, view) {
        // The reader (`head`, fzf after a selection) went away; not a failure.
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!("output closed early");
            Ok(())
        }
        result => result.context("writing history listing"),
    }
}
