//! Load chat logs from chatsync files and profile directories.
//!
//! # Error Handling Strategy
//!
//! - **File-level errors**: [`parse_chatsync_file`] propagates any fatal scan or parse error with
//!   the file path attached. Nothing is returned for a file that cannot be read completely.
//! - **Directory-level isolation**: [`load_profile_dir`] parses every discovered file on its own.
//!   A file that fails is recorded as a [`FileFailure`] and logged; the others are unaffected.
//! - **Warnings**: scan warnings are printed to stderr tagged with the file name, and stay
//!   available on [`ChatLog::warnings`].

use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::models::ChatLog;
use crate::parsers::{ChatSyncScanner, ScanLimits, parse_conversation};
use crate::profile::discovery::discover_chatsync_files;
use crate::utils::safe_open_file;

/// A file from a profile directory that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of loading a whole chatsync directory
#[derive(Debug, Clone, Default)]
pub struct ProfileLoad {
    /// Successfully parsed logs, in path order
    pub logs: Vec<ChatLog>,
    pub failures: Vec<FileFailure>,
}

impl ProfileLoad {
    pub fn files_seen(&self) -> usize {
        self.logs.len() + self.failures.len()
    }
}

/// Parse a single chatsync file
///
/// # Errors
///
/// Returns an error if the file cannot be opened, is larger than the size limit, or is not a
/// chatsync file the scanner and parser can make sense of.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use chatsync_reader::parse_chatsync_file;
///
/// let log = parse_chatsync_file(Path::new("chatsync/0a/0a1b2c.dat"))?;
/// for message in &log.conversation {
///     println!("{}: {}", message.author, message.text);
/// }
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn parse_chatsync_file(path: &Path) -> Result<ChatLog> {
    parse_chatsync_file_with_limits(path, ScanLimits::default())
}

pub fn parse_chatsync_file_with_limits(path: &Path, limits: ScanLimits) -> Result<ChatLog> {
    let file = safe_open_file(path)?;
    let source = path.display().to_string();

    let scan = ChatSyncScanner::new(BufReader::new(file), source)
        .with_limits(limits)
        .scan()
        .with_context(|| format!("Error scanning {}", path.display()))?;

    for warning in scan.diagnostics.warnings() {
        eprintln!("Warning: {}", warning);
    }

    parse_conversation(&scan).with_context(|| format!("Error parsing {}", path.display()))
}

/// Parse every `*/*.dat` file in a chatsync directory, keeping track of failures
///
/// Files are parsed in parallel; results keep discovery order.
///
/// # Errors
///
/// Returns an error only if the directory itself cannot be walked. Individual files that fail
/// to parse end up in [`ProfileLoad::failures`].
pub fn load_profile_dir(chatsync_dir: &Path) -> Result<ProfileLoad> {
    let files = discover_chatsync_files(chatsync_dir)?;

    let results: Vec<(PathBuf, Result<ChatLog>)> = files
        .into_par_iter()
        .map(|path| {
            let result = parse_chatsync_file(&path);
            (path, result)
        })
        .collect();

    let mut load = ProfileLoad::default();
    for (path, result) in results {
        match result {
            Ok(log) => load.logs.push(log),
            Err(e) => {
                eprintln!("Warning: Failed to parse file {}: {:#}", path.display(), e);
                load.failures.push(FileFailure { path, error: format!("{:#}", e) });
            }
        }
    }

    eprintln!("Parsed {} chatsync files ({} failed)", load.logs.len(), load.failures.len());

    Ok(load)
}

/// Parse every chatsync file in a directory, returning only the ones that parsed
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use chatsync_reader::parse_chatsync_profile_dir;
///
/// let logs = parse_chatsync_profile_dir(Path::new("/home/alice/.Skype/alice/chatsync"))?;
/// println!("{} conversations", logs.len());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn parse_chatsync_profile_dir(chatsync_dir: &Path) -> Result<Vec<ChatLog>> {
    Ok(load_profile_dir(chatsync_dir)?.logs)
}
