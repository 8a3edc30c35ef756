use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use walkdir::{DirEntry, WalkDir};

use crate::utils::validate_path_not_symlink;

/// Maximum number of chatsync files to process (security: prevent resource exhaustion)
pub const MAX_CHATSYNC_FILES: usize = 10_000;

const CHATSYNC_EXTENSION: &str = "dat";

/// Find all `*/*.dat` files under a Skype profile's chatsync directory
///
/// Only files exactly one directory level below `chatsync_dir` match, and neither the file nor
/// its directory may be hidden (a leading `.`). Symlinked files are skipped with a warning.
/// The result is sorted by path.
///
/// # Errors
///
/// Returns an error if:
/// - The directory exists but cannot be read
/// - More than [`MAX_CHATSYNC_FILES`] files are found
///
/// A missing directory yields an empty list.
pub fn discover_chatsync_files(chatsync_dir: &Path) -> Result<Vec<PathBuf>> {
    if !chatsync_dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    // Like a `*/*.dat` glob, hidden entries below the root never match
    let walker = WalkDir::new(chatsync_dir)
        .min_depth(2)
        .max_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // The root itself failing is fatal, anything below is skipped
            Err(e) if e.depth() == 0 => {
                return Err(e).with_context(|| {
                    format!("Failed to read chatsync directory: {}", chatsync_dir.display())
                });
            }
            Err(e) => {
                eprintln!("Warning: Skipping unreadable entry: {}", e);
                continue;
            }
        };

        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(CHATSYNC_EXTENSION) {
            continue;
        }

        if let Err(e) = validate_path_not_symlink(path) {
            eprintln!("Warning: Skipping chatsync file {}: {}", path.display(), e);
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }

        // Security: Enforce maximum file count
        if files.len() >= MAX_CHATSYNC_FILES {
            bail!(
                "Resource limit exceeded: Found more than {} chatsync files in {}",
                MAX_CHATSYNC_FILES,
                chatsync_dir.display()
            );
        }
        files.push(path.to_path_buf());
    }

    Ok(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
}
