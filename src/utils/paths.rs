use std::fs::{self, File};
use std::path::Path;

use anyhow::{Context, Result, bail};

// Maximum chatsync file size: 64MB. Real files are a few hundred KB at most.
pub const MAX_FILE_SIZE_BYTES: u64 = 64 * 1024 * 1024;

/// Rejects symlinks so a profile directory cannot point the reader at arbitrary files
///
/// # Errors
///
/// Returns an error if the path cannot be inspected or is a symlink.
pub fn validate_path_not_symlink(path: &Path) -> Result<()> {
    let metadata = fs::symlink_metadata(path)
        .with_context(|| format!("Failed to read metadata: {}", path.display()))?;
    if metadata.file_type().is_symlink() {
        bail!("Symlinks are not allowed: {}", path.display());
    }
    Ok(())
}

/// Validates that a file's size is within acceptable limits (64MB)
///
/// Takes the open file handle so the size checked is the size of the file actually read.
///
/// # Errors
///
/// Returns an error if the metadata cannot be read or the file is larger than the limit.
pub fn validate_file_size(file: &File, path: &Path) -> Result<()> {
    let metadata = file
        .metadata()
        .with_context(|| format!("Failed to read file metadata: {}", path.display()))?;

    let file_size = metadata.len();
    if file_size > MAX_FILE_SIZE_BYTES {
        bail!(
            "File too large: {} ({} bytes, max {} bytes)",
            path.display(),
            file_size,
            MAX_FILE_SIZE_BYTES
        );
    }

    Ok(())
}

/// Open a file for reading after checking it is a regular, reasonably sized file
pub fn safe_open_file(path: &Path) -> Result<File> {
    validate_path_not_symlink(path)?;
    let file = File::open(path)
        .with_context(|| format!("Failed to open chatsync file: {}", path.display()))?;
    if !file.metadata().map(|m| m.is_file()).unwrap_or(false) {
        bail!("Not a regular file: {}", path.display());
    }
    validate_file_size(&file, path)?;
    Ok(file)
}
