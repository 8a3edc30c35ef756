use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

/// Environment variable naming the default chatsync directory
pub const CHATSYNC_DIR_VAR: &str = "SKYPE_CHATSYNC_DIR";

/// Resolve the chatsync directory: an explicit path wins, then `$SKYPE_CHATSYNC_DIR`
pub fn get_chatsync_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    match env::var_os(CHATSYNC_DIR_VAR) {
        Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => bail!(
            "No chatsync directory given. Pass one as an argument or set {}",
            CHATSYNC_DIR_VAR
        ),
    }
}
